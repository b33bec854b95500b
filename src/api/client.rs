use std::fmt;
use std::path::{Path, PathBuf};

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Serialize;
use serde_json::{Value, json};

use super::session::AuthSession;
use crate::model::config::BackendConfig;
use crate::model::doc_tree::DocTree;
use crate::ops::validate::{ProjectPayload, UserPayload};

/// Characters `encodeURIComponent` leaves alone, besides ASCII alphanumerics
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Page size used when listing projects and users
pub const LIST_LIMIT: u32 = 1000;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("missing {0}")]
    MissingContext(&'static str),
    #[error("failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        };
        f.write_str(s)
    }
}

/// One field of a multipart form
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FormPart {
    Text { name: String, value: String },
    File {
        name: String,
        path: PathBuf,
        filename: String,
        mime: String,
    },
}

/// A fully described backend request, ready for a transport to send.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub query: Vec<(String, String)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub multipart: Vec<FormPart>,
    pub timeout_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization: Option<String>,
}

impl ApiRequest {
    fn with_query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// Encode a storage path as a single URL path segment
pub fn encode_component(raw: &str) -> String {
    utf8_percent_encode(raw, COMPONENT).to_string()
}

/// Guess a MIME type from a file extension
pub fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => "application/pdf",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "heic" => "image/heic",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}

/// Builds requests against `<backend>/v1`, authorized by the session.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    authorization: Option<String>,
    timeout_secs: u64,
    upload_timeout_secs: u64,
    docs_timeout_secs: u64,
}

impl ApiClient {
    pub fn new(config: &BackendConfig) -> Self {
        ApiClient {
            base_url: format!("{}/v1", config.url.trim_end_matches('/')),
            authorization: None,
            timeout_secs: config.timeout_secs,
            upload_timeout_secs: config.upload_timeout_secs,
            docs_timeout_secs: config.docs_timeout_secs,
        }
    }

    pub fn with_session(mut self, session: &AuthSession) -> Self {
        self.authorization = session.bearer();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> ApiRequest {
        ApiRequest {
            method,
            url: format!("{}{}", self.base_url, path),
            query: Vec::new(),
            body: None,
            multipart: Vec::new(),
            timeout_secs: self.timeout_secs,
            authorization: self.authorization.clone(),
        }
    }

    // -----------------------------------------------------------------------
    // Projects
    // -----------------------------------------------------------------------

    pub fn list_projects(&self) -> ApiRequest {
        self.request(Method::Get, "/projects/list")
            .with_query("limit", LIST_LIMIT)
    }

    pub fn create_project(&self, payload: &ProjectPayload) -> Result<ApiRequest, ApiError> {
        Ok(self
            .request(Method::Post, "/projects/create")
            .with_body(serde_json::to_value(payload)?))
    }

    pub fn update_project(
        &self,
        uuid: Option<&str>,
        payload: &ProjectPayload,
    ) -> Result<ApiRequest, ApiError> {
        let uuid = require(uuid, "project uuid")?;
        Ok(self
            .request(Method::Put, &format!("/projects/{}", uuid))
            .with_body(serde_json::to_value(payload)?))
    }

    /// Replace a project's whole document tree
    pub fn save_project_docs(
        &self,
        uuid: Option<&str>,
        docs: &DocTree,
    ) -> Result<ApiRequest, ApiError> {
        let uuid = require(uuid, "project uuid")?;
        Ok(self
            .request(Method::Put, &format!("/projects/{}", uuid))
            .with_body(json!({ "docs": docs }))
            .with_timeout(self.docs_timeout_secs))
    }

    // -----------------------------------------------------------------------
    // Files
    // -----------------------------------------------------------------------

    /// Multipart upload of `local` into the storage folder `storage_path`.
    pub fn upload_file(&self, local: &Path, storage_path: &str) -> ApiRequest {
        let filename = local
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string());
        let mut req = self
            .request(Method::Post, "/project/upload-form")
            .with_timeout(self.upload_timeout_secs);
        req.multipart = vec![
            FormPart::File {
                name: "file".to_string(),
                path: local.to_path_buf(),
                filename,
                mime: mime_for(local).to_string(),
            },
            FormPart::Text {
                name: "path".to_string(),
                value: storage_path.to_string(),
            },
        ];
        req
    }

    /// Request a presigned download URL for a stored file
    pub fn download_url(&self, value: &str) -> Result<ApiRequest, ApiError> {
        let value = require(Some(value), "file path")?;
        Ok(self.request(
            Method::Get,
            &format!("/project/download/{}", encode_component(value)),
        ))
    }

    pub fn delete_file(&self, value: &str) -> Result<ApiRequest, ApiError> {
        let value = require(Some(value), "file path")?;
        Ok(self.request(
            Method::Delete,
            &format!("/project/delete/{}", encode_component(value)),
        ))
    }

    // -----------------------------------------------------------------------
    // Users
    // -----------------------------------------------------------------------

    pub fn list_users(&self) -> ApiRequest {
        self.request(Method::Get, "/users").with_query("limit", LIST_LIMIT)
    }

    pub fn create_user(&self, payload: &UserPayload) -> Result<ApiRequest, ApiError> {
        Ok(self
            .request(Method::Post, "/user/create")
            .with_body(serde_json::to_value(payload)?))
    }

    pub fn update_user(
        &self,
        id: Option<&str>,
        payload: &UserPayload,
    ) -> Result<ApiRequest, ApiError> {
        let id = require(id, "user id")?;
        Ok(self
            .request(Method::Patch, &format!("/user/{}", id))
            .with_body(serde_json::to_value(payload)?))
    }

    pub fn set_user_active(&self, id: Option<&str>, active: bool) -> Result<ApiRequest, ApiError> {
        let id = require(id, "user id")?;
        Ok(self
            .request(Method::Patch, &format!("/user/{}", id))
            .with_body(json!({ "isActive": active })))
    }
}

fn require<'a>(value: Option<&'a str>, what: &'static str) -> Result<&'a str, ApiError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ApiError::MissingContext(what)),
    }
}

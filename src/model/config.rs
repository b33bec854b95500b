use serde::{Deserialize, Serialize};

/// Configuration from fieldbook.toml. Every section is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub uploads: UploadConfig,
    #[serde(default)]
    pub docs: DocsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL without the API version; `/v1` is appended.
    /// Overridden by the `BACKEND_URL` environment variable.
    #[serde(default = "default_backend_url")]
    pub url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_upload_timeout_secs")]
    pub upload_timeout_secs: u64,
    #[serde(default = "default_docs_timeout_secs")]
    pub docs_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig {
            url: default_backend_url(),
            timeout_secs: default_timeout_secs(),
            upload_timeout_secs: default_upload_timeout_secs(),
            docs_timeout_secs: default_docs_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Files larger than this many bytes are skipped
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// Storage prefix for files attached to activity table cells
    #[serde(default = "default_activity_path")]
    pub activity_path: String,
}

impl Default for UploadConfig {
    fn default() -> Self {
        UploadConfig {
            max_file_size: default_max_file_size(),
            activity_path: default_activity_path(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocsConfig {
    /// Storage prefix for a project's documents. `{project}` is replaced
    /// with the project uuid.
    #[serde(default = "default_docs_base_path")]
    pub base_path: String,
}

impl Default for DocsConfig {
    fn default() -> Self {
        DocsConfig {
            base_path: default_docs_base_path(),
        }
    }
}

impl DocsConfig {
    pub fn base_path_for(&self, project_uuid: Option<&str>) -> String {
        self.base_path
            .replace("{project}", project_uuid.unwrap_or("unknown"))
    }
}

fn default_backend_url() -> String {
    "http://localhost:3000/api".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_upload_timeout_secs() -> u64 {
    60
}

fn default_docs_timeout_secs() -> u64 {
    20
}

fn default_max_file_size() -> u64 {
    10 * 1024 * 1024
}

fn default_activity_path() -> String {
    "activities".to_string()
}

fn default_docs_base_path() -> String {
    "projects/{project}/docs".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.backend.timeout_secs, 30);
        assert_eq!(config.uploads.max_file_size, 10_485_760);
    }

    #[test]
    fn test_partial_section() {
        let config: Config = toml::from_str("[backend]\nurl = \"https://api.example.com/api\"\n").unwrap();
        assert_eq!(config.backend.url, "https://api.example.com/api");
        assert_eq!(config.backend.upload_timeout_secs, 60);
    }

    #[test]
    fn test_docs_base_path() {
        let docs = DocsConfig::default();
        assert_eq!(docs.base_path_for(Some("p-9")), "projects/p-9/docs");
        assert_eq!(docs.base_path_for(None), "projects/unknown/docs");
    }
}

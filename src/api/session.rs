use serde::{Deserialize, Serialize};

use crate::model::user::{Role, User};

/// The signed-in user and their bearer token.
///
/// Created empty, filled by [`AuthSession::login`] and cleared by
/// [`AuthSession::logout`]. Persisted between CLI runs by `io::session_io`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user: Option<User>,
    #[serde(rename = "expiresIn", default, skip_serializing_if = "Option::is_none")]
    expires_in: Option<String>,
}

impl AuthSession {
    pub fn new() -> Self {
        AuthSession::default()
    }

    pub fn login(&mut self, token: impl Into<String>, user: User, expires_in: Option<String>) {
        self.token = Some(token.into());
        self.user = Some(user);
        self.expires_in = expires_in;
        tracing::info!(role = ?self.role(), "session started");
    }

    pub fn logout(&mut self) {
        self.token = None;
        self.user = None;
        self.expires_in = None;
    }

    /// Signed in with a non-empty token and a user
    pub fn is_authenticated(&self) -> bool {
        self.token().is_some() && self.user.is_some()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.is_empty())
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn name(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.name.as_str())
    }

    pub fn role(&self) -> Option<Role> {
        self.user.as_ref().map(|u| u.role)
    }

    pub fn is_admin(&self) -> bool {
        self.role() == Some(Role::Admin)
    }

    pub fn expires_in(&self) -> Option<&str> {
        self.expires_in.as_deref()
    }

    /// `Authorization` header value
    pub fn bearer(&self) -> Option<String> {
        self.token().map(|t| format!("Bearer {}", t))
    }
}

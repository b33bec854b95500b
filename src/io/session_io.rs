use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::api::session::AuthSession;
use crate::io::doc_io::{DocError, read_json, write_json};

const STATE_DIR: &str = ".fieldbook";
const SESSION_FILE: &str = "session.json";

pub fn session_path(dir: &Path) -> PathBuf {
    dir.join(STATE_DIR).join(SESSION_FILE)
}

/// The stored session, or an empty one when nobody is signed in.
pub fn load_session(dir: &Path) -> Result<AuthSession, DocError> {
    let path = session_path(dir);
    if !path.exists() {
        return Ok(AuthSession::new());
    }
    read_json(&path)
}

pub fn save_session(dir: &Path, session: &AuthSession) -> Result<(), DocError> {
    let path = session_path(dir);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| DocError::WriteError {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    write_json(&path, session)
}

/// Forget the stored session. Nothing stored is not an error.
pub fn clear_session(dir: &Path) -> Result<(), DocError> {
    let path = session_path(dir);
    match fs::remove_file(&path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(DocError::WriteError { path, source: e }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::user::User;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_session_persistence() {
        let tmp = TempDir::new().unwrap();
        assert!(!load_session(tmp.path()).unwrap().is_authenticated());

        let user: User = serde_json::from_value(json!({ "name": "Asha", "role": "admin" })).unwrap();
        let mut session = AuthSession::new();
        session.login("tok", user, Some("7d".into()));
        save_session(tmp.path(), &session).unwrap();

        let loaded = load_session(tmp.path()).unwrap();
        assert_eq!(loaded, session);
        assert!(loaded.is_admin());

        clear_session(tmp.path()).unwrap();
        clear_session(tmp.path()).unwrap();
        assert_eq!(load_session(tmp.path()).unwrap(), AuthSession::new());
    }
}

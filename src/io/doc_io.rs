use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tempfile::NamedTempFile;

/// Error type for JSON document I/O
#[derive(Debug, thiserror::Error)]
pub enum DocError {
    #[error("could not read {path}: {source}")]
    ReadError { path: PathBuf, source: io::Error },
    #[error("could not parse {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("could not write {path}: {source}")]
    WriteError { path: PathBuf, source: io::Error },
    #[error("could not serialize document: {0}")]
    SerializeError(#[from] serde_json::Error),
}

/// Write `content` to `path` atomically using a temp file + rename.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Read and parse a JSON document.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, DocError> {
    let text = fs::read_to_string(path).map_err(|e| DocError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&text).map_err(|e| DocError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Replace a JSON document on disk with `doc`, pretty-printed.
pub fn write_json<T: Serialize>(path: &Path, doc: &T) -> Result<(), DocError> {
    let mut text = serde_json::to_string_pretty(doc)?;
    text.push('\n');
    atomic_write(path, text.as_bytes()).map_err(|e| DocError::WriteError {
        path: path.to_path_buf(),
        source: e,
    })?;
    tracing::debug!(path = %path.display(), bytes = text.len(), "document written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::activity::Activity;
    use serde_json::{Value, json};
    use tempfile::TempDir;

    #[test]
    fn test_atomic_write() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("doc.json");
        atomic_write(&path, b"{}").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "{}");
        atomic_write(&path, b"[]").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "[]");
    }

    #[test]
    fn test_round_trip_keeps_unknown_keys() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("activity.json");
        let raw = json!({
            "uuid": "a-1",
            "name": "Slab",
            "approvedBy": { "name": "Ravi" },
            "checkLists": [
                { "name": "Shuttering", "type": "checkbox", "value": false, "order": 3 }
            ]
        });
        fs::write(&path, raw.to_string()).unwrap();

        let activity: Activity = read_json(&path).unwrap();
        write_json(&path, &activity).unwrap();
        let back: Value = read_json(&path).unwrap();
        assert_eq!(back, raw);
    }

    #[test]
    fn test_read_errors_name_the_file() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("missing.json");
        let err = read_json::<Value>(&missing).unwrap_err();
        assert!(matches!(err, DocError::ReadError { .. }));
        assert!(err.to_string().contains("missing.json"));

        let bad = tmp.path().join("bad.json");
        fs::write(&bad, "{ nope").unwrap();
        assert!(matches!(
            read_json::<Value>(&bad),
            Err(DocError::ParseError { .. })
        ));
    }
}

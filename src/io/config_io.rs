use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::io::doc_io::atomic_write;
use crate::model::config::Config;

pub const CONFIG_FILE: &str = "fieldbook.toml";

/// Environment variable that overrides `backend.url`
pub const BACKEND_URL_ENV: &str = "BACKEND_URL";

/// Keys `fb config set` accepts, and whether each holds an integer
const KNOWN_KEYS: &[(&str, bool)] = &[
    ("backend.url", false),
    ("backend.timeout_secs", true),
    ("backend.upload_timeout_secs", true),
    ("backend.docs_timeout_secs", true),
    ("uploads.max_file_size", true),
    ("uploads.activity_path", false),
    ("docs.base_path", false),
];

/// Error type for configuration I/O
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    ReadError { path: PathBuf, source: io::Error },
    #[error("could not write {path}: {source}")]
    WriteError { path: PathBuf, source: io::Error },
    #[error("could not parse fieldbook.toml: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("could not parse fieldbook.toml: {0}")]
    EditParseError(#[from] toml_edit::TomlError),
    #[error("could not serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),
    #[error("unknown config key: {0}")]
    UnknownKey(String),
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

pub fn config_path(dir: &Path) -> PathBuf {
    dir.join(CONFIG_FILE)
}

/// Read the config, returning both the parsed config and the raw
/// toml_edit document for round-trip-safe editing. A missing file reads
/// as the defaults and an empty document.
pub fn read_config(dir: &Path) -> Result<(Config, toml_edit::DocumentMut), ConfigError> {
    let path = config_path(dir);
    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(ConfigError::ReadError { path, source: e }),
    };
    let config: Config = toml::from_str(&text)?;
    let doc: toml_edit::DocumentMut = text.parse()?;
    Ok((config, doc))
}

/// The effective config: the file plus environment overrides.
pub fn load_config(dir: &Path) -> Result<Config, ConfigError> {
    let (mut config, _) = read_config(dir)?;
    if let Ok(url) = std::env::var(BACKEND_URL_ENV)
        && !url.trim().is_empty()
    {
        tracing::debug!(url = %url, "backend url from environment");
        config.backend.url = url;
    }
    Ok(config)
}

/// Write the config document back to disk, preserving formatting.
pub fn write_config(dir: &Path, doc: &toml_edit::DocumentMut) -> Result<(), ConfigError> {
    let path = config_path(dir);
    atomic_write(&path, doc.to_string().as_bytes())
        .map_err(|e| ConfigError::WriteError { path, source: e })
}

/// Look up a dotted key (`backend.url`) in the effective config.
pub fn get_value(config: &Config, key: &str) -> Result<String, ConfigError> {
    let root = toml::Value::try_from(config)?;
    let mut current = &root;
    for part in key.split('.') {
        current = current
            .get(part)
            .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
    }
    Ok(match current {
        toml::Value::String(s) => s.clone(),
        other => other.to_string(),
    })
}

/// Set a dotted key in the config document.
pub fn set_value(doc: &mut toml_edit::DocumentMut, key: &str, raw: &str) -> Result<(), ConfigError> {
    let (_, is_int) = KNOWN_KEYS
        .iter()
        .find(|(k, _)| *k == key)
        .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
    let Some((section, field)) = key.split_once('.') else {
        return Err(ConfigError::UnknownKey(key.to_string()));
    };

    let value = if *is_int {
        let n: i64 = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw.to_string(),
        })?;
        if n < 0 {
            return Err(ConfigError::InvalidValue {
                key: key.to_string(),
                value: raw.to_string(),
            });
        }
        toml_edit::value(n)
    } else {
        toml_edit::value(raw)
    };

    if !doc.contains_key(section) {
        doc[section] = toml_edit::Item::Table(toml_edit::Table::new());
    }
    doc[section][field] = value;
    Ok(())
}

//! Configuration loading from and persisting to disk.

use serde_json::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::config::error::ConfigError;
use crate::config::validation::lint;

/// Read a JSON file without linting it.
pub fn read_json(path: &Path) -> Result<Value, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| match source.kind() {
        ErrorKind::NotFound => ConfigError::NotFound {
            path: path.to_path_buf(),
        },
        _ => ConfigError::Io {
            path: path.to_path_buf(),
            source,
        },
    })?;

    serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a JSON file and lint it against `defaults`.
///
/// Pure read: the caller decides what to do with the result.
pub fn load(path: &Path, defaults: &Value) -> Result<Value, ConfigError> {
    let raw = read_json(path)?;
    Ok(lint(defaults, &raw))
}

/// Replace an existing JSON file with `data`, pretty-printed.
///
/// Returns `Ok(false)` without touching the disk when the file does not
/// already exist.
pub fn write_json(path: &Path, data: &Value) -> Result<bool, ConfigError> {
    if !path.is_file() {
        return Ok(false);
    }

    let body = serde_json::to_string_pretty(data)?;
    fs::write(path, body).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::debug!(path = %path.display(), "Config file written");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = load(&dir.path().join("nope.json"), &json!({})).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_load_malformed_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(load(&path, &json!({})), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_load_lints() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "admin": ["1"] }"#).unwrap();
        let doc = load(&path, &json!({ "admin": [], "master": ["console"] })).unwrap();
        assert_eq!(doc, json!({ "admin": ["1"], "master": ["console"] }));
    }

    #[test]
    fn test_write_is_exact_and_pretty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("redis.json");
        fs::write(&path, "{}").unwrap();

        let data = json!({ "url": "redis://h:1", "database": 2 });
        assert!(write_json(&path, &data).unwrap());

        let raw = fs::read_to_string(&path).unwrap();
        assert_eq!(raw, serde_json::to_string_pretty(&data).unwrap());
        assert!(raw.contains("\n  \"url\""));
        assert_eq!(read_json(&path).unwrap(), data);
    }

    #[test]
    fn test_write_never_creates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.json");
        assert!(!write_json(&path, &json!({})).unwrap());
        assert!(!path.exists());
    }
}

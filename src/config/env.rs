//! Environment-backed settings and the `.env` file.
//!
//! # Responsibilities
//! - Typed reads of process environment variables with literal fallbacks
//! - Generate a per-process auth secret when none is configured
//! - Parse and rewrite the `.env` file in place

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde_json::{Map, Value};
use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use crate::config::error::ConfigError;

pub const DEFAULT_PORT: u16 = 7777;
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Placeholder that means "no key configured".
pub const AUTH_KEY_PLACEHOLDER: &str = "default";

pub const HTTP_PORT: &str = "HTTP_PORT";
pub const HTTP_HOST: &str = "HTTP_HOST";
pub const HTTP_AUTH_KEY: &str = "HTTP_AUTH_KEY";
pub const WS_SERVER_AUTH_KEY: &str = "WS_SERVER_AUTH_KEY";
pub const LOG_LEVEL: &str = "LOG_LEVEL";

const AUTH_KEY_LEN: usize = 32;

static ENV_WRITE: Mutex<()> = Mutex::new(());

/// Set a process environment variable.
///
/// Every write this crate makes goes through here, one at a time. Readers are
/// not locked: updating the environment after the runtime has started stays
/// an accepted risk, limited to `.env` saves and the one-off auth key.
fn set_process_var(key: &str, value: &str) {
    let _guard = ENV_WRITE.lock().unwrap_or_else(PoisonError::into_inner);
    env::set_var(key, value);
}

/// HTTP port from `HTTP_PORT`.
pub fn port() -> u16 {
    parse_port(env::var(HTTP_PORT).ok().as_deref())
}

/// Bind host from `HTTP_HOST`.
pub fn host() -> String {
    parse_host(env::var(HTTP_HOST).ok().as_deref())
}

/// Log level from `LOG_LEVEL`.
pub fn log_level() -> String {
    non_empty(env::var(LOG_LEVEL).ok()).unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string())
}

pub fn ffmpeg_path() -> Option<String> {
    non_empty(env::var("FFMPEG_PATH").ok())
}

pub fn ffprobe_path() -> Option<String> {
    non_empty(env::var("FFPROBE_PATH").ok())
}

pub fn ffplay_path() -> Option<String> {
    non_empty(env::var("FFPLAY_PATH").ok())
}

/// Bearer token renderers must present, if any.
pub fn ws_server_auth_key() -> Option<String> {
    non_empty(env::var(WS_SERVER_AUTH_KEY).ok())
}

/// Secret guarding the admin API.
///
/// When `HTTP_AUTH_KEY` is unset or still the placeholder, a random key is
/// generated and stored in the process environment only, so it lasts until
/// the process exits.
pub fn auth_key() -> String {
    // Held across check and set so concurrent callers agree on one key.
    let _guard = ENV_WRITE.lock().unwrap_or_else(PoisonError::into_inner);
    match env::var(HTTP_AUTH_KEY) {
        Ok(key) if !key.is_empty() && key != AUTH_KEY_PLACEHOLDER => key,
        _ => {
            let key = random_key(AUTH_KEY_LEN);
            env::set_var(HTTP_AUTH_KEY, &key);
            tracing::warn!(key = %key, "HTTP auth key is unset, using a generated key for this run");
            key
        }
    }
}

fn random_key(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

pub(crate) fn parse_port(raw: Option<&str>) -> u16 {
    raw.and_then(|v| v.trim().parse::<u16>().ok())
        .filter(|p| *p != 0)
        .unwrap_or(DEFAULT_PORT)
}

pub(crate) fn parse_host(raw: Option<&str>) -> String {
    raw.map(str::trim)
        .filter(|h| !h.is_empty())
        .unwrap_or(DEFAULT_HOST)
        .to_string()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Parse a `.env` file into a JSON object of strings.
pub fn read_env_file(path: &Path) -> Result<Value, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| match source.kind() {
        ErrorKind::NotFound => ConfigError::NotFound {
            path: path.to_path_buf(),
        },
        _ => ConfigError::Io {
            path: path.to_path_buf(),
            source,
        },
    })?;

    let mut map = Map::new();
    for line in content.lines() {
        if let Some((key, value)) = parse_line(line) {
            map.insert(key.to_string(), Value::String(value.to_string()));
        }
    }
    Ok(Value::Object(map))
}

fn parse_line(line: &str) -> Option<(&str, &str)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let line = line.strip_prefix("export ").unwrap_or(line);
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key, unquote(value.trim())))
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Export the `.env` file into the process environment.
///
/// Variables already set in the environment win. Returns how many were
/// exported.
pub fn export_env_file(path: &Path) -> Result<usize, ConfigError> {
    let Value::Object(vars) = read_env_file(path)? else {
        return Ok(0);
    };

    let mut exported = 0;
    for (key, value) in vars {
        if env::var_os(&key).is_none() {
            set_process_var(&key, &env_value(&value));
            exported += 1;
        }
    }
    Ok(exported)
}

/// Render a JSON value as a `.env` value.
fn env_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Update `.env` with the keys in `data`.
///
/// Existing keys are rewritten in place, new keys are appended, comments and
/// ordering survive. Written values are also exported to the process
/// environment. Returns `Ok(false)` if the file does not exist.
pub fn write_env_file(path: &Path, data: &Map<String, Value>) -> Result<bool, ConfigError> {
    if !path.is_file() {
        return Ok(false);
    }

    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut pending: Vec<(&String, String)> = data.iter().map(|(k, v)| (k, env_value(v))).collect();
    let mut lines: Vec<String> = Vec::new();

    for line in content.lines() {
        let replacement = parse_line(line).and_then(|(key, _)| {
            let idx = pending.iter().position(|(k, _)| k.as_str() == key)?;
            let (k, v) = pending.remove(idx);
            Some(format!("{}={}", k, v))
        });
        lines.push(replacement.unwrap_or_else(|| line.to_string()));
    }
    for (k, v) in pending {
        lines.push(format!("{}={}", k, v));
    }

    let mut body = lines.join("\n");
    body.push('\n');
    fs::write(path, body).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })?;

    for (key, value) in data {
        set_process_var(key, &env_value(value));
    }

    tracing::debug!(path = %path.display(), keys = data.len(), "Env file updated");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_port_fallbacks() {
        assert_eq!(parse_port(None), 7777);
        assert_eq!(parse_port(Some("abc")), 7777);
        assert_eq!(parse_port(Some("")), 7777);
        assert_eq!(parse_port(Some("0")), 7777);
        assert_eq!(parse_port(Some("70000")), 7777);
        assert_eq!(parse_port(Some("8080")), 8080);
    }

    #[test]
    fn test_host_fallbacks() {
        assert_eq!(parse_host(None), "127.0.0.1");
        assert_eq!(parse_host(Some("  ")), "127.0.0.1");
        assert_eq!(parse_host(Some("0.0.0.0")), "0.0.0.0");
    }

    #[test]
    fn test_random_key_shape() {
        let key = random_key(AUTH_KEY_LEN);
        assert_eq!(key.len(), AUTH_KEY_LEN);
        assert!(key.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(key, random_key(AUTH_KEY_LEN));
    }

    #[test]
    fn test_parse_env_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".env");
        fs::write(
            &path,
            "# comment\nHTTP_PORT=7000\n\nNAME=\"quoted value\"\nexport MODE='dev'\nbroken line\n",
        )
        .unwrap();

        let env = read_env_file(&path).unwrap();
        assert_eq!(
            env,
            json!({ "HTTP_PORT": "7000", "NAME": "quoted value", "MODE": "dev" })
        );
    }

    #[test]
    fn test_write_env_file_in_place() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".env");
        fs::write(&path, "# ports\nCHATBOT_TEST_PORT=1\nOTHER=x\n").unwrap();

        let data = json!({ "CHATBOT_TEST_PORT": 2, "CHATBOT_TEST_NEW": "y" });
        assert!(write_env_file(&path, data.as_object().unwrap()).unwrap());

        let body = fs::read_to_string(&path).unwrap();
        assert_eq!(body, "# ports\nCHATBOT_TEST_PORT=2\nOTHER=x\nCHATBOT_TEST_NEW=y\n");
        assert_eq!(env::var("CHATBOT_TEST_NEW").unwrap(), "y");
    }

    #[test]
    fn test_export_keeps_existing_vars() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".env");
        env::set_var("CHATBOT_TEST_KEEP", "process");
        fs::write(&path, "CHATBOT_TEST_KEEP=file\nCHATBOT_TEST_FRESH=file\n").unwrap();

        assert_eq!(export_env_file(&path).unwrap(), 1);
        assert_eq!(env::var("CHATBOT_TEST_KEEP").unwrap(), "process");
        assert_eq!(env::var("CHATBOT_TEST_FRESH").unwrap(), "file");
    }

    #[test]
    fn test_write_env_file_missing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".env");
        assert!(!write_env_file(&path, &Map::new()).unwrap());
        assert!(!path.exists());
    }
}

//! Read-through file cache with expiry.
//!
//! Secondary config files (`redis.json`, `pm2.json`, `.env`, ...) are not
//! watched. Reads inside the TTL window are served from memory; reads past it
//! go back to disk synchronously.

use dashmap::DashMap;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::error::ConfigError;
use crate::config::loader::read_json;

/// Default window for secondary config files.
pub const DEFAULT_TTL: Duration = Duration::from_secs(30);

/// How long a cached entry stays fresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    After(Duration),
    Never,
}

/// Parser turning a file into a JSON value.
pub type Parser = fn(&Path) -> Result<Value, ConfigError>;

#[derive(Debug, Clone)]
struct Entry {
    value: Arc<Value>,
    loaded_at: Instant,
}

impl Entry {
    fn is_fresh(&self, expiry: Expiry) -> bool {
        match expiry {
            Expiry::Never => true,
            Expiry::After(ttl) => self.loaded_at.elapsed() < ttl,
        }
    }
}

/// Path-keyed read-through cache.
#[derive(Debug, Clone, Default)]
pub struct TtlCache {
    entries: Arc<DashMap<PathBuf, Entry>>,
}

impl TtlCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a JSON file through the cache.
    pub fn read(&self, path: &Path, expiry: Expiry, force: bool) -> Result<Arc<Value>, ConfigError> {
        self.read_with(path, expiry, force, read_json)
    }

    /// Read a file through the cache using a custom parser.
    pub fn read_with(
        &self,
        path: &Path,
        expiry: Expiry,
        force: bool,
        parser: Parser,
    ) -> Result<Arc<Value>, ConfigError> {
        if !force {
            if let Some(entry) = self.entries.get(path) {
                if entry.is_fresh(expiry) {
                    return Ok(entry.value.clone());
                }
            }
        }

        let value = Arc::new(parser(path)?);
        self.entries.insert(
            path.to_path_buf(),
            Entry {
                value: value.clone(),
                loaded_at: Instant::now(),
            },
        );
        tracing::trace!(path = %path.display(), "Cache entry refreshed");
        Ok(value)
    }

    /// Drop the entry for `path` so the next read hits the disk.
    pub fn invalidate(&self, path: &Path) {
        self.entries.remove(path);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_serves_cached_within_ttl() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("redis.json");
        fs::write(&path, r#"{"database":1}"#).unwrap();

        let cache = TtlCache::new();
        let ttl = Expiry::After(Duration::from_secs(60));
        assert_eq!(cache.read(&path, ttl, false).unwrap()["database"], 1);

        fs::write(&path, r#"{"database":2}"#).unwrap();
        assert_eq!(cache.read(&path, ttl, false).unwrap()["database"], 1);
        assert_eq!(cache.read(&path, ttl, true).unwrap()["database"], 2);
    }

    #[test]
    fn test_rereads_after_expiry() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pm2.json");
        fs::write(&path, r#"{"lines":1}"#).unwrap();

        let cache = TtlCache::new();
        let ttl = Expiry::After(Duration::from_millis(20));
        cache.read(&path, ttl, false).unwrap();

        fs::write(&path, r#"{"lines":2}"#).unwrap();
        std::thread::sleep(Duration::from_millis(40));
        assert_eq!(*cache.read(&path, ttl, false).unwrap(), json!({ "lines": 2 }));
    }

    #[test]
    fn test_invalidate() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("package.json");
        fs::write(&path, r#"{"version":"1.0.0"}"#).unwrap();

        let cache = TtlCache::new();
        cache.read(&path, Expiry::Never, false).unwrap();
        fs::write(&path, r#"{"version":"1.1.0"}"#).unwrap();
        assert_eq!(cache.read(&path, Expiry::Never, false).unwrap()["version"], "1.0.0");

        cache.invalidate(&path);
        assert!(cache.is_empty());
        assert_eq!(cache.read(&path, Expiry::Never, false).unwrap()["version"], "1.1.0");
    }

    #[test]
    fn test_errors_are_not_cached() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.json");
        let cache = TtlCache::new();
        assert!(cache.read(&path, Expiry::Never, false).unwrap_err().is_not_found());
        assert_eq!(cache.len(), 0);
    }
}

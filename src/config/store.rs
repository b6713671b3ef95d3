//! Validated, hot-swappable configuration cache.
//!
//! # Responsibilities
//! - Hold the single validated document for one config file
//! - Swap it atomically when the watcher revalidates
//! - Persist writes back to disk
//!
//! # Design Decisions
//! - Readers get an `Arc` snapshot; they never block and never see a torn document
//! - Only `open` and the watcher's consumer task replace the cache
//! - `set` writes the file but leaves the cache to the watcher

use arc_swap::ArcSwap;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::error::ConfigError;
use crate::config::loader::{load, write_json};
use crate::config::schema::Section;

/// Cached, linted view of one config file.
#[derive(Debug)]
pub struct ConfigStore {
    section: Section,
    path: PathBuf,
    defaults: Value,
    cache: ArcSwap<Value>,
}

impl ConfigStore {
    /// Load `path`, lint it against the section defaults and cache the result.
    ///
    /// Fails closed: a missing or malformed file is an error.
    pub fn open(section: Section, path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        Self::open_with_defaults(section, path, section.defaults())
    }

    /// Like [`ConfigStore::open`] with an explicit default schema.
    pub fn open_with_defaults(
        section: Section,
        path: impl Into<PathBuf>,
        defaults: Value,
    ) -> Result<Self, ConfigError> {
        let path = path.into();
        let doc = load(&path, &defaults)?;

        tracing::info!(section = %section, path = %path.display(), "Config section loaded");

        Ok(Self {
            section,
            path,
            defaults,
            cache: ArcSwap::from_pointee(doc),
        })
    }

    /// Current validated document.
    pub fn get(&self) -> Arc<Value> {
        self.cache.load_full()
    }

    /// Current document deserialized into a typed view.
    ///
    /// Lint keeps kinds and number ranges in line with the defaults, so the
    /// section's own typed view always fits; the type's default is only used
    /// for a view that does not match the section.
    pub fn typed<T: DeserializeOwned + Default>(&self) -> T {
        let doc = self.cache.load();
        serde_json::from_value(Value::clone(&doc)).unwrap_or_else(|e| {
            tracing::warn!(section = %self.section, error = %e, "Config does not match typed view");
            T::default()
        })
    }

    /// Overwrite the backing file. Returns `false` if it does not exist.
    pub fn set(&self, data: &Value) -> Result<bool, ConfigError> {
        write_json(&self.path, data)
    }

    /// Re-read and re-lint the backing file, swapping the cache on success.
    ///
    /// On failure the previous document stays in place.
    pub fn revalidate(&self) -> Result<(), ConfigError> {
        let doc = load(&self.path, &self.defaults)?;
        self.cache.store(Arc::new(doc));
        Ok(())
    }

    pub fn section(&self) -> Section {
        self.section
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn defaults(&self) -> &Value {
        &self.defaults
    }
}

//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config/<section>.json
//!     → loader.rs (read & parse)
//!     → validation.rs (lint against schema.rs defaults)
//!     → store.rs (ArcSwap cache, one per watched section)
//!     → settings.rs (accessor surface)
//!
//! On file change:
//!     watcher.rs detects change
//!     → debounce per file
//!     → store revalidates
//!     → atomic swap of Arc<Value>, or keep old and warn
//!
//! Secondary files (redis, pm2, groups, privates, .env, package.json):
//!     cache.rs read-through with expiry
//! ```
//!
//! # Design Decisions
//! - Startup loads fail closed; watch-path failures only log
//! - Writes replace whole files; watched caches update via the watcher
//! - Keys unknown to the schema survive linting

pub mod cache;
pub mod env;
pub mod error;
pub mod loader;
pub mod paths;
pub mod schema;
pub mod settings;
pub mod store;
pub mod validation;
pub mod watcher;

pub use cache::{Expiry, TtlCache};
pub use error::ConfigError;
pub use paths::ConfigPaths;
pub use schema::Section;
pub use settings::Settings;
pub use store::ConfigStore;
pub use watcher::{ConfigWatcher, WatcherError};

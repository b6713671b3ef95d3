//! Chat-bot configuration service library.

pub mod admin;
pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod render;

pub use admin::{setup_router, AppState};
pub use config::{ConfigStore, ConfigWatcher, Settings};
pub use lifecycle::Shutdown;

//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the global tracing subscriber
//! - Change the log level at runtime from `LOG_LEVEL`
//!
//! `RUST_LOG`, when set, wins over `LOG_LEVEL` both at startup and on reload.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

use crate::config::env;

/// Handle for swapping the active log filter.
#[derive(Clone)]
pub struct LogLevelHandle {
    handle: reload::Handle<EnvFilter, Registry>,
}

impl LogLevelHandle {
    /// A handle not attached to any subscriber. Updates are no-ops.
    pub fn detached() -> Self {
        let (_layer, handle) = reload::Layer::<EnvFilter, Registry>::new(filter_for(env::DEFAULT_LOG_LEVEL));
        Self { handle }
    }

    /// Apply `level`, or the environment's level when `None`. Returns the
    /// filter applied.
    pub fn update(&self, level: Option<&str>) -> String {
        let level = level
            .map(str::to_string)
            .unwrap_or_else(|| env_filter_directive(std::env::var(EnvFilter::DEFAULT_ENV).ok()));
        match self.handle.reload(filter_for(&level)) {
            Ok(()) => tracing::info!(level = %level, "Log level updated"),
            Err(e) => tracing::debug!(error = %e, "Log level not applied"),
        }
        level
    }
}

/// `RUST_LOG` if set and non-empty, else `LOG_LEVEL`.
fn env_filter_directive(rust_log: Option<String>) -> String {
    rust_log
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(env::log_level)
}

fn filter_for(level: &str) -> EnvFilter {
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new(env::DEFAULT_LOG_LEVEL))
}

/// Install the global subscriber. Call once, before anything logs.
pub fn init_logging(level: &str) -> LogLevelHandle {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| filter_for(level));
    let (filter, handle) = reload::Layer::new(filter);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();

    LogLevelHandle { handle }
}

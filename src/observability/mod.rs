//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events with structured fields
//!     → logging.rs (EnvFilter behind a reload layer, fmt output)
//!
//! HTTP requests additionally get:
//!     → request IDs and TraceLayer spans (see admin::router)
//! ```
//!
//! # Design Decisions
//! - `RUST_LOG` wins over `LOG_LEVEL` at startup
//! - Level can be swapped at runtime without restarting

pub mod logging;

pub use logging::{init_logging, LogLevelHandle};

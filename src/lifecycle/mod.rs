//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Export .env → Seed missing files → Open stores (fatal on error)
//!
//! Shutdown (shutdown.rs):
//!     Signal received → broadcast → server drains, watcher exits
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → trigger shutdown
//! ```

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::bootstrap;

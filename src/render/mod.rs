//! Remote renderer WebSocket endpoint.
//!
//! # Responsibilities
//! - Gate incoming renderer connections on `render.json` and `WS_SERVER_AUTH_KEY`
//! - Hold accepted sockets open until the renderer disconnects
//!
//! # Design Decisions
//! - The gate runs before the upgrade, so rejections are plain HTTP errors
//! - Render protocol frames are logged, not interpreted

pub mod server;

pub use server::{check_connection, connect, RenderReject};

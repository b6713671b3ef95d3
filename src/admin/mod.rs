//! Admin HTTP API and render endpoint.
//!
//! # Routes
//! ```text
//! GET  /api/v1/ping          liveness, no auth
//! POST /api/v1/config/get    {type}        → current section value
//! POST /api/v1/config/set    {type, data}  → merge and persist
//! GET  /puppeteer            renderer WebSocket (see render)
//! ```
//!
//! `/api/v1/config/*` requires `Authorization: Bearer <HTTP_AUTH_KEY>`.

pub mod auth;
pub mod handlers;
pub mod response;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::config::{env, Settings};
use crate::observability::LogLevelHandle;
use crate::render;

/// Largest accepted request body.
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub log_level: LogLevelHandle,
    /// Secret for the admin API.
    pub auth_key: String,
    /// Secret renderers must present, if any.
    pub ws_auth_key: Option<String>,
}

impl AppState {
    /// State with secrets taken from the environment.
    pub fn new(settings: Arc<Settings>, log_level: LogLevelHandle) -> Self {
        Self {
            settings,
            log_level,
            auth_key: env::auth_key(),
            ws_auth_key: env::ws_server_auth_key(),
        }
    }
}

pub fn setup_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/api/v1/config/get", post(get_config))
        .route("/api/v1/config/set", post(set_config))
        .route_layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware));

    Router::new()
        .merge(api)
        .route("/api/v1/ping", get(ping))
        .route("/puppeteer", get(render::connect))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES)),
        )
}

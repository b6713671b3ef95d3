use axum::{
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::{
        header::{AUTHORIZATION, HOST},
        HeaderMap, StatusCode,
    },
    response::{IntoResponse, Response},
};

use crate::admin::auth::bearer_token;
use crate::admin::AppState;
use crate::config::schema::RenderConfig;

/// Why a renderer connection was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderReject {
    /// `render.ws_server.enable` is off.
    Disabled,
    /// Token missing or wrong.
    Unauthorized,
}

impl IntoResponse for RenderReject {
    fn into_response(self) -> Response {
        match self {
            RenderReject::Disabled => (StatusCode::FORBIDDEN, "Reverse WebSocket is disabled").into_response(),
            RenderReject::Unauthorized => (StatusCode::UNAUTHORIZED, "Authorization failed").into_response(),
        }
    }
}

/// Decide whether a renderer may connect.
///
/// With a key configured, `authorization` must equal the key itself or
/// `Bearer <key>`.
pub fn check_connection(
    cfg: &RenderConfig,
    expected_key: Option<&str>,
    authorization: Option<&str>,
) -> Result<(), RenderReject> {
    if !cfg.ws_server.enable {
        return Err(RenderReject::Disabled);
    }

    let Some(key) = expected_key else {
        return Ok(());
    };

    let token = authorization.map(|raw| bearer_token(Some(raw)).unwrap_or(raw));
    match token {
        Some(token) if token == key => Ok(()),
        _ => Err(RenderReject::Unauthorized),
    }
}

/// `GET /puppeteer`
pub async fn connect(
    State(state): State<AppState>,
    headers: HeaderMap,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let host = headers
        .get(HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("unknown")
        .to_string();
    let authorization = headers.get(AUTHORIZATION).and_then(|h| h.to_str().ok());

    let cfg = state.settings.render();
    if let Err(reject) = check_connection(&cfg, state.ws_auth_key.as_deref(), authorization) {
        match reject {
            RenderReject::Disabled => tracing::warn!(host = %host, "Renderer refused: reverse WebSocket disabled"),
            RenderReject::Unauthorized => {
                tracing::error!(host = %host, authorization = ?authorization, "Renderer refused: authorization failed")
            }
        }
        return reject.into_response();
    }

    match upgrade {
        Ok(ws) => ws.on_upgrade(move |socket| session(socket, host)),
        Err(rejection) => rejection.into_response(),
    }
}

async fn session(mut socket: WebSocket, host: String) {
    tracing::info!(host = %host, "Renderer connected");

    while let Some(msg) = socket.recv().await {
        match msg {
            Ok(Message::Text(text)) => {
                tracing::debug!(host = %host, len = text.len(), "Renderer frame");
            }
            Ok(Message::Binary(data)) => {
                tracing::debug!(host = %host, len = data.len(), "Renderer binary frame");
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(host = %host, error = %e, "Renderer socket error");
                break;
            }
        }
    }

    tracing::info!(host = %host, "Renderer disconnected");
}

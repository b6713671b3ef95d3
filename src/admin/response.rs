//! Response envelope and error mapping for the admin API.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::config::ConfigError;

/// Uniform JSON body for every admin API reply.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    pub message: String,
}

/// 200 with `data`.
pub fn success<T: Serialize>(data: T) -> Response {
    let body = ApiResponse {
        success: true,
        code: StatusCode::OK.as_u16(),
        data: Some(data),
        message: "ok".to_string(),
    };
    (StatusCode::OK, Json(body)).into_response()
}

fn failure(status: StatusCode, message: String) -> Response {
    let body: ApiResponse<()> = ApiResponse {
        success: false,
        code: status.as_u16(),
        data: None,
        message,
    };
    (status, Json(body)).into_response()
}

/// Failures surfaced by admin handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request payload has the wrong shape.
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    UnknownType(String),

    #[error("{0}")]
    NotFound(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::UnknownType(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        if err.is_not_found() {
            ApiError::NotFound(err.to_string())
        } else {
            ApiError::Internal(err.to_string())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Admin request failed");
        }
        failure(status, self.to_string())
    }
}

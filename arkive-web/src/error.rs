//! Web-facing error type and its HTTP mapping

use arkive_core::ArkiveError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use tracing::error;

pub type WebResult<T> = Result<T, WebError>;

/// Error types for the web server
#[derive(Debug, thiserror::Error)]
pub enum WebError {
    #[error(transparent)]
    Access(#[from] ArkiveError),

    #[error("invalid request: {0}")]
    BadRequest(String),

    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            WebError::Access(err) => match err {
                ArkiveError::Unauthenticated => (
                    StatusCode::UNAUTHORIZED,
                    "unauthenticated",
                    "not authenticated".to_string(),
                ),
                ArkiveError::PermissionDenied { .. } => {
                    (StatusCode::FORBIDDEN, "permission_denied", err.to_string())
                }
                ArkiveError::NotFound { .. } => {
                    (StatusCode::NOT_FOUND, "not_found", err.to_string())
                }
                ArkiveError::InvalidOperation { .. } => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "invalid_operation",
                    err.to_string(),
                ),
                ArkiveError::DependencyFailure { .. } => {
                    // The underlying storage error never reaches the
                    // response body.
                    error!("dependency failure: {}", err);
                    (
                        StatusCode::BAD_GATEWAY,
                        "dependency_failure",
                        "upstream dependency failed".to_string(),
                    )
                }
            },
            WebError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                "bad_request",
                message.clone(),
            ),
            WebError::Server(err) => {
                error!("server error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "server_error",
                    "internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": code,
            "message": message,
        }));

        (status, body).into_response()
    }
}

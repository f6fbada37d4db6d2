use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Request-level error type.
/// Backend failures during mutations are reported as toasts instead; this
/// covers malformed requests and unknown resources only.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Missing workspace id")]
    MissingWorkspace,

    #[error("Unknown workspace: {0}")]
    UnknownWorkspace(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::MissingWorkspace => (
                StatusCode::UNAUTHORIZED,
                "MISSING_WORKSPACE",
                "Start a session first".to_string(),
            ),
            AppError::UnknownWorkspace(id) => (
                StatusCode::UNAUTHORIZED,
                "UNKNOWN_WORKSPACE",
                format!("Workspace {id} does not exist"),
            ),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

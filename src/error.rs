use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("stale state: expected {expected}, found {found}")]
    StaleState { expected: String, found: String },

    #[error("offer already claimed")]
    AlreadyClaimed,

    #[error("invalid delivery code")]
    InvalidCode,

    #[error("unauthorized")]
    Unauthorized,

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            DispatchError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            DispatchError::StaleState { .. } => (StatusCode::CONFLICT, self.to_string()),
            DispatchError::AlreadyClaimed => (StatusCode::CONFLICT, self.to_string()),
            DispatchError::InvalidCode => (StatusCode::UNPROCESSABLE_ENTITY, self.to_string()),
            // Renders the same as an unknown id so callers cannot probe
            // for the existence of resources they may not touch.
            DispatchError::Unauthorized => (StatusCode::NOT_FOUND, "not found".to_string()),
            DispatchError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            DispatchError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

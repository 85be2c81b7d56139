use axum::{Json, http::StatusCode};
use serde_json::json;
use thiserror::Error;

/// Failure of a handler, rendered as the `{ok: false, error}` envelope.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = Json(json!({ "ok": false, "error": self.message }));
        (self.status, body).into_response()
    }
}

/// Errors returned by [`crate::client::ApiClient`].
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport failure or undecodable body.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status without an error envelope.
    #[error("{endpoint} answered with status {status}")]
    Status { endpoint: String, status: u16 },

    /// The backend answered `{ok: false, error}`.
    #[error("{0}")]
    Api(String),
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;

//! Errors visible to the caller
//!
//! Only failures before acknowledgment surface here. Everything that
//! happens after the acknowledgment is logged by the dispatcher instead.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use contracts::RelayError;
use serde::Serialize;

/// Error body: `{"error": "..."}`
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug)]
pub enum IngressError {
    /// Body is not a JSON object
    MalformedEvent(String),
}

impl From<RelayError> for IngressError {
    fn from(err: RelayError) -> Self {
        match err {
            RelayError::MalformedEvent { message } => Self::MalformedEvent(message),
            other => Self::MalformedEvent(other.to_string()),
        }
    }
}

impl IntoResponse for IngressError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            Self::MalformedEvent(message) => (StatusCode::BAD_REQUEST, message),
        };
        (status, Json(ErrorResponse { error })).into_response()
    }
}

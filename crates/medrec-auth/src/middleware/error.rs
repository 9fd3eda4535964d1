//! Error responses for authentication failures.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::error::AuthError;

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = status_code(&self);
        if self.is_server_error() {
            tracing::error!(error = %self, category = %self.category(), "Auth request failed");
        }
        (status, Json(json!({ "error": self.public_message() }))).into_response()
    }
}

/// HTTP status for an auth error.
#[must_use]
pub fn status_code(error: &AuthError) -> StatusCode {
    match error {
        AuthError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
        AuthError::Forbidden { .. } => StatusCode::FORBIDDEN,
        AuthError::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
        AuthError::Conflict { .. } => StatusCode::CONFLICT,
        AuthError::Storage { .. } | AuthError::Configuration { .. } | AuthError::Internal { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

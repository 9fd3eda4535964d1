//! Extractors whose rejections use the `{error}` body.

use axum::extract::{FromRequest, FromRequestParts};
use uuid::Uuid;

use crate::error::ApiError;

/// `Json<T>` with a 400 `{error}` rejection.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `axum_extra` query extractor (repeated keys become a `Vec`) with a 400 `{error}` rejection.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum_extra::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// Parses a record id taken from the path.
///
/// A malformed id can never name a stored record, so it is reported the
/// same way as a missing one.
pub fn record_id(raw: &str, resource_type: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| {
        tracing::debug!(id = raw, resource_type, "Malformed record id");
        ApiError::not_found(format!("{resource_type} not found"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_ids_are_not_found() {
        let id = Uuid::new_v4();
        assert_eq!(record_id(&id.to_string(), "Patient").unwrap(), id);

        let err = record_id("64f1c0ffee", "Patient").unwrap_err();
        assert!(matches!(err, ApiError::NotFound(ref m) if m == "Patient not found"));
    }
}

//! Session token generation and validation.
//!
//! Sessions are HS256-signed JWTs whose subject is the user id. Validation
//! runs with zero leeway, so a token is rejected the second it expires.
//!
//! ```ignore
//! let jwt = JwtService::new(secret.as_bytes(), Duration::from_secs(7 * 86_400));
//! let token = jwt.issue(user.id)?;
//! let claims = jwt.verify(&token)?;
//! assert_eq!(claims.user_id(), Some(user.id));
//! ```

use std::time::Duration;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur during JWT operations.
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to encode a token.
    #[error("Failed to encode token: {message}")]
    EncodingError {
        /// Description of the encoding error.
        message: String,
    },

    /// Failed to decode a token.
    #[error("Failed to decode token: {message}")]
    DecodingError {
        /// Description of the decoding error.
        message: String,
    },

    /// The token has expired.
    #[error("Token expired")]
    Expired,

    /// The token signature is invalid.
    #[error("Invalid signature")]
    InvalidSignature,
}

impl From<jsonwebtoken::errors::Error> for JwtError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        match err.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            _ => Self::DecodingError {
                message: err.to_string(),
            },
        }
    }
}

// ============================================================================
// Claims
// ============================================================================

/// Claims carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User id.
    pub sub: String,
    /// Issued at (unix seconds).
    pub iat: i64,
    /// Expires at (unix seconds).
    pub exp: i64,
}

impl SessionClaims {
    /// The subject as a user id, if it is one.
    #[must_use]
    pub fn user_id(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.sub).ok()
    }
}

// ============================================================================
// JWT Service
// ============================================================================

/// Issues and verifies session tokens.
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    lifetime: Duration,
}

impl JwtService {
    /// Creates a service signing with the given HMAC secret.
    #[must_use]
    pub fn new(secret: &[u8], lifetime: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            lifetime,
        }
    }

    /// How long issued tokens stay valid.
    #[must_use]
    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Issues a token for `user_id` valid from now.
    ///
    /// # Errors
    /// Returns an error if encoding fails.
    pub fn issue(&self, user_id: Uuid) -> Result<String, JwtError> {
        self.issue_at(user_id, OffsetDateTime::now_utc())
    }

    /// Issues a token as if the current time were `now`.
    ///
    /// # Errors
    /// Returns an error if encoding fails.
    pub fn issue_at(&self, user_id: Uuid, now: OffsetDateTime) -> Result<String, JwtError> {
        let iat = now.unix_timestamp();
        let claims = SessionClaims {
            sub: user_id.to_string(),
            iat,
            exp: iat.saturating_add(i64::try_from(self.lifetime.as_secs()).unwrap_or(i64::MAX)),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| {
            JwtError::EncodingError {
                message: e.to_string(),
            }
        })
    }

    /// Decodes and validates a token.
    ///
    /// # Errors
    /// Returns an error if the signature is wrong, the token is malformed or it has expired.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(decode::<SessionClaims>(token, &self.decoding_key, &validation)?.claims)
    }
}

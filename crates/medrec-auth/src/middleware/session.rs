//! Session cookie authentication extractors.
//!
//! # Example
//!
//! ```ignore
//! use axum::{Router, routing::get};
//! use medrec_auth::middleware::{AuthState, SessionUser, VerifiedUser};
//!
//! async fn me(SessionUser(user): SessionUser) -> String {
//!     user.email
//! }
//!
//! async fn records(VerifiedUser(user): VerifiedUser) -> String {
//!     format!("records of {}", user.id)
//! }
//!
//! let app = Router::new()
//!     .route("/me", get(me))
//!     .route("/records", get(records))
//!     .with_state(auth_state);
//! ```

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};

use crate::config::CookieConfig;
use crate::error::AuthError;
use crate::jwt::JwtService;
use crate::user::{User, UserStorage};

// =============================================================================
// Auth State
// =============================================================================

/// State required by the session extractors.
///
/// Include it in the application state and expose it via `FromRef`.
#[derive(Clone)]
pub struct AuthState {
    /// Session token issuer and verifier.
    pub jwt_service: Arc<JwtService>,

    /// User storage for resolving the session subject.
    pub user_storage: Arc<dyn UserStorage>,

    /// Session cookie attributes.
    pub cookie_config: CookieConfig,
}

impl AuthState {
    /// Creates a new auth state.
    pub fn new(
        jwt_service: Arc<JwtService>,
        user_storage: Arc<dyn UserStorage>,
        cookie_config: CookieConfig,
    ) -> Self {
        Self {
            jwt_service,
            user_storage,
            cookie_config,
        }
    }
}

// =============================================================================
// Session Extractor
// =============================================================================

/// Axum extractor that resolves the caller from the session cookie.
///
/// This extractor:
/// 1. Reads the session cookie
/// 2. Verifies the token signature and expiry
/// 3. Loads the user named by the token
///
/// Any failure yields `401 Unauthorized`. A token for a user that no
/// longer exists is treated like an invalid one.
pub struct SessionUser(pub User);

impl<S> FromRequestParts<S> for SessionUser
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = AuthState::from_ref(state);

        let token = auth_state
            .cookie_config
            .read_token(&parts.headers)
            .ok_or_else(|| AuthError::unauthorized("Not authenticated"))?;

        let claims = auth_state.jwt_service.verify(&token).map_err(|e| {
            tracing::debug!(error = %e, "Rejected session token");
            AuthError::unauthorized("Unauthorized")
        })?;

        let user_id = claims.user_id().ok_or_else(|| {
            tracing::debug!(sub = %claims.sub, "Session subject is not a user id");
            AuthError::unauthorized("Unauthorized")
        })?;

        let user = auth_state
            .user_storage
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(|| {
                tracing::debug!(user_id = %user_id, "Session user no longer exists");
                AuthError::unauthorized("Unauthorized")
            })?;

        Ok(SessionUser(user))
    }
}

// =============================================================================
// Verified Session Extractor
// =============================================================================

/// Like [`SessionUser`], but additionally requires a verified email.
///
/// Unverified users get `403 Forbidden`.
pub struct VerifiedUser(pub User);

impl<S> FromRequestParts<S> for VerifiedUser
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let SessionUser(user) = SessionUser::from_request_parts(parts, state).await?;

        if !user.is_verified {
            tracing::debug!(user_id = %user.id, "Unverified user denied");
            return Err(AuthError::forbidden(
                "Email not verified. Verify your email to continue.",
            ));
        }

        Ok(VerifiedUser(user))
    }
}

//! User accounts and their storage contract.

use std::time::Duration;

use async_trait::async_trait;
use medrec_storage::StorageResult;
use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::AuthError;
use crate::secrets;

// =============================================================================
// Types
// =============================================================================

/// A registered user.
///
/// Serializing a `User` never exposes the password hash, the pending
/// verification code or the reset token digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    /// Trimmed and lowercased; unique across users.
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
    pub is_verified: bool,
    #[serde(skip)]
    pub verification_code: Option<String>,
    #[serde(skip)]
    pub verification_expires_at: Option<OffsetDateTime>,
    /// SHA-256 hex digest of the outstanding reset token.
    #[serde(skip)]
    pub reset_token_hash: Option<String>,
    #[serde(skip)]
    pub reset_expires_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl User {
    /// A freshly registered, unverified user.
    #[must_use]
    pub fn new(name: String, email: String, password_hash: String, now: OffsetDateTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            password_hash,
            is_verified: false,
            verification_code: None,
            verification_expires_at: None,
            reset_token_hash: None,
            reset_expires_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Stores a new verification code and returns it.
    pub fn issue_verification_code(&mut self, now: OffsetDateTime, lifetime: Duration) -> String {
        let code = secrets::generate_verification_code();
        self.verification_code = Some(code.clone());
        self.verification_expires_at = Some(now + lifetime);
        self.updated_at = now;
        code
    }

    /// Checks a submitted code. A code is still good at the exact moment it expires.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` with "Verification code expired" when nothing is
    /// pending or the window has passed, "Invalid code" on a mismatch.
    pub fn check_verification_code(&self, code: &str, now: OffsetDateTime) -> Result<(), AuthError> {
        let (Some(expected), Some(expires_at)) =
            (&self.verification_code, self.verification_expires_at)
        else {
            return Err(AuthError::invalid_request("Verification code expired"));
        };
        if now > expires_at {
            return Err(AuthError::invalid_request("Verification code expired"));
        }
        if !secrets::codes_match(expected, code.trim()) {
            return Err(AuthError::invalid_request("Invalid code"));
        }
        Ok(())
    }

    /// Marks the email as verified and discards the code.
    pub fn mark_verified(&mut self, now: OffsetDateTime) {
        self.is_verified = true;
        self.verification_code = None;
        self.verification_expires_at = None;
        self.updated_at = now;
    }

    /// Creates a reset token, keeps its digest and returns the plaintext.
    pub fn issue_reset_token(&mut self, now: OffsetDateTime, lifetime: Duration) -> String {
        let token = secrets::generate_reset_token();
        self.reset_token_hash = Some(secrets::hash_reset_token(&token));
        self.reset_expires_at = Some(now + lifetime);
        self.updated_at = now;
        token
    }

    /// Whether the outstanding reset token may still be redeemed.
    #[must_use]
    pub fn reset_token_valid(&self, now: OffsetDateTime) -> bool {
        self.reset_token_hash.is_some() && self.reset_expires_at.is_some_and(|exp| now <= exp)
    }

    /// Replaces the password and consumes the reset token.
    pub fn complete_reset(&mut self, password_hash: String, now: OffsetDateTime) {
        self.password_hash = password_hash;
        self.reset_token_hash = None;
        self.reset_expires_at = None;
        self.updated_at = now;
    }
}

// =============================================================================
// User Storage
// =============================================================================

/// Persistence for user accounts.
#[async_trait]
pub trait UserStorage: Send + Sync {
    /// Stores a new user.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` if the email is taken.
    async fn create_user(&self, user: &User) -> StorageResult<()>;

    async fn find_user_by_id(&self, id: Uuid) -> StorageResult<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> StorageResult<Option<User>>;

    /// Finds the user holding a reset token with this digest.
    async fn find_user_by_reset_token(&self, token_hash: &str) -> StorageResult<Option<User>>;

    /// Overwrites the stored user with `user`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the user no longer exists.
    async fn update_user(&self, user: &User) -> StorageResult<()>;
}

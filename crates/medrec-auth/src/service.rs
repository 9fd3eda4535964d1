//! Account lifecycle: registration, login, email verification and password reset.
//!
//! The service only changes account state and reports what happened. Sending
//! the resulting emails is left to the caller, which must not let delivery
//! hold up the response.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use time::OffsetDateTime;
use tracing::{debug, info};

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::jwt::JwtService;
use crate::password::{hash_password, hash_password_async, verify_password, verify_password_async};
use crate::secrets::hash_reset_token;
use crate::user::{User, UserStorage};

// =============================================================================
// Outcomes
// =============================================================================

/// A logged-in user together with a fresh session token.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    pub token: String,
}

/// Result of a successful registration.
#[derive(Debug, Clone)]
pub struct Registration {
    pub session: Session,
    /// Code to email to the new user.
    pub verification_code: String,
}

/// A reset link that should be emailed to `user`.
#[derive(Debug, Clone)]
pub struct ResetRequest {
    pub user: User,
    pub reset_url: String,
}

// =============================================================================
// Account Service
// =============================================================================

/// Account operations on top of a [`UserStorage`].
#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserStorage>,
    jwt: Arc<JwtService>,
    verification_code_lifetime: Duration,
    reset_token_lifetime: Duration,
    client_url: String,
}

impl AccountService {
    pub fn new(users: Arc<dyn UserStorage>, jwt: Arc<JwtService>, config: &AuthConfig) -> Self {
        Self {
            users,
            jwt,
            verification_code_lifetime: config.verification_code_lifetime,
            reset_token_lifetime: config.reset_token_lifetime,
            client_url: config.client_base_url().to_string(),
        }
    }

    /// Creates an unverified account, logs it in and issues a verification code.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` when a field is missing, `Conflict` when the email is taken.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Registration, AuthError> {
        let name = name.trim();
        let email = normalize_email(email);
        if name.is_empty() || email.is_empty() || password.trim().is_empty() {
            return Err(AuthError::invalid_request(
                "Name, email and password are required",
            ));
        }
        if !looks_like_email(&email) {
            return Err(AuthError::invalid_request("Invalid email"));
        }

        if self.users.find_user_by_email(&email).await?.is_some() {
            return Err(AuthError::conflict("User already exists"));
        }

        let now = OffsetDateTime::now_utc();
        let password_hash = hash_password_async(password.to_string()).await?;
        let mut user = User::new(name.to_string(), email, password_hash, now);
        let verification_code = user.issue_verification_code(now, self.verification_code_lifetime);
        self.users.create_user(&user).await?;

        info!(user_id = %user.id, "User registered");

        let token = self.issue_token(&user)?;
        Ok(Registration {
            session: Session { user, token },
            verification_code,
        })
    }

    /// Checks credentials and opens a session.
    ///
    /// # Errors
    ///
    /// `Unauthorized("Invalid credentials")` for an unknown email and for a
    /// wrong password alike.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let email = normalize_email(email);
        let user = if email.is_empty() {
            None
        } else {
            self.users.find_user_by_email(&email).await?
        };

        let Some(user) = user else {
            // Equalize timing with the wrong-password path.
            let password = password.to_string();
            let _ = tokio::task::spawn_blocking(move || {
                dummy_hash().map(|dummy| verify_password(&password, dummy))
            })
            .await;
            debug!("Login attempt for unknown email");
            return Err(invalid_credentials());
        };

        if !verify_password_async(password.to_string(), user.password_hash.clone()).await? {
            debug!(user_id = %user.id, "Login attempt with wrong password");
            return Err(invalid_credentials());
        }

        let token = self.issue_token(&user)?;
        info!(user_id = %user.id, "User logged in");
        Ok(Session { user, token })
    }

    /// Redeems a verification code for `user`.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` when the code is missing, expired or wrong.
    pub async fn verify_email(&self, mut user: User, code: &str) -> Result<User, AuthError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(AuthError::invalid_request("Code is required"));
        }

        let now = OffsetDateTime::now_utc();
        user.check_verification_code(code, now)?;
        user.mark_verified(now);
        self.users.update_user(&user).await?;

        info!(user_id = %user.id, "Email verified");
        Ok(user)
    }

    /// Replaces the pending verification code with a new one and returns it.
    ///
    /// # Errors
    ///
    /// `InvalidRequest("Already verified")` if there is nothing to verify.
    pub async fn resend_code(&self, mut user: User) -> Result<(User, String), AuthError> {
        if user.is_verified {
            return Err(AuthError::invalid_request("Already verified"));
        }

        let code = user.issue_verification_code(
            OffsetDateTime::now_utc(),
            self.verification_code_lifetime,
        );
        self.users.update_user(&user).await?;

        debug!(user_id = %user.id, "Verification code reissued");
        Ok((user, code))
    }

    /// Starts a password reset.
    ///
    /// Returns `None` when no account matches; callers must answer exactly as
    /// they would on success.
    pub async fn forgot_password(&self, email: &str) -> Result<Option<ResetRequest>, AuthError> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Ok(None);
        }
        let Some(mut user) = self.users.find_user_by_email(&email).await? else {
            debug!("Password reset requested for unknown email");
            return Ok(None);
        };

        let token = user.issue_reset_token(OffsetDateTime::now_utc(), self.reset_token_lifetime);
        self.users.update_user(&user).await?;

        info!(user_id = %user.id, "Password reset requested");
        let reset_url = format!("{}/reset-password/{}", self.client_url, token);
        Ok(Some(ResetRequest { user, reset_url }))
    }

    /// Sets a new password using a reset token.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` if the token is unknown, already used or expired.
    pub async fn reset_password(&self, token: &str, password: &str) -> Result<User, AuthError> {
        let token = token.trim();
        if token.is_empty() || password.trim().is_empty() {
            return Err(AuthError::invalid_request("Invalid payload"));
        }

        let now = OffsetDateTime::now_utc();
        let mut user = self
            .users
            .find_user_by_reset_token(&hash_reset_token(token))
            .await?
            .filter(|u| u.reset_token_valid(now))
            .ok_or_else(|| AuthError::invalid_request("Invalid or expired reset link"))?;

        let password_hash = hash_password_async(password.to_string()).await?;
        user.complete_reset(password_hash, now);
        self.users.update_user(&user).await?;

        info!(user_id = %user.id, "Password reset completed");
        Ok(user)
    }

    fn issue_token(&self, user: &User) -> Result<String, AuthError> {
        self.jwt
            .issue(user.id)
            .map_err(|e| AuthError::internal(format!("Failed to issue session token: {e}")))
    }
}

fn invalid_credentials() -> AuthError {
    AuthError::unauthorized("Invalid credentials")
}

/// Emails are compared trimmed and lowercased.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn looks_like_email(email: &str) -> bool {
    email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty() && !domain.contains('@'))
}

fn dummy_hash() -> Option<&'static str> {
    static DUMMY: OnceLock<Option<String>> = OnceLock::new();
    DUMMY
        .get_or_init(|| hash_password("medrec-dummy-password").ok())
        .as_deref()
}

//! Account and session configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Errors raised while validating [`AuthConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

/// Authentication configuration.
///
/// # Example (TOML)
///
/// ```toml
/// [auth]
/// jwt_secret = "change-me-to-something-long-and-random"
/// session_lifetime = "7d"
/// verification_code_lifetime = "15m"
/// reset_token_lifetime = "1h"
/// client_url = "https://app.example.com"
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC secret used to sign session tokens.
    pub jwt_secret: String,

    /// How long a session token (and its cookie) stays valid.
    #[serde(with = "humantime_serde")]
    pub session_lifetime: Duration,

    /// How long an emailed verification code can be redeemed.
    #[serde(with = "humantime_serde")]
    pub verification_code_lifetime: Duration,

    /// How long a password reset link stays valid.
    #[serde(with = "humantime_serde")]
    pub reset_token_lifetime: Duration,

    /// Name of the session cookie.
    pub cookie_name: String,

    /// Base URL of the web client; reset links point here.
    pub client_url: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            session_lifetime: Duration::from_secs(7 * 24 * 3600), // 7 days
            verification_code_lifetime: Duration::from_secs(15 * 60), // 15 minutes
            reset_token_lifetime: Duration::from_secs(3600),      // 1 hour
            cookie_name: "token".to_string(),
            client_url: "http://localhost:5173".to_string(),
        }
    }
}

impl AuthConfig {
    /// Minimum secret length accepted outside development.
    pub const MIN_PRODUCTION_SECRET_LEN: usize = 32;

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first invalid field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "auth.jwt_secret cannot be empty".to_string(),
            ));
        }

        for (name, lifetime) in [
            ("session_lifetime", self.session_lifetime),
            ("verification_code_lifetime", self.verification_code_lifetime),
            ("reset_token_lifetime", self.reset_token_lifetime),
        ] {
            if lifetime.is_zero() {
                return Err(ConfigError::InvalidValue(format!(
                    "auth.{name} must be greater than zero"
                )));
            }
        }

        if self.cookie_name.is_empty()
            || !self
                .cookie_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(ConfigError::InvalidValue(format!(
                "auth.cookie_name '{}' is not a valid cookie name",
                self.cookie_name
            )));
        }

        url::Url::parse(&self.client_url).map_err(|e| {
            ConfigError::InvalidValue(format!(
                "auth.client_url '{}' is not a valid URL: {e}",
                self.client_url
            ))
        })?;

        Ok(())
    }

    /// The client URL without a trailing slash.
    pub fn client_base_url(&self) -> &str {
        self.client_url.trim_end_matches('/')
    }
}

/// Attributes of the session cookie.
///
/// Cross-site deployments need `SameSite=None`, which browsers only accept
/// together with `Secure`, so both follow the deployment environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieConfig {
    pub name: String,
    pub secure: bool,
    pub same_site: cookie::SameSite,
    pub max_age: Duration,
}

impl CookieConfig {
    #[must_use]
    pub fn new(name: impl Into<String>, max_age: Duration, production: bool) -> Self {
        Self {
            name: name.into(),
            secure: production,
            same_site: if production {
                cookie::SameSite::None
            } else {
                cookie::SameSite::Lax
            },
            max_age,
        }
    }
}

impl Default for CookieConfig {
    fn default() -> Self {
        let auth = AuthConfig::default();
        Self::new(auth.cookie_name, auth.session_lifetime, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> AuthConfig {
        AuthConfig {
            jwt_secret: "0123456789abcdef0123456789abcdef".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = AuthConfig::default();
        assert_eq!(config.session_lifetime, Duration::from_secs(604_800));
        assert_eq!(config.verification_code_lifetime, Duration::from_secs(900));
        assert_eq!(config.reset_token_lifetime, Duration::from_secs(3600));
        assert_eq!(config.cookie_name, "token");
    }

    #[test]
    fn test_validate() {
        assert!(valid().validate().is_ok());
        assert!(AuthConfig::default().validate().is_err());

        let mut config = valid();
        config.client_url = "not a url".to_string();
        assert!(config.validate().is_err());

        let mut config = valid();
        config.cookie_name = "to ken".to_string();
        assert!(config.validate().is_err());

        let mut config = valid();
        config.reset_token_lifetime = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_humantime_lifetimes() {
        let config: AuthConfig = serde_json::from_value(serde_json::json!({
            "jwt_secret": "s",
            "session_lifetime": "2d",
            "verification_code_lifetime": "10m"
        }))
        .unwrap();
        assert_eq!(config.session_lifetime, Duration::from_secs(2 * 86_400));
        assert_eq!(config.verification_code_lifetime, Duration::from_secs(600));
        assert_eq!(config.reset_token_lifetime, Duration::from_secs(3600));
    }

    #[test]
    fn test_cookie_attributes_follow_environment() {
        let dev = CookieConfig::new("token", Duration::from_secs(60), false);
        assert!(!dev.secure);
        assert_eq!(dev.same_site, cookie::SameSite::Lax);

        let prod = CookieConfig::new("token", Duration::from_secs(60), true);
        assert!(prod.secure);
        assert_eq!(prod.same_site, cookie::SameSite::None);
    }

    #[test]
    fn test_client_base_url() {
        let mut config = valid();
        config.client_url = "https://app.example.com/".to_string();
        assert_eq!(config.client_base_url(), "https://app.example.com");
    }
}

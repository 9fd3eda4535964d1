//! Outbound mail settings.

use serde::{Deserialize, Serialize};

use crate::error::NotificationError;

/// SMTP settings. With `enabled = false` mail is written to the log instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    pub enabled: bool,
    pub host: Option<String>,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from_address: Option<String>,
    pub from_name: String,
    /// Product name shown in subjects and message bodies.
    pub product_name: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: None,
            port: 587,
            username: None,
            password: None,
            from_address: None,
            from_name: "DR-VIPS".to_string(),
            product_name: "DR-VIPS".to_string(),
        }
    }
}

impl MailConfig {
    pub fn validate(&self) -> Result<(), NotificationError> {
        if !self.enabled {
            return Ok(());
        }
        if self.host.as_deref().is_none_or(|h| h.trim().is_empty()) {
            return Err(NotificationError::InvalidConfig(
                "mail.host is required when mail is enabled".into(),
            ));
        }
        if self.from_address.as_deref().is_none_or(|a| a.trim().is_empty()) {
            return Err(NotificationError::InvalidConfig(
                "mail.from_address is required when mail is enabled".into(),
            ));
        }
        if self.username.is_some() != self.password.is_some() {
            return Err(NotificationError::InvalidConfig(
                "mail.username and mail.password must be set together".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_mail_needs_nothing() {
        assert!(MailConfig::default().validate().is_ok());
    }

    #[test]
    fn enabled_mail_needs_host_and_sender() {
        let mut config = MailConfig {
            enabled: true,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        config.host = Some("smtp.example.com".into());
        assert!(config.validate().is_err());

        config.from_address = Some("noreply@example.com".into());
        assert!(config.validate().is_ok());

        config.username = Some("mailer".into());
        assert!(config.validate().is_err());
    }
}

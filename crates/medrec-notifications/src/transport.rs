//! Mail transports.

use std::sync::Arc;

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use tokio::sync::Mutex;

use crate::config::MailConfig;
use crate::error::NotificationError;

/// A single outgoing email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

/// Delivers rendered mail.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), NotificationError>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

// =============================================================================
// SMTP
// =============================================================================

pub struct SmtpTransport {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpTransport {
    pub fn new(config: &MailConfig) -> Result<Self, NotificationError> {
        let host = config
            .host
            .as_deref()
            .ok_or_else(|| NotificationError::InvalidConfig("Missing mail.host".into()))?;
        let address = config
            .from_address
            .as_deref()
            .ok_or_else(|| NotificationError::InvalidConfig("Missing mail.from_address".into()))?;

        let from = Mailbox::new(
            Some(config.from_name.clone()),
            address
                .parse()
                .map_err(|e| NotificationError::InvalidAddress(format!("{address}: {e}")))?,
        );

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(host)
            .map_err(|e| NotificationError::InvalidConfig(e.to_string()))?
            .port(config.port);

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            mailer: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl MailTransport for SmtpTransport {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), NotificationError> {
        let to: Mailbox = mail
            .to
            .parse()
            .map_err(|e| NotificationError::InvalidAddress(format!("{}: {e}", mail.to)))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(mail.subject.clone())
            .header(ContentType::TEXT_HTML)
            .body(mail.html_body.clone())
            .map_err(|e| NotificationError::SendFailed(e.to_string()))?;

        self.mailer
            .send(message)
            .await
            .map_err(|e| NotificationError::SendFailed(e.to_string()))?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "smtp"
    }
}

// =============================================================================
// Log and memory
// =============================================================================

/// Writes mail to the log instead of sending it. Used when mail is disabled.
#[derive(Debug, Default)]
pub struct LogTransport;

#[async_trait]
impl MailTransport for LogTransport {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), NotificationError> {
        tracing::info!(to = %mail.to, subject = %mail.subject, "Mail delivery disabled, not sending");
        tracing::debug!(body = %mail.html_body, "Suppressed mail body");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

/// Keeps every message in memory.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    sent: Mutex<Vec<OutgoingMail>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything sent so far, oldest first.
    pub async fn sent(&self) -> Vec<OutgoingMail> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl MailTransport for MemoryTransport {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), NotificationError> {
        self.sent.lock().await.push(mail.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// SMTP when mail is enabled, otherwise the log transport.
pub fn build_transport(config: &MailConfig) -> Result<Arc<dyn MailTransport>, NotificationError> {
    if config.enabled {
        Ok(Arc::new(SmtpTransport::new(config)?))
    } else {
        Ok(Arc::new(LogTransport))
    }
}

//! Fire-and-continue dispatch of account emails.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::config::MailConfig;
use crate::error::NotificationError;
use crate::templates::{self, TemplateRenderer};
use crate::transport::{MailTransport, OutgoingMail, build_transport};

/// Renders account emails and hands them to a transport on a spawned task.
///
/// Every `send_*` method returns immediately. Delivery failures are logged
/// and dropped; there are no retries.
#[derive(Clone)]
pub struct Mailer {
    transport: Arc<dyn MailTransport>,
    renderer: Arc<TemplateRenderer>,
}

impl Mailer {
    pub fn new(transport: Arc<dyn MailTransport>, product_name: &str) -> Self {
        Self {
            transport,
            renderer: Arc::new(TemplateRenderer::with_defaults(product_name)),
        }
    }

    /// Builds the transport described by `config`.
    pub fn from_config(config: &MailConfig) -> Result<Self, NotificationError> {
        let transport = build_transport(config)?;
        tracing::info!(transport = transport.name(), "Mailer ready");
        Ok(Self::new(transport, &config.product_name))
    }

    pub fn send_verification(&self, to: &str, code: &str, expires_in: Duration) -> JoinHandle<()> {
        self.dispatch(
            templates::VERIFICATION,
            to,
            HashMap::from([
                ("code", code.to_string()),
                ("expires", describe(expires_in)),
            ]),
        )
    }

    pub fn send_welcome(&self, to: &str, name: &str) -> JoinHandle<()> {
        let name = if name.trim().is_empty() { "doctor" } else { name };
        self.dispatch(
            templates::WELCOME,
            to,
            HashMap::from([("name", name.to_string())]),
        )
    }

    pub fn send_reset_request(&self, to: &str, reset_url: &str, expires_in: Duration) -> JoinHandle<()> {
        self.dispatch(
            templates::RESET_REQUEST,
            to,
            HashMap::from([
                ("reset_url", reset_url.to_string()),
                ("expires", describe(expires_in)),
            ]),
        )
    }

    pub fn send_reset_success(&self, to: &str) -> JoinHandle<()> {
        self.dispatch(templates::RESET_SUCCESS, to, HashMap::new())
    }

    fn dispatch(
        &self,
        template_id: &'static str,
        to: &str,
        data: HashMap<&'static str, String>,
    ) -> JoinHandle<()> {
        let transport = Arc::clone(&self.transport);
        let renderer = Arc::clone(&self.renderer);
        let to = to.to_string();

        tokio::spawn(async move {
            let result = match renderer.render(template_id, &data) {
                Ok(content) => {
                    let mail = OutgoingMail {
                        to: to.clone(),
                        subject: content.subject,
                        html_body: content.html_body,
                    };
                    transport.send(&mail).await
                }
                Err(e) => Err(e),
            };

            match result {
                Ok(()) => tracing::debug!(template = template_id, to = %to, "Mail sent"),
                Err(e) => tracing::warn!(
                    template = template_id,
                    to = %to,
                    transport = transport.name(),
                    error = %e,
                    "Mail delivery failed"
                ),
            }
        })
    }
}

/// "15 minutes", "1 hour", "2 days".
fn describe(duration: Duration) -> String {
    let secs = duration.as_secs();
    let (count, unit) = if secs >= 86_400 && secs % 86_400 == 0 {
        (secs / 86_400, "day")
    } else if secs >= 3_600 && secs % 3_600 == 0 {
        (secs / 3_600, "hour")
    } else if secs >= 60 {
        (secs / 60, "minute")
    } else {
        (secs, "second")
    };
    if count == 1 {
        format!("1 {unit}")
    } else {
        format!("{count} {unit}s")
    }
}

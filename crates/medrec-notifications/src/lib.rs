//! Transactional email for medrec accounts.
//!
//! [`Mailer`] renders the verification, welcome and password reset emails
//! and delivers them in the background through a [`MailTransport`].

pub mod config;
pub mod error;
pub mod mailer;
pub mod templates;
pub mod transport;

pub use config::MailConfig;
pub use error::NotificationError;
pub use mailer::Mailer;
pub use templates::{RenderedContent, Template, TemplateRenderer};
pub use transport::{
    LogTransport, MailTransport, MemoryTransport, OutgoingMail, SmtpTransport, build_transport,
};

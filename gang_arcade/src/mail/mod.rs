//! Outgoing email.
//!
//! Managers talk to a [`Mailer`] trait object so the SMTP relay can be swapped
//! for [`LogMailer`] in development or [`MemoryMailer`] in tests.

pub mod templates;

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart},
    transport::smtp::authentication::Credentials,
};
use std::sync::Mutex;
use thiserror::Error;

/// Mail errors
#[derive(Debug, Error)]
pub enum MailError {
    #[error("Invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Could not build message: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

pub type MailResult<T> = Result<T, MailError>;

/// A rendered email ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub to_name: Option<String>,
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Anything that can deliver an [`OutgoingEmail`].
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> MailResult<()>;
}

/// SMTP connection settings
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    /// Relay host, e.g. `smtp.gmail.com`
    pub host: String,
    pub username: String,
    pub password: String,
    /// Sender mailbox, e.g. `Gang HQ <gang@example.com>`
    pub from: String,
}

/// Mailer delivering through an authenticated SMTP relay.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(settings: &SmtpSettings) -> MailResult<Self> {
        let credentials = Credentials::new(settings.username.clone(), settings.password.clone());
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)?
            .credentials(credentials)
            .build();

        Ok(Self {
            transport,
            from: settings.from.parse()?,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: OutgoingEmail) -> MailResult<()> {
        let to = Mailbox::new(email.to_name.clone(), email.to.parse()?);
        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(email.subject.as_str())
            .multipart(MultiPart::alternative_plain_html(email.text, email.html))?;

        self.transport.send(message).await?;
        log::info!("Email sent to {}", email.to);
        Ok(())
    }
}

/// Mailer that only logs, used when no SMTP relay is configured.
#[derive(Debug, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: OutgoingEmail) -> MailResult<()> {
        log::info!(
            "SMTP disabled, not sending \"{}\" to {}:\n{}",
            email.subject,
            email.to,
            email.text
        );
        Ok(())
    }
}

/// Mailer that keeps every message in memory.
#[derive(Debug, Default)]
pub struct MemoryMailer {
    sent: Mutex<Vec<OutgoingEmail>>,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything sent so far
    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }

    /// Most recent message addressed to `to`
    pub fn last_to(&self, to: &str) -> Option<OutgoingEmail> {
        self.sent().into_iter().rev().find(|email| email.to == to)
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, email: OutgoingEmail) -> MailResult<()> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(email);
        }
        Ok(())
    }
}

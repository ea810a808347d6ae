//! Transactional mail for the Lif Auth Server.
//!
//! Mail is delivered through the platform's mail service. The [`Mailer`]
//! trait keeps delivery swappable: [`MailServiceClient`] talks HTTP,
//! [`NoopMailer`] drops messages when mail is disabled, and
//! [`RecordingMailer`] keeps them in memory.

mod client;
pub mod messages;

pub use client::MailServiceClient;

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::MailConfig;
use crate::db::Account;
use crate::Result;

/// An outgoing email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    /// Recipient address.
    pub recipient: String,
    /// Subject line.
    pub subject: String,
    /// Message body (HTML or plain text).
    pub body: String,
}

impl EmailMessage {
    /// Create a new message.
    pub fn new(
        recipient: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            recipient: recipient.into(),
            subject: subject.into(),
            body: body.into(),
        }
    }
}

/// Mail delivery backend.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver one message.
    async fn send(&self, message: &EmailMessage) -> Result<()>;

    /// Whether messages actually leave the process.
    fn is_enabled(&self) -> bool;
}

/// Mailer used when mail is disabled. Every message is dropped.
#[derive(Debug, Default)]
pub struct NoopMailer;

#[async_trait]
impl Mailer for NoopMailer {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        info!(
            recipient = %message.recipient,
            subject = %message.subject,
            "mail disabled, message dropped"
        );
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        false
    }
}

/// Mailer that keeps every message in memory.
#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<EmailMessage>>,
}

impl RecordingMailer {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages sent so far.
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(message.clone());
        }
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        true
    }
}

/// Build the mailer described by the configuration.
pub fn from_config(config: &MailConfig) -> Result<Arc<dyn Mailer>> {
    if !config.enabled {
        return Ok(Arc::new(NoopMailer));
    }
    Ok(Arc::new(MailServiceClient::new(
        &config.service_url,
        &config.service_token,
    )?))
}

/// Result of a broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Messages accepted by the mailer.
    pub sent: usize,
    /// Messages the mailer rejected.
    pub failed: usize,
}

/// Send the same message to every account.
///
/// Individual delivery failures are logged and counted, not propagated.
pub async fn broadcast(
    mailer: &dyn Mailer,
    accounts: &[Account],
    subject: &str,
    body: &str,
) -> BroadcastReport {
    let mut report = BroadcastReport::default();
    for account in accounts {
        let message = EmailMessage::new(&account.email, subject, body);
        match mailer.send(&message).await {
            Ok(()) => report.sent += 1,
            Err(e) => {
                warn!(username = %account.username, error = %e, "broadcast delivery failed");
                report.failed += 1;
            }
        }
    }
    info!(sent = report.sent, failed = report.failed, "broadcast finished");
    report
}

//! HTTP client for the platform mail service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, error};
use url::Url;

use super::{EmailMessage, Mailer};
use crate::{LifError, Result};

/// Request timeout for the mail service.
const SEND_TIMEOUT: Duration = Duration::from_secs(15);

/// Mailer that posts messages to `{service_url}/service/send_email`.
///
/// The access token, subject and recipient travel as headers; the body is
/// the message body.
#[derive(Debug, Clone)]
pub struct MailServiceClient {
    client: Client,
    endpoint: Url,
    access_token: String,
}

impl MailServiceClient {
    /// Create a client for the given service base URL.
    pub fn new(service_url: &str, access_token: &str) -> Result<Self> {
        let base = Url::parse(service_url)
            .map_err(|e| LifError::Config(format!("invalid mail service url: {e}")))?;
        let endpoint = base
            .join("service/send_email")
            .map_err(|e| LifError::Config(format!("invalid mail service url: {e}")))?;

        let client = Client::builder()
            .timeout(SEND_TIMEOUT)
            .build()
            .map_err(|e| LifError::Config(format!("failed to build http client: {e}")))?;

        Ok(Self {
            client,
            endpoint,
            access_token: access_token.to_string(),
        })
    }

    /// The URL messages are posted to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl Mailer for MailServiceClient {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        debug!(recipient = %message.recipient, subject = %message.subject, "sending mail");

        let response = self
            .client
            .post(self.endpoint.clone())
            .header("access-token", &self.access_token)
            .header("subject", &message.subject)
            .header("recipient", &message.recipient)
            .body(message.body.clone())
            .send()
            .await
            .map_err(|e| LifError::Mail(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            error!(recipient = %message.recipient, %status, "mail service rejected message");
            return Err(LifError::Mail(format!("mail service returned {status}")));
        }

        Ok(())
    }

    fn is_enabled(&self) -> bool {
        true
    }
}

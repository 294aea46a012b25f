//! Outbound email over an HTTP mail API
//!
//! Messages are posted as JSON with plain-text and optional HTML bodies;
//! attachments travel base64-encoded.

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;

use crate::config::MailConfig;

/// An email ready to send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub text_body: String,
    pub html_body: Option<String>,
    pub attachments: Vec<EmailAttachment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAttachment {
    pub filename: String,
    pub content_type: String,
    pub content: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail request timed out")]
    Timeout,

    #[error("mail request failed: {0}")]
    Request(String),

    #[error("mail API rejected message ({status}): {message}")]
    Rejected { status: u16, message: String },
}

impl From<reqwest::Error> for MailError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            MailError::Timeout
        } else {
            MailError::Request(e.to_string())
        }
    }
}

/// Delivers email
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError>;
}

#[derive(Debug, Serialize)]
struct SendMailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    html: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attachments: Vec<AttachmentPayload<'a>>,
}

#[derive(Debug, Serialize)]
struct AttachmentPayload<'a> {
    filename: &'a str,
    content_type: &'a str,
    content: String,
}

impl<'a> SendMailRequest<'a> {
    fn new(from: &'a str, message: &'a EmailMessage) -> Self {
        Self {
            from,
            to: [message.to.as_str()],
            subject: &message.subject,
            text: &message.text_body,
            html: message.html_body.as_deref(),
            attachments: message
                .attachments
                .iter()
                .map(|a| AttachmentPayload {
                    filename: &a.filename,
                    content_type: &a.content_type,
                    content: BASE64.encode(&a.content),
                })
                .collect(),
        }
    }
}

/// HTTP mail API client
#[derive(Clone)]
pub struct HttpMailer {
    http_client: Client,
    api_endpoint: String,
    api_key: String,
    from_address: String,
    timeout: Duration,
}

impl HttpMailer {
    /// Create a new HttpMailer
    pub fn new(
        api_endpoint: String,
        api_key: String,
        from_address: String,
        timeout: Duration,
    ) -> Self {
        Self {
            http_client: Client::new(),
            api_endpoint,
            api_key,
            from_address,
            timeout,
        }
    }

    /// Create from configuration; `None` when the configuration is incomplete
    pub fn from_config(config: &MailConfig) -> Option<Self> {
        if !config.is_complete() {
            return None;
        }
        Some(Self::new(
            config.api_endpoint.clone()?,
            config.api_key.clone()?,
            config.from_address.clone()?,
            Duration::from_secs(config.timeout_secs),
        ))
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        let request = SendMailRequest::new(&self.from_address, message);

        let response = self
            .http_client
            .post(&self.api_endpoint)
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            Err(MailError::Rejected { status, message })
        }
    }
}

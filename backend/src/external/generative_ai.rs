//! Generative Language API client
//!
//! Sends a single-turn prompt to `{base_url}/models/{model}:generateContent`
//! and returns the generated text. Models are tried in preference order;
//! a model the API does not know is skipped in favour of the next one.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use shared::ServiceFailure;
use thiserror::Error;

use crate::config::AiConfig;

/// Generation failures, categorized from transport errors and the
/// structured error body returned by the API
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AiError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("API key rejected")]
    Unauthorized,

    #[error("quota exceeded")]
    QuotaExceeded,

    #[error("rate limited")]
    RateLimited,

    #[error("model not found: {0}")]
    ModelNotFound(String),

    #[error("API error {status}: {message}")]
    Http { status: u16, message: String },

    #[error("response contained no text")]
    EmptyResponse,

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl AiError {
    /// Category handed to the fallback policy
    pub fn failure(&self) -> ServiceFailure {
        match self {
            AiError::Timeout => ServiceFailure::Timeout,
            AiError::Connection(msg) => ServiceFailure::Connection(msg.clone()),
            AiError::Unauthorized => ServiceFailure::InvalidCredentials,
            AiError::QuotaExceeded => ServiceFailure::QuotaExceeded,
            AiError::RateLimited => ServiceFailure::RateLimited,
            AiError::ModelNotFound(_) => ServiceFailure::ModelNotFound,
            AiError::Http { .. } | AiError::EmptyResponse | AiError::InvalidResponse(_) => {
                ServiceFailure::Upstream(self.to_string())
            }
        }
    }
}

impl From<reqwest::Error> for AiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            AiError::Timeout
        } else if e.is_decode() {
            AiError::InvalidResponse(e.to_string())
        } else {
            AiError::Connection(e.to_string())
        }
    }
}

/// Produces text for a prompt
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, AiError>;
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Google API error envelope
#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    details: Vec<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(rename = "@type", default)]
    type_url: String,
    #[serde(default)]
    reason: Option<String>,
}

/// Map an unsuccessful response to an [`AiError`]
fn classify_error(status: StatusCode, body: &str, model: &str) -> AiError {
    let parsed = serde_json::from_str::<ApiErrorEnvelope>(body).ok().map(|e| e.error);
    let has_reason = |reason: &str| {
        parsed
            .as_ref()
            .is_some_and(|e| e.details.iter().any(|d| d.reason.as_deref() == Some(reason)))
    };
    let has_detail_type = |suffix: &str| {
        parsed
            .as_ref()
            .is_some_and(|e| e.details.iter().any(|d| d.type_url.ends_with(suffix)))
    };

    match status {
        StatusCode::NOT_FOUND => AiError::ModelNotFound(model.to_string()),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AiError::Unauthorized,
        StatusCode::BAD_REQUEST if has_reason("API_KEY_INVALID") => AiError::Unauthorized,
        StatusCode::TOO_MANY_REQUESTS if has_detail_type("QuotaFailure") => AiError::QuotaExceeded,
        StatusCode::TOO_MANY_REQUESTS => AiError::RateLimited,
        _ => AiError::Http {
            status: status.as_u16(),
            message: parsed
                .as_ref()
                .map(|e| {
                    if e.status.is_empty() {
                        e.message.clone()
                    } else {
                        format!("{}: {}", e.status, e.message)
                    }
                })
                .unwrap_or_else(|| body.chars().take(200).collect()),
        },
    }
}

/// Generative Language API client
#[derive(Clone)]
pub struct GeminiClient {
    http_client: Client,
    api_key: String,
    base_url: String,
    models: Vec<String>,
    timeout: Duration,
}

impl GeminiClient {
    /// Create a new GeminiClient
    pub fn new(api_key: String, base_url: String, models: Vec<String>, timeout: Duration) -> Self {
        Self {
            http_client: Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            models,
            timeout,
        }
    }

    /// Create from configuration; `None` when no API key is configured
    pub fn from_config(config: &AiConfig) -> Option<Self> {
        let api_key = config.api_key()?;
        Some(Self::new(
            api_key.to_string(),
            config.base_url.clone(),
            config.models.clone(),
            Duration::from_secs(config.timeout_secs),
        ))
    }

    async fn generate_with_model(&self, model: &str, prompt: &str) -> Result<String, AiError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, model);
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        let response = self
            .http_client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_error(status, &body, model));
        }

        let data: GenerateContentResponse = response.json().await?;
        let text: String = data
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(AiError::EmptyResponse);
        }
        Ok(text)
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, AiError> {
        let mut last_error = AiError::ModelNotFound("no models configured".to_string());

        for model in &self.models {
            match self.generate_with_model(model, prompt).await {
                Ok(text) => return Ok(text),
                Err(AiError::ModelNotFound(name)) => {
                    tracing::debug!(model = %name, "Model unavailable, trying next");
                    last_error = AiError::ModelNotFound(name);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error)
    }
}

//! Exchange rate API client
//!
//! Reads USD-based rates from an exchangerate-api compatible endpoint
//! (`GET {base_url}/latest/USD`).

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::ExchangeRates;
use thiserror::Error;

use crate::config::ExchangeRateConfig;

/// Exchange rate lookup failures
#[derive(Debug, Error)]
pub enum RateError {
    #[error("exchange rate request timed out")]
    Timeout,

    #[error("exchange rate request failed: {0}")]
    Request(String),

    #[error("exchange rate service returned status {0}")]
    Status(u16),

    #[error("invalid exchange rate payload: {0}")]
    Payload(String),
}

impl From<reqwest::Error> for RateError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            RateError::Timeout
        } else if e.is_decode() {
            RateError::Payload(e.to_string())
        } else {
            RateError::Request(e.to_string())
        }
    }
}

/// Source of current USD exchange rates
#[async_trait]
pub trait RateSource: Send + Sync {
    async fn latest_rates(&self) -> Result<ExchangeRates, RateError>;
}

/// exchangerate-api response; only the rate table is used
#[derive(Debug, Deserialize)]
struct LatestRatesResponse {
    rates: HashMap<String, f64>,
}

impl LatestRatesResponse {
    /// Positive EUR/COP rates as decimals. Parsing the shortest float
    /// representation keeps 0.85 as 0.85 rather than its binary expansion.
    fn supported_rates(&self) -> HashMap<String, Decimal> {
        ["EUR", "COP"]
            .into_iter()
            .filter_map(|code| {
                let rate = self.rates.get(code)?;
                let rate = rate.to_string().parse::<Decimal>().ok()?;
                (rate > Decimal::ZERO).then(|| (code.to_string(), rate))
            })
            .collect()
    }
}

/// Exchange rate API client
#[derive(Clone)]
pub struct ExchangeRateClient {
    http_client: Client,
    base_url: String,
    timeout: Duration,
}

impl ExchangeRateClient {
    /// Create a new ExchangeRateClient
    pub fn new(base_url: String, timeout: Duration) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    /// Create from configuration
    pub fn from_config(config: &ExchangeRateConfig) -> Self {
        Self::new(
            config.base_url.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }
}

#[async_trait]
impl RateSource for ExchangeRateClient {
    async fn latest_rates(&self) -> Result<ExchangeRates, RateError> {
        let url = format!("{}/latest/USD", self.base_url);

        let response = self
            .http_client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RateError::Status(response.status().as_u16()));
        }

        let data: LatestRatesResponse = response.json().await?;
        Ok(ExchangeRates::from_table(&data.supported_rates()))
    }
}

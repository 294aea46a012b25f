//! Currency conversion service

use std::sync::Arc;

use rust_decimal::Decimal;
use shared::{convert_usd, ConvertedAmount, ExchangeRates, ProductPrices};

use crate::external::RateSource;

/// Converts USD amounts using live rates, falling back to fixed rates
#[derive(Clone)]
pub struct CurrencyService {
    rates: Arc<dyn RateSource>,
}

impl CurrencyService {
    /// Create a new CurrencyService instance
    pub fn new(rates: Arc<dyn RateSource>) -> Self {
        Self { rates }
    }

    /// Current rates, or the fallback rates when the source fails
    pub async fn current_rates(&self) -> ExchangeRates {
        match self.rates.latest_rates().await {
            Ok(rates) => rates,
            Err(e) => {
                tracing::warn!(error = %e, "Exchange rate lookup failed, using fallback rates");
                ExchangeRates::fallback()
            }
        }
    }

    /// Convert a USD amount. Zero skips the rate lookup entirely.
    pub async fn convert(&self, amount_usd: Decimal) -> ConvertedAmount {
        if amount_usd.is_zero() {
            return ConvertedAmount::zero();
        }
        let rates = self.current_rates().await;
        convert_usd(amount_usd, &rates)
    }

    /// Derive all product prices from the USD price
    pub async fn product_prices(&self, price_usd: Decimal) -> ProductPrices {
        if price_usd.is_zero() {
            return ProductPrices::from_usd(price_usd, &ExchangeRates::fallback());
        }
        let rates = self.current_rates().await;
        ProductPrices::from_usd(price_usd, &rates)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::external::RateError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Rate source returning a fixed answer and counting lookups
    pub(crate) struct StubRates {
        pub rates: Option<ExchangeRates>,
        pub calls: AtomicUsize,
    }

    impl StubRates {
        pub(crate) fn failing() -> Self {
            Self {
                rates: None,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl RateSource for StubRates {
        async fn latest_rates(&self) -> Result<ExchangeRates, RateError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.rates.ok_or(RateError::Timeout)
        }
    }

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn failing_source_uses_fallback() {
        let service = CurrencyService::new(Arc::new(StubRates::failing()));
        let converted = service.convert(dec("100")).await;
        assert_eq!(converted.eur, dec("85.00"));
        assert_eq!(converted.cop, dec("390000.00"));
    }

    #[tokio::test]
    async fn zero_skips_lookup() {
        let stub = Arc::new(StubRates::failing());
        let service = CurrencyService::new(stub.clone());
        assert_eq!(service.convert(Decimal::ZERO).await, ConvertedAmount::zero());
        assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn live_rates_are_used() {
        let stub = Arc::new(StubRates {
            rates: Some(ExchangeRates {
                eur: dec("0.9"),
                cop: dec("4000"),
            }),
            calls: AtomicUsize::new(0),
        });
        let service = CurrencyService::new(stub.clone());
        let prices = service.product_prices(dec("10")).await;
        assert_eq!(prices.eur, dec("9.00"));
        assert_eq!(prices.cop, dec("40000.00"));
        assert_eq!(stub.calls.load(Ordering::SeqCst), 1);
    }
}

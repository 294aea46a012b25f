//! USD to EUR/COP conversion
//!
//! Rates are expressed as units of the target currency per one US dollar.
//! Converted amounts are rounded to two decimal places using banker's
//! rounding (round half to even) everywhere money is converted.

use std::collections::HashMap;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Decimal places kept on converted amounts
pub const MONEY_SCALE: u32 = 2;

/// Exchange rates relative to USD
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRates {
    pub eur: Decimal,
    pub cop: Decimal,
}

impl ExchangeRates {
    /// Rates used whenever the live source cannot be reached
    pub fn fallback() -> Self {
        Self {
            eur: Decimal::new(85, 2),
            cop: Decimal::new(3900, 0),
        }
    }

    /// Build rates from a currency-code keyed table such as the `rates`
    /// object of an exchange-rate API response. A missing code falls back
    /// to that currency's default rate.
    pub fn from_table(rates: &HashMap<String, Decimal>) -> Self {
        let fallback = Self::fallback();
        Self {
            eur: rates.get("EUR").copied().unwrap_or(fallback.eur),
            cop: rates.get("COP").copied().unwrap_or(fallback.cop),
        }
    }
}

impl Default for ExchangeRates {
    fn default() -> Self {
        Self::fallback()
    }
}

/// An amount expressed in the three supported currencies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertedAmount {
    pub usd: Decimal,
    pub eur: Decimal,
    pub cop: Decimal,
}

impl ConvertedAmount {
    pub fn zero() -> Self {
        Self {
            usd: Decimal::ZERO,
            eur: Decimal::ZERO,
            cop: Decimal::ZERO,
        }
    }
}

/// Round a monetary amount to two decimals, half to even
pub fn round_money(amount: Decimal) -> Decimal {
    let mut rounded = amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointNearestEven);
    rounded.rescale(MONEY_SCALE);
    rounded
}

/// Convert a USD amount with the given rates
pub fn convert_usd(amount_usd: Decimal, rates: &ExchangeRates) -> ConvertedAmount {
    if amount_usd.is_zero() {
        return ConvertedAmount::zero();
    }

    ConvertedAmount {
        usd: amount_usd,
        eur: round_money(amount_usd * rates.eur),
        cop: round_money(amount_usd * rates.cop),
    }
}

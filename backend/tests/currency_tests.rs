//! Currency conversion tests
//!
//! Verifies:
//! - Property 5: Zero input converts to zero in every currency
//! - Property 6: Converted amounts are rounded half-to-even to two decimals
//! - Property 7: Product prices derive from the USD price

use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::{convert_usd, round_money, ConvertedAmount, ExchangeRates, ProductPrices};
use std::str::FromStr;

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// 100 USD with fallback rates
    #[test]
    fn test_fallback_conversion() {
        let converted = convert_usd(dec("100"), &ExchangeRates::fallback());
        assert_eq!(
            converted,
            ConvertedAmount {
                usd: dec("100"),
                eur: dec("85.00"),
                cop: dec("390000.00"),
            }
        );
    }

    /// Zero never needs a rate
    #[test]
    fn test_zero_conversion() {
        let rates = ExchangeRates {
            eur: dec("0.93"),
            cop: dec("4012.55"),
        };
        assert_eq!(convert_usd(Decimal::ZERO, &rates), ConvertedAmount::zero());
    }

    /// Ties go to the even digit
    #[test]
    fn test_bankers_rounding() {
        let rates = ExchangeRates {
            eur: dec("0.5"),
            cop: dec("1"),
        };
        // 0.25 * 0.5 = 0.125 -> 0.12, 0.35 * 0.5 = 0.175 -> 0.18
        assert_eq!(convert_usd(dec("0.25"), &rates).eur, dec("0.12"));
        assert_eq!(convert_usd(dec("0.35"), &rates).eur, dec("0.18"));
    }

    /// Product prices are recomputed from USD
    #[test]
    fn test_product_prices_from_usd() {
        let prices = ProductPrices::from_usd(dec("19.99"), &ExchangeRates::fallback());
        assert_eq!(prices.usd, dec("19.99"));
        assert_eq!(prices.eur, dec("16.99"));
        assert_eq!(prices.cop, dec("77961.00"));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    /// Strategy for USD amounts (0.01 to 100000.00)
    fn amount_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=10_000_000i64).prop_map(|n| Decimal::new(n, 2))
    }

    /// Strategy for exchange rates
    fn rate_strategy() -> impl Strategy<Value = ExchangeRates> {
        ((1i64..=2000i64), (1000i64..=500_000i64)).prop_map(|(eur, cop)| ExchangeRates {
            eur: Decimal::new(eur, 3),
            cop: Decimal::new(cop, 2),
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Property 6: converted amounts carry exactly two decimals and stay
        /// within half a cent of the exact product
        #[test]
        fn prop_rounded_to_cents(amount in amount_strategy(), rates in rate_strategy()) {
            let converted = convert_usd(amount, &rates);
            let half_cent = dec("0.005");

            prop_assert_eq!(converted.eur.scale(), 2);
            prop_assert_eq!(converted.cop.scale(), 2);
            prop_assert!((converted.eur - amount * rates.eur).abs() <= half_cent);
            prop_assert!((converted.cop - amount * rates.cop).abs() <= half_cent);
        }

        /// Property 6: rounding is stable
        #[test]
        fn prop_round_money_idempotent(amount in amount_strategy()) {
            let once = round_money(amount);
            prop_assert_eq!(round_money(once), once);
        }

        /// Property 7: the USD amount passes through untouched
        #[test]
        fn prop_usd_unchanged(amount in amount_strategy()) {
            let prices = ProductPrices::from_usd(amount, &ExchangeRates::fallback());
            prop_assert_eq!(prices.usd, amount);
        }
    }
}

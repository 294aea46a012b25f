//! Stock risk policy tests
//!
//! Tests for the stock-risk pipeline including:
//! - Property 1: Classification is total, deterministic and monotone
//! - Property 2: Every low-stock item gets exactly one actionable alert
//! - Property 3: Well-stocked items stay silent without an external claim
//! - Property 4: Reconciliation is idempotent

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use shared::{
    classify, reconcile, InventorySnapshot, PredictionSource, RawPrediction, RiskTier,
    ServiceFailure, LOW_STOCK_THRESHOLD,
};

fn snapshot(index: usize, quantity: u32) -> InventorySnapshot {
    let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
    InventorySnapshot {
        product_name: format!("Product {}", index),
        product_code: format!("SKU-{:03}", index),
        quantity,
        company_name: "Distribuidora Andina".to_string(),
        company_nit: "900123456".to_string(),
        ingress_date: at,
        last_update_date: at,
    }
}

fn raw(index: usize, tier: Option<&str>, days: Option<u32>) -> RawPrediction {
    RawPrediction {
        product_name: format!("Product {}", index),
        company_name: "Distribuidora Andina".to_string(),
        current_quantity: None,
        days_until_stockout: days,
        message: None,
        risk_level: tier.map(str::to_string),
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Out of stock is HIGH with zero days
    #[test]
    fn test_out_of_stock() {
        let assessment = classify(0);
        assert_eq!(assessment.tier, RiskTier::High);
        assert_eq!(assessment.days_until_stockout, Some(0));
        assert!(assessment.message("Teclado", 0).contains("OUT OF STOCK"));
    }

    /// Scenario table from the classification bands
    #[test]
    fn test_classification_scenarios() {
        assert_eq!(classify(4).tier, RiskTier::High);
        assert_eq!(classify(4).days_until_stockout, Some(3));
        assert_eq!(classify(7).tier, RiskTier::Medium);
        assert_eq!(classify(7).days_until_stockout, Some(7));
        assert_eq!(classify(15).tier, RiskTier::Low);
        assert_eq!(classify(25).tier, RiskTier::None);
        assert_eq!(classify(25).days_until_stockout, None);
    }

    /// A 25-unit item produces no alert on the fallback path
    #[test]
    fn test_well_stocked_has_no_alert() {
        let alerts = reconcile(
            &[snapshot(0, 25)],
            &PredictionSource::Unavailable(ServiceFailure::Connection("refused".into())),
        );
        assert!(alerts.is_empty());
    }

    /// Empty prediction array still yields the baseline for low stock
    #[test]
    fn test_empty_predictions_fall_back_per_item() {
        let snapshots = [snapshot(0, 0), snapshot(1, 12), snapshot(2, 10)];
        let alerts = reconcile(&snapshots, &PredictionSource::Parsed(vec![]));
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].current_quantity, 0);
        assert_eq!(alerts[1].current_quantity, 10);
    }

    /// Malformed responses behave like an outage
    #[test]
    fn test_malformed_equals_unavailable() {
        let snapshots = [snapshot(0, 3), snapshot(1, 40), snapshot(2, 6)];
        let malformed = reconcile(
            &snapshots,
            &PredictionSource::Malformed { reason: "not json".into() },
        );
        let unavailable = reconcile(
            &snapshots,
            &PredictionSource::Unavailable(ServiceFailure::QuotaExceeded),
        );
        assert_eq!(malformed, unavailable);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    /// Strategy for tier labels the generative service may emit
    fn tier_label_strategy() -> impl Strategy<Value = Option<&'static str>> {
        prop_oneof![
            Just(None),
            Just(Some("ALTO")),
            Just(Some("MEDIO")),
            Just(Some("BAJO")),
            Just(Some("NINGUNO")),
            Just(Some("HIGH")),
            Just(Some("unknown")),
        ]
    }

    /// Strategy for a raw prediction aimed at one of `n` products,
    /// occasionally at a product that does not exist
    fn prediction_strategy(n: usize) -> impl Strategy<Value = RawPrediction> {
        (
            0..n + 2,
            tier_label_strategy(),
            prop::option::of(0u32..30),
        )
            .prop_map(|(index, tier, days)| raw(index, tier, days))
    }

    fn scenario_strategy() -> impl Strategy<Value = (Vec<InventorySnapshot>, PredictionSource)> {
        prop::collection::vec(0u32..40, 1..12).prop_flat_map(|quantities| {
            let n = quantities.len();
            let snapshots: Vec<_> = quantities
                .into_iter()
                .enumerate()
                .map(|(i, q)| snapshot(i, q))
                .collect();
            let source = prop_oneof![
                prop::collection::vec(prediction_strategy(n), 0..16)
                    .prop_map(PredictionSource::Parsed),
                Just(PredictionSource::Unavailable(ServiceFailure::Timeout)),
                Just(PredictionSource::Malformed { reason: "truncated".into() }),
            ];
            (Just(snapshots), source)
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Property 1: classification is deterministic and severity never
        /// increases as quantity grows
        #[test]
        fn prop_classification_monotone(q in 0u32..1000) {
            let here = classify(q);
            prop_assert_eq!(here, classify(q));
            prop_assert!(classify(q + 1).tier <= here.tier);
        }

        /// Property 1: low stock is always actionable on its own
        #[test]
        fn prop_low_stock_baseline_actionable(q in 0u32..=LOW_STOCK_THRESHOLD) {
            let assessment = classify(q);
            prop_assert_ne!(assessment.tier, RiskTier::None);
            prop_assert!(assessment.days_until_stockout.is_some());
        }

        /// Property 2: each low-stock snapshot appears exactly once with a
        /// tier above NONE and a day estimate
        #[test]
        fn prop_low_stock_exactly_once((snapshots, source) in scenario_strategy()) {
            let alerts = reconcile(&snapshots, &source);
            for s in snapshots.iter().filter(|s| s.quantity <= LOW_STOCK_THRESHOLD) {
                let matching: Vec<_> = alerts
                    .iter()
                    .filter(|a| a.product_name == s.product_name)
                    .collect();
                prop_assert_eq!(matching.len(), 1);
                prop_assert_ne!(matching[0].risk_tier, RiskTier::None);
                prop_assert!(matching[0].days_until_stockout.is_some());
                prop_assert_eq!(matching[0].current_quantity, s.quantity);
            }
        }

        /// Property 2: no alert ever carries tier NONE or lacks days
        #[test]
        fn prop_alerts_always_actionable((snapshots, source) in scenario_strategy()) {
            for alert in reconcile(&snapshots, &source) {
                prop_assert_ne!(alert.risk_tier, RiskTier::None);
                prop_assert!(alert.days_until_stockout.is_some());
            }
        }

        /// Property 3: without predictions, items above 20 units never alert
        #[test]
        fn prop_well_stocked_silent(quantities in prop::collection::vec(21u32..500, 1..10)) {
            let snapshots: Vec<_> = quantities
                .into_iter()
                .enumerate()
                .map(|(i, q)| snapshot(i, q))
                .collect();
            let alerts = reconcile(&snapshots, &PredictionSource::Parsed(vec![]));
            prop_assert!(alerts.is_empty());
        }

        /// Property 4: identical inputs give identical output
        #[test]
        fn prop_reconcile_idempotent((snapshots, source) in scenario_strategy()) {
            prop_assert_eq!(reconcile(&snapshots, &source), reconcile(&snapshots, &source));
        }
    }
}

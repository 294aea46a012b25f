//! Merging external predictions with the classifier baseline

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use super::classifier::{classify, requires_alert, RiskTier};
use super::prediction::{PredictionSource, RawPrediction};
use crate::models::InventorySnapshot;

/// A stock alert for one inventory record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockAlert {
    pub product_name: String,
    pub company_name: String,
    pub current_quantity: u32,
    pub days_until_stockout: Option<u32>,
    pub message: String,
    pub risk_tier: RiskTier,
}

/// Classifier-derived alert for a snapshot
pub fn baseline_alert(snapshot: &InventorySnapshot) -> StockAlert {
    let assessment = classify(snapshot.quantity);
    StockAlert {
        product_name: snapshot.product_name.clone(),
        company_name: snapshot.company_name.clone(),
        current_quantity: snapshot.quantity,
        days_until_stockout: assessment.days_until_stockout,
        message: assessment.message(&snapshot.product_name, snapshot.quantity),
        risk_tier: assessment.tier,
    }
}

/// Baseline alerts for every low-stock snapshot, in snapshot order
pub fn baseline_alerts(snapshots: &[InventorySnapshot]) -> Vec<StockAlert> {
    snapshots
        .iter()
        .filter(|s| requires_alert(s.quantity))
        .map(baseline_alert)
        .collect()
}

fn match_key(product_name: &str, company_name: &str) -> (String, String) {
    (
        product_name.trim().to_lowercase(),
        company_name.trim().to_lowercase(),
    )
}

/// Merge external predictions into the baseline.
///
/// Predictions are matched to snapshots by product and company name. Each
/// snapshot is consumed by at most one prediction; predictions left without
/// a snapshot are dropped. The snapshot quantity always wins over the
/// quantity the prediction claims.
///
/// Every snapshot at or below the low-stock threshold yields exactly one
/// alert with a tier above NONE and a day estimate. Snapshots above the
/// threshold only appear when the prediction gives both a tier above NONE
/// and a day estimate. Output follows prediction order, then unmatched
/// low-stock snapshots in snapshot order.
pub fn reconcile(snapshots: &[InventorySnapshot], source: &PredictionSource) -> Vec<StockAlert> {
    let predictions = match source {
        PredictionSource::Parsed(predictions) => predictions,
        PredictionSource::Malformed { .. } | PredictionSource::Unavailable(_) => {
            return baseline_alerts(snapshots)
        }
    };

    let mut pending: HashMap<(String, String), VecDeque<usize>> = HashMap::new();
    for (index, snapshot) in snapshots.iter().enumerate() {
        pending
            .entry(match_key(&snapshot.product_name, &snapshot.company_name))
            .or_default()
            .push_back(index);
    }

    let mut consumed = vec![false; snapshots.len()];
    let mut alerts = Vec::new();

    for prediction in predictions {
        let key = match_key(&prediction.product_name, &prediction.company_name);
        let Some(index) = pending.get_mut(&key).and_then(VecDeque::pop_front) else {
            tracing::debug!(
                product = %prediction.product_name,
                company = %prediction.company_name,
                "Dropping prediction with no matching inventory record"
            );
            continue;
        };
        consumed[index] = true;

        if let Some(alert) = resolve(&snapshots[index], prediction) {
            alerts.push(alert);
        }
    }

    alerts.extend(
        snapshots
            .iter()
            .zip(&consumed)
            .filter(|(snapshot, consumed)| !**consumed && requires_alert(snapshot.quantity))
            .map(|(snapshot, _)| baseline_alert(snapshot)),
    );

    alerts
}

fn resolve(snapshot: &InventorySnapshot, prediction: &RawPrediction) -> Option<StockAlert> {
    let claimed = match (prediction.tier(), prediction.days_until_stockout) {
        (Some(tier), Some(days)) if tier != RiskTier::None => Some((tier, days)),
        _ => None,
    };

    match claimed {
        Some((tier, days)) => Some(StockAlert {
            product_name: snapshot.product_name.clone(),
            company_name: snapshot.company_name.clone(),
            current_quantity: snapshot.quantity,
            days_until_stockout: Some(days),
            message: prediction
                .message
                .as_deref()
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| {
                    format!(
                        "Product {} will run out of stock in {} days.",
                        snapshot.product_name, days
                    )
                }),
            risk_tier: tier,
        }),
        None if requires_alert(snapshot.quantity) => Some(baseline_alert(snapshot)),
        None => None,
    }
}

//! Quantity-based stock risk classification

use serde::{Deserialize, Serialize};

/// Items at or below this quantity must always carry an alert
pub const LOW_STOCK_THRESHOLD: u32 = 10;

/// Fixed estimate used for the LOW tier (11-20 units)
pub const LOW_TIER_DAYS: u32 = 12;

/// Severity of an impending stockout, ordered NONE < LOW < MEDIUM < HIGH
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskTier {
    None,
    Low,
    Medium,
    High,
}

impl RiskTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTier::None => "NONE",
            RiskTier::Low => "LOW",
            RiskTier::Medium => "MEDIUM",
            RiskTier::High => "HIGH",
        }
    }

    /// Parse a tier label in either English or Spanish, ignoring case
    /// and surrounding whitespace.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_uppercase().as_str() {
            "NONE" | "NINGUNO" => Some(RiskTier::None),
            "LOW" | "BAJO" => Some(RiskTier::Low),
            "MEDIUM" | "MEDIO" => Some(RiskTier::Medium),
            "HIGH" | "ALTO" => Some(RiskTier::High),
            _ => None,
        }
    }
}

impl std::fmt::Display for RiskTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named stock condition behind a classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockCondition {
    /// 0 units
    OutOfStock,
    /// 1-3 units
    Critical,
    /// 4-5 units
    VeryLow,
    /// 6-10 units
    Low,
    /// 11-20 units
    Watch,
    /// more than 20 units
    Healthy,
}

/// Result of classifying a single quantity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RiskAssessment {
    pub tier: RiskTier,
    pub days_until_stockout: Option<u32>,
    pub condition: StockCondition,
}

impl RiskAssessment {
    /// Human-readable alert message for a product at the given quantity
    pub fn message(&self, product_name: &str, quantity: u32) -> String {
        match self.condition {
            StockCondition::OutOfStock => format!(
                "Product {} is OUT OF STOCK. Urgent restock required.",
                product_name
            ),
            StockCondition::Critical => format!(
                "Product {} has CRITICAL stock ({} units). Stockout is imminent.",
                product_name, quantity
            ),
            StockCondition::VeryLow => format!(
                "Product {} has VERY LOW stock ({} units). Stockout expected in about 3 days.",
                product_name, quantity
            ),
            StockCondition::Low => format!(
                "Product {} has LOW stock ({} units). Stockout expected in about 7 days.",
                product_name, quantity
            ),
            StockCondition::Watch => format!(
                "Product {} has {} units left. Stockout expected in about {} days.",
                product_name, quantity, LOW_TIER_DAYS
            ),
            StockCondition::Healthy => {
                format!("Product {} has sufficient stock ({} units).", product_name, quantity)
            }
        }
    }
}

/// Classify a quantity. First matching band wins.
pub fn classify(quantity: u32) -> RiskAssessment {
    let (tier, days, condition) = match quantity {
        0 => (RiskTier::High, Some(0), StockCondition::OutOfStock),
        1..=3 => (RiskTier::High, Some(1), StockCondition::Critical),
        4..=5 => (RiskTier::High, Some(3), StockCondition::VeryLow),
        6..=10 => (RiskTier::Medium, Some(7), StockCondition::Low),
        11..=20 => (RiskTier::Low, Some(LOW_TIER_DAYS), StockCondition::Watch),
        _ => (RiskTier::None, None, StockCondition::Healthy),
    };

    RiskAssessment {
        tier,
        days_until_stockout: days,
        condition,
    }
}

/// Whether an item must always be present in the alert list
pub fn requires_alert(quantity: u32) -> bool {
    quantity <= LOW_STOCK_THRESHOLD
}

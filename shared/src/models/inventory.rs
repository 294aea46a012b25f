//! Inventory models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Stock held by a company for one product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub id: Uuid,
    pub company_nit: String,
    pub product_id: Uuid,
    pub quantity: i32,
    pub ingress_date: DateTime<Utc>,
    pub last_update_date: DateTime<Utc>,
    /// `0x`-prefixed SHA-256 of the last recorded transaction
    pub transaction_hash: Option<String>,
}

/// Inventory record joined with its product and company
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryDetail {
    pub id: Uuid,
    pub company_nit: String,
    pub company_name: String,
    pub product_id: Uuid,
    pub product_code: String,
    pub product_name: String,
    pub price_usd: Decimal,
    pub price_eur: Decimal,
    pub price_cop: Decimal,
    pub quantity: i32,
    pub ingress_date: DateTime<Utc>,
    pub last_update_date: DateTime<Utc>,
    pub transaction_hash: Option<String>,
}

impl InventoryDetail {
    /// Read-only view used by the stock-risk policy
    pub fn snapshot(&self) -> InventorySnapshot {
        InventorySnapshot {
            product_name: self.product_name.clone(),
            product_code: self.product_code.clone(),
            quantity: u32::try_from(self.quantity).unwrap_or(0),
            company_name: self.company_name.clone(),
            company_nit: self.company_nit.clone(),
            ingress_date: self.ingress_date,
            last_update_date: self.last_update_date,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateInventoryInput {
    #[validate(custom = "crate::validation::validate_nit_field")]
    pub company_nit: String,
    pub product_id: Uuid,
    #[validate(range(min = 0))]
    pub quantity: i32,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateInventoryInput {
    #[validate(range(min = 0))]
    pub quantity: i32,
}

/// Point-in-time view of one inventory record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventorySnapshot {
    pub product_name: String,
    pub product_code: String,
    pub quantity: u32,
    pub company_name: String,
    pub company_nit: String,
    pub ingress_date: DateTime<Utc>,
    pub last_update_date: DateTime<Utc>,
}

/// Totals across the visible inventory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InventoryTotals {
    pub companies: usize,
    pub products: usize,
    pub units: i64,
    pub value_usd: Decimal,
    pub value_eur: Decimal,
    pub value_cop: Decimal,
}

impl InventoryTotals {
    /// Sum units and stock value over joined inventory rows
    pub fn accumulate(companies: usize, products: usize, rows: &[InventoryDetail]) -> Self {
        rows.iter().fold(
            Self {
                companies,
                products,
                ..Self::default()
            },
            |mut totals, row| {
                let quantity = Decimal::from(row.quantity);
                totals.units += i64::from(row.quantity);
                totals.value_usd += row.price_usd * quantity;
                totals.value_eur += row.price_eur * quantity;
                totals.value_cop += row.price_cop * quantity;
                totals
            },
        )
    }
}

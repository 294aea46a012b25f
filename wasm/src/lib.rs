//! WebAssembly module for the Inventory Management Platform
//!
//! Provides client-side computation for:
//! - Stock risk classification
//! - Currency conversion with known rates
//! - Company NIT validation

use rust_decimal::Decimal;
use serde::Serialize;
use wasm_bindgen::prelude::*;

pub use shared::risk::{classify, RiskTier};
pub use shared::{convert_usd, validate_nit, ConvertedAmount, ExchangeRates};

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    web_sys::console::debug_1(&JsValue::from_str("inventory-wasm loaded"));
}

#[derive(Serialize)]
struct StockRiskView {
    tier: RiskTier,
    days_until_stockout: Option<u32>,
    message: String,
}

fn stock_risk_json(product_name: &str, quantity: u32) -> String {
    let assessment = classify(quantity);
    let view = StockRiskView {
        tier: assessment.tier,
        days_until_stockout: assessment.days_until_stockout,
        message: assessment.message(product_name, quantity),
    };
    serde_json::to_string(&view).unwrap_or_else(|_| "{}".to_string())
}

fn convert_json(amount: f64, eur_rate: f64, cop_rate: f64) -> Result<String, String> {
    let to_decimal = |value: f64, name: &str| {
        Decimal::try_from(value)
            .ok()
            .filter(|d| !d.is_sign_negative() || d.is_zero())
            .ok_or_else(|| format!("Invalid {}: {}", name, value))
    };

    let amount = to_decimal(amount, "amount")?;
    let rates = ExchangeRates {
        eur: to_decimal(eur_rate, "EUR rate")?,
        cop: to_decimal(cop_rate, "COP rate")?,
    };
    serde_json::to_string(&convert_usd(amount, &rates)).map_err(|e| e.to_string())
}

fn parse_json(json: &str) -> Result<JsValue, JsValue> {
    js_sys::JSON::parse(json)
}

/// Classify the stock risk of a product: `{tier, days_until_stockout, message}`
#[wasm_bindgen]
pub fn classify_stock_risk(product_name: &str, quantity: u32) -> Result<JsValue, JsValue> {
    parse_json(&stock_risk_json(product_name, quantity))
}

/// Convert a USD amount with the given rates: `{usd, eur, cop}`
#[wasm_bindgen]
pub fn convert_usd_amount(amount: f64, eur_rate: f64, cop_rate: f64) -> Result<JsValue, JsValue> {
    let json = convert_json(amount, eur_rate, cop_rate).map_err(|e| JsValue::from_str(&e))?;
    parse_json(&json)
}

/// Check a company NIT (9 to 15 digits)
#[wasm_bindgen]
pub fn validate_company_nit(nit: &str) -> bool {
    validate_nit(nit).is_ok()
}

//! Product catalogue models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::currency::{convert_usd, ExchangeRates};

/// A product sold by a company, priced in USD, EUR and COP
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub features: String,
    pub price_usd: Decimal,
    pub price_eur: Decimal,
    pub price_cop: Decimal,
    pub company_nit: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a product. EUR/COP prices are derived from the USD
/// price when rates are available, so the client-supplied values are only
/// kept as a starting point.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateProductInput {
    #[validate(length(min = 1, max = 50))]
    pub code: String,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(min = 1))]
    pub features: String,
    #[validate(custom = "crate::validation::validate_non_negative_amount")]
    pub price_usd: Decimal,
    #[validate(custom = "crate::validation::validate_non_negative_amount")]
    pub price_eur: Option<Decimal>,
    #[validate(custom = "crate::validation::validate_non_negative_amount")]
    pub price_cop: Option<Decimal>,
    #[validate(custom = "crate::validation::validate_nit_field")]
    pub company_nit: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateProductInput {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(length(min = 1))]
    pub features: Option<String>,
    #[validate(custom = "crate::validation::validate_non_negative_amount")]
    pub price_usd: Option<Decimal>,
    #[validate(custom = "crate::validation::validate_non_negative_amount")]
    pub price_eur: Option<Decimal>,
    #[validate(custom = "crate::validation::validate_non_negative_amount")]
    pub price_cop: Option<Decimal>,
}

/// The three prices stored on a product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProductPrices {
    pub usd: Decimal,
    pub eur: Decimal,
    pub cop: Decimal,
}

impl ProductPrices {
    /// Derive EUR/COP prices from the USD price
    pub fn from_usd(price_usd: Decimal, rates: &ExchangeRates) -> Self {
        let converted = convert_usd(price_usd, rates);
        Self {
            usd: price_usd,
            eur: converted.eur,
            cop: converted.cop,
        }
    }
}

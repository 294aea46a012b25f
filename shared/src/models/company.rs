//! Company models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A tenant company, keyed by its NIT
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    pub nit: String,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for registering a company
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCompanyInput {
    #[validate(custom = "crate::validation::validate_nit_field")]
    pub nit: String,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(min = 1))]
    pub address: String,
    #[validate(length(min = 1, max = 20))]
    pub phone: String,
}

/// Input for updating a company; the NIT is immutable
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateCompanyInput {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(length(min = 1))]
    pub address: Option<String>,
    #[validate(length(min = 1, max = 20))]
    pub phone: Option<String>,
}

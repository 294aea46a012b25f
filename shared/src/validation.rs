//! Validation utilities for the Inventory Management Platform
//!
//! Includes the Colombian NIT rule used to key companies, plus the custom
//! rules plugged into `validator` derives on the input models.

use rust_decimal::Decimal;
use validator::ValidationError;

pub const NIT_MIN_DIGITS: usize = 9;
pub const NIT_MAX_DIGITS: usize = 15;

// ============================================================================
// Company Validations
// ============================================================================

/// Validate NIT format: 9 to 15 ASCII digits, nothing else
pub fn validate_nit(nit: &str) -> Result<(), &'static str> {
    if nit.is_empty() {
        return Err("NIT is required");
    }
    if !nit.chars().all(|c| c.is_ascii_digit()) {
        return Err("NIT must contain only digits");
    }
    if nit.len() < NIT_MIN_DIGITS || nit.len() > NIT_MAX_DIGITS {
        return Err("NIT must be between 9 and 15 digits");
    }
    Ok(())
}

/// `validator` adapter for [`validate_nit`]
pub fn validate_nit_field(nit: &str) -> Result<(), ValidationError> {
    validate_nit(nit).map_err(|msg| {
        let mut err = ValidationError::new("nit");
        err.message = Some(msg.into());
        err
    })
}

// ============================================================================
// Amount Validations
// ============================================================================

pub fn validate_non_negative_amount(amount: &Decimal) -> Result<(), ValidationError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        let mut err = ValidationError::new("non_negative");
        err.message = Some("Amount cannot be negative".into());
        return Err(err);
    }
    Ok(())
}

// ============================================================================
// General Validations
// ============================================================================

/// Validate email format (basic check)
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    let Some((local, domain)) = email.split_once('@') else {
        return Err("Invalid email format");
    };
    if local.is_empty() || !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return Err("Invalid email format");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nit_accepts_nine_to_fifteen_digits() {
        assert!(validate_nit("900123456").is_ok());
        assert!(validate_nit("900123456789012").is_ok());
    }

    #[test]
    fn nit_rejects_bad_input() {
        assert!(validate_nit("").is_err());
        assert!(validate_nit("12345678").is_err());
        assert!(validate_nit("9001234567890123").is_err());
        assert!(validate_nit("900-123-456").is_err());
    }

    #[test]
    fn negative_amounts_are_rejected() {
        assert!(validate_non_negative_amount(&Decimal::new(-1, 2)).is_err());
        assert!(validate_non_negative_amount(&Decimal::ZERO).is_ok());
        assert!(validate_non_negative_amount(&Decimal::new(1999, 2)).is_ok());
    }

    #[test]
    fn email_shapes() {
        assert!(validate_email("admin@example.com").is_ok());
        assert!(validate_email("admin@localhost").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("admin.example.com").is_err());
    }

    #[test]
    fn company_input_checks_nit() {
        use crate::CreateCompanyInput;
        use validator::Validate;

        let mut input = CreateCompanyInput {
            nit: "900123456".to_string(),
            name: "Acme SAS".to_string(),
            address: "Calle 1 # 2-3".to_string(),
            phone: "3001234567".to_string(),
        };
        assert!(input.validate().is_ok());

        input.nit = "9001".to_string();
        let errors = input.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("nit"));
    }
}

// src/validator.rs - Centralized validation module
use std::collections::BTreeMap;
use serde::Serialize;
use regex::Regex;
use lazy_static::lazy_static;
use chrono::NaiveDate;
use validator::Validate;
use crate::error::{ApiError, ApiResult};
use crate::models::*;

lazy_static! {
    static ref CONTACT_REGEX: Regex = Regex::new(r"^\+?[0-9][0-9 ()\-]{2,19}$").unwrap();
}

// ==================== VALIDATION RESULT ====================

#[derive(Debug, Default, Serialize)]
pub struct ValidationResult {
    pub errors: BTreeMap<String, Vec<String>>,
    pub warnings: BTreeMap<String, Vec<String>>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    pub fn merge(&mut self, other: ValidationResult) {
        for (field, errors) in other.errors {
            self.errors.entry(field).or_default().extend(errors);
        }
        for (field, warnings) in other.warnings {
            self.warnings.entry(field).or_default().extend(warnings);
        }
    }

    pub fn to_api_error(&self) -> ApiError {
        let message = self.errors
            .iter()
            .map(|(field, errors)| format!("{}: {}", field, errors.join(", ")))
            .collect::<Vec<_>>()
            .join("; ");

        ApiError::ValidationError(message)
    }
}

// ==================== FIELD VALIDATORS ====================

pub struct FieldValidator;

impl FieldValidator {
    pub fn not_blank(value: &str, field: &str) -> Result<(), String> {
        if value.trim().is_empty() {
            Err(format!("{} cannot be blank", field))
        } else {
            Ok(())
        }
    }

    pub fn contact(value: &str) -> Result<(), String> {
        if CONTACT_REGEX.is_match(value.trim()) {
            Ok(())
        } else {
            Err("Invalid contact number (digits, spaces, '+', '-', parentheses; 3-20 characters)".to_string())
        }
    }

    pub fn expiry_date(value: NaiveDate, today: NaiveDate, warn_days: i64) -> ValidationResult {
        let mut result = ValidationResult::new();
        let days_until = (value - today).num_days();

        if days_until < 0 {
            result.add_warning("expiry_date", format!("Batch expired {} days ago", -days_until));
        } else if days_until <= warn_days {
            result.add_warning("expiry_date", format!("Expires in {} days", days_until));
        }

        result
    }
}

// ==================== CUSTOM VALIDATION ====================

pub trait CustomValidate {
    fn custom_validate(&self) -> ValidationResult;
}

impl CustomValidate for CreateMedicineRequest {
    fn custom_validate(&self) -> ValidationResult {
        let mut result = ValidationResult::new();

        for (field, value) in [
            ("med_name", &self.med_name),
            ("brand", &self.brand),
            ("category", &self.category),
            ("type", &self.med_type),
        ] {
            if let Err(e) = FieldValidator::not_blank(value, field) {
                result.add_error(field, e);
            }
        }

        result
    }
}

impl CustomValidate for CreateStockRequest {
    fn custom_validate(&self) -> ValidationResult {
        let mut result = ValidationResult::new();

        if let Err(e) = FieldValidator::not_blank(&self.med_name, "med_name") {
            result.add_error("med_name", e);
        }

        let today = chrono::Local::now().date_naive();
        result.merge(FieldValidator::expiry_date(self.expiry_date, today, 30));

        result
    }
}

impl CustomValidate for CreateSaleRequest {
    fn custom_validate(&self) -> ValidationResult {
        let mut result = ValidationResult::new();

        if let Err(e) = FieldValidator::not_blank(&self.customer_name, "customer_name") {
            result.add_error("customer_name", e);
        }
        if let Err(e) = FieldValidator::contact(&self.customer_contact) {
            result.add_error("customer_contact", e);
        }

        result
    }
}

impl CustomValidate for BulkSaleRequest {
    fn custom_validate(&self) -> ValidationResult {
        let mut result = ValidationResult::new();

        if let Err(e) = FieldValidator::not_blank(&self.customer_name, "customer_name") {
            result.add_error("customer_name", e);
        }
        if let Err(e) = FieldValidator::contact(&self.customer_contact) {
            result.add_error("customer_contact", e);
        }
        for (idx, item) in self.sales.iter().enumerate() {
            if let Err(e) = FieldValidator::not_blank(&item.med_name, "med_name") {
                result.add_error(format!("sales[{}].med_name", idx), e);
            }
        }

        result
    }
}

/// Runs the derived field rules, then the custom rules. Warnings are logged, errors rejected.
pub fn validate_request<T: Validate + CustomValidate>(request: &T) -> ApiResult<()> {
    request.validate()?;

    let custom = request.custom_validate();
    for (field, warnings) in &custom.warnings {
        log::warn!("{}: {}", field, warnings.join(", "));
    }
    if !custom.is_valid() {
        return Err(custom.to_api_error());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sale_request() -> CreateSaleRequest {
        CreateSaleRequest {
            batch_id: 1,
            med_name: "Amoxicillin".to_string(),
            customer_name: "R. Sharma".to_string(),
            customer_contact: "+91 98765-43210".to_string(),
            quantity: 2,
            unit_sell_price: 12.5,
        }
    }

    #[test]
    fn test_contact_format() {
        assert!(FieldValidator::contact("9876543210").is_ok());
        assert!(FieldValidator::contact("+1 (555) 010-9999").is_ok());
        assert!(FieldValidator::contact("call me").is_err());
        assert!(FieldValidator::contact("12").is_err());
    }

    #[test]
    fn test_valid_sale_request_passes() {
        assert!(validate_request(&sale_request()).is_ok());
    }

    #[test]
    fn test_zero_quantity_names_field() {
        let mut request = sale_request();
        request.quantity = 0;
        let err = validate_request(&request).unwrap_err();
        assert!(matches!(err, ApiError::ValidationError(ref msg) if msg.contains("quantity")));
    }

    #[test]
    fn test_bulk_line_errors_are_indexed() {
        let request = BulkSaleRequest {
            customer_name: "R. Sharma".to_string(),
            customer_contact: "9876543210".to_string(),
            sales: vec![
                BulkSaleItem { batch_id: 1, med_name: "Amoxicillin".to_string(), quantity: 1, unit_sell_price: 5.0 },
                BulkSaleItem { batch_id: 2, med_name: "   ".to_string(), quantity: 1, unit_sell_price: 5.0 },
            ],
        };
        let result = request.custom_validate();
        assert!(!result.is_valid());
        assert!(result.errors.contains_key("sales[1].med_name"));
    }

    #[test]
    fn test_empty_bulk_rejected() {
        let request = BulkSaleRequest {
            customer_name: "R. Sharma".to_string(),
            customer_contact: "9876543210".to_string(),
            sales: vec![],
        };
        let err = validate_request(&request).unwrap_err();
        assert!(matches!(err, ApiError::ValidationError(ref msg) if msg.contains("sales")));
    }

    #[test]
    fn test_expiry_warnings() {
        let today = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let soon = FieldValidator::expiry_date(NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(), today, 30);
        assert!(soon.is_valid());
        assert!(soon.warnings.contains_key("expiry_date"));

        let far = FieldValidator::expiry_date(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(), today, 30);
        assert!(far.warnings.is_empty());
    }
}

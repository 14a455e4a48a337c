//! Input validation for receipts arriving over HTTP.
//!
//! Rendering itself tolerates missing optional fields; these checks only
//! reject receipts whose structure cannot describe a sale.

use std::fmt;

use super::models::Receipt;

/// Trait for validating request objects.
pub trait Validator {
    /// Validate the state of the object.
    fn validate(&self) -> Result<(), String>;
}

/// Validation error with a field path and an optional hint.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn not_positive(field: &str, label: &str) -> Self {
        Self::new(field, format!("{} must be greater than zero", label))
    }

    pub fn negative_amount(field: &str, label: &str) -> Self {
        Self::new(field, format!("{} must not be negative", label))
            .with_suggestion("Amounts are computed upstream; re-check the receipt totals")
    }

    pub fn invalid_date(field: &str, value: &str) -> Self {
        Self::new(field, format!("Date '{}' is not ISO-8601", value))
            .with_suggestion("Use YYYY-MM-DD or an RFC 3339 timestamp, e.g. 2026-10-19")
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.field, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, ". {}", suggestion)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Default)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    pub fn add(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// One numbered line per error.
    pub fn to_message(&self) -> String {
        if self.errors.is_empty() {
            return String::new();
        }

        let mut parts = vec![format!(
            "Validation failed: {} error(s) found",
            self.errors.len()
        )];
        for (i, error) in self.errors.iter().enumerate() {
            parts.push(format!("{}. {}", i + 1, error));
        }
        parts.join("\n")
    }

    pub fn into_result(self) -> Result<(), String> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self.to_message())
        }
    }
}

pub fn validate_positive_id(value: i64, field: &str, label: &str, errors: &mut ValidationErrors) {
    if value <= 0 {
        errors.add(ValidationError::not_positive(field, label));
    }
}

pub fn validate_non_negative(value: f64, field: &str, label: &str, errors: &mut ValidationErrors) {
    if !value.is_finite() || value < 0.0 {
        errors.add(ValidationError::negative_amount(field, label));
    }
}

pub fn validate_iso_date(value: &str, field: &str, errors: &mut ValidationErrors) {
    if crate::pdf::format::parse_purchase_date(value).is_none() {
        errors.add(ValidationError::invalid_date(field, value));
    }
}

impl Validator for Receipt {
    fn validate(&self) -> Result<(), String> {
        let mut errors = ValidationErrors::new();

        validate_positive_id(self.receipt_id, "receipt_id", "Receipt id", &mut errors);
        validate_positive_id(self.customer_id, "customer_id", "Customer id", &mut errors);
        validate_iso_date(&self.date_purchased, "date_purchased", &mut errors);
        validate_non_negative(self.subtotal_excl_tax, "subtotal_excl_tax", "Subtotal", &mut errors);
        validate_non_negative(self.tax_amount, "tax_amount", "Tax amount", &mut errors);
        validate_non_negative(self.total_incl_tax, "total_incl_tax", "Total", &mut errors);

        for (i, item) in self.line_items.iter().enumerate() {
            if item.quantity == 0 {
                errors.add(ValidationError::not_positive(
                    &format!("line_items[{}].quantity", i),
                    "Quantity",
                ));
            }
            validate_non_negative(
                item.unit_price,
                &format!("line_items[{}].unit_price", i),
                "Unit price",
                &mut errors,
            );
        }

        errors.into_result()
    }
}

use bakery_receipts::receipt::validation::{
    validate_iso_date, validate_non_negative, validate_positive_id, ValidationError, ValidationErrors,
};

#[test]
fn test_validate_positive_id_zero() {
    let mut errors = ValidationErrors::new();
    validate_positive_id(0, "receipt_id", "Receipt id", &mut errors);
    assert_eq!(errors.len(), 1);
    assert!(errors.to_message().contains("Receipt id must be greater than zero"));
}

#[test]
fn test_validate_non_negative_rejects_nan() {
    let mut errors = ValidationErrors::new();
    validate_non_negative(f64::NAN, "tax_amount", "Tax amount", &mut errors);
    validate_non_negative(0.0, "subtotal_excl_tax", "Subtotal", &mut errors);
    assert_eq!(errors.len(), 1);
}

#[test]
fn test_validate_iso_date_accepts_timestamps() {
    let mut errors = ValidationErrors::new();
    validate_iso_date("2026-10-19", "date_purchased", &mut errors);
    validate_iso_date("2026-10-19T08:15:00+10:00", "date_purchased", &mut errors);
    assert!(errors.is_empty());

    validate_iso_date("19/10/2026", "date_purchased", &mut errors);
    assert_eq!(errors.len(), 1);
}

#[test]
fn test_validation_errors_message() {
    let mut errors = ValidationErrors::new();
    errors.add(ValidationError::not_positive("customer_id", "Customer id"));
    errors.add(ValidationError::invalid_date("date_purchased", "soon"));

    let msg = errors.to_message();
    assert!(msg.starts_with("Validation failed: 2 error(s) found"));
    assert!(msg.contains("1. [customer_id] Customer id must be greater than zero"));
    assert!(msg.contains("2. [date_purchased] Date 'soon' is not ISO-8601"));
    assert!(msg.contains("YYYY-MM-DD"));
}

//! Plausibility checks on owner ids and extracted measurements.
//!
//! The processor uses these to refuse a blank owner and to flag implausible
//! numbers in the log while keeping the record faithful to what the user
//! wrote. The REPL checks input text up front.

use std::ops::RangeInclusive;

use chrono::NaiveDate;

/// Plausible body weight, in kilograms.
pub const WEIGHT_RANGE_KG: RangeInclusive<f64> = 20.0..=300.0;

/// Plausible body-fat percentage.
pub const BODY_FAT_RANGE: RangeInclusive<f64> = 3.0..=60.0;

/// Result of a validation check.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
}

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationResult {
    fn from_errors(errors: Vec<ValidationError>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }

    /// All messages joined with `"; "`.
    pub fn error_message(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

fn error(field: &str, message: impl Into<String>) -> ValidationError {
    ValidationError {
        field: field.into(),
        message: message.into(),
    }
}

/// Owner ids must not be blank.
pub fn validate_owner_id(owner_id: &str) -> ValidationResult {
    let mut errors = Vec::new();
    if owner_id.trim().is_empty() {
        errors.push(error("owner_id", "Owner ID is required"));
    }
    ValidationResult::from_errors(errors)
}

/// Message must carry some text and fit the length limit (UTF-16 units).
pub fn validate_message(message: &str, max_length: usize) -> ValidationResult {
    let mut errors = Vec::new();
    let length = message.encode_utf16().count();
    if message.trim().is_empty() {
        errors.push(error("message", "Message is required"));
    } else if length > max_length {
        errors.push(error(
            "message",
            format!("Message cannot exceed {max_length} characters (current: {length})"),
        ));
    }
    ValidationResult::from_errors(errors)
}

/// Weight is optional; when present it must be finite and plausible.
pub fn validate_weight(weight: Option<f64>) -> ValidationResult {
    validate_measurement("weight", weight, &WEIGHT_RANGE_KG, "kg")
}

/// Body fat is optional; when present it must be finite and plausible.
pub fn validate_body_fat(body_fat: Option<f64>) -> ValidationResult {
    validate_measurement("body_fat_percentage", body_fat, &BODY_FAT_RANGE, "%")
}

fn validate_measurement(
    field: &str,
    value: Option<f64>,
    range: &RangeInclusive<f64>,
    unit: &str,
) -> ValidationResult {
    let Some(value) = value else {
        return ValidationResult::from_errors(Vec::new());
    };

    let mut errors = Vec::new();
    if !value.is_finite() {
        errors.push(error(field, format!("{field} must be a valid number")));
    } else if value < *range.start() {
        errors.push(error(
            field,
            format!("{field} must be at least {:.1}{unit}", range.start()),
        ));
    } else if value > *range.end() {
        errors.push(error(
            field,
            format!("{field} cannot exceed {:.1}{unit}", range.end()),
        ));
    }
    ValidationResult::from_errors(errors)
}

/// ISO calendar date (`YYYY-MM-DD`) that actually exists.
pub fn validate_date_string(date: &str) -> ValidationResult {
    let mut errors = Vec::new();
    let trimmed = date.trim();
    if trimmed.is_empty() {
        errors.push(error("date", "Date is required"));
    } else if NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").is_err() || trimmed.len() != 10 {
        errors.push(error("date", "Date must be in ISO format (YYYY-MM-DD)"));
    }
    ValidationResult::from_errors(errors)
}

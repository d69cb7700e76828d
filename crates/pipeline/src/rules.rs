//! Reusable validation rules. Each returns `None` when the value passes.

use chrono::{DateTime, Utc};

use crate::validate::FieldError;

/// The value must be present and non-blank.
pub fn required(field: &str, value: &str) -> Option<FieldError> {
    if value.trim().is_empty() {
        Some(FieldError::new(field, format!("{field} is required")))
    } else {
        None
    }
}

pub fn max_len(field: &str, value: &str, max: usize) -> Option<FieldError> {
    if value.chars().count() > max {
        Some(FieldError::new(
            field,
            format!("{field} must be at most {max} characters"),
        ))
    } else {
        None
    }
}

pub fn positive(field: &str, value: i64) -> Option<FieldError> {
    if value <= 0 {
        Some(FieldError::new(
            field,
            format!("{field} must be greater than zero"),
        ))
    } else {
        None
    }
}

pub fn less_than(field: &str, value: i64, limit: i64) -> Option<FieldError> {
    if value >= limit {
        Some(FieldError::new(
            field,
            format!("{field} must be less than {limit}"),
        ))
    } else {
        None
    }
}

/// Timestamps recorded by hand must not lie in the future.
pub fn not_future(field: &str, value: DateTime<Utc>, now: DateTime<Utc>) -> Option<FieldError> {
    if value > now {
        Some(FieldError::new(
            field,
            format!("{field} must not be in the future"),
        ))
    } else {
        None
    }
}

pub fn min_len(field: &str, value: &str, min: usize) -> Option<FieldError> {
    if value.chars().count() < min {
        Some(FieldError::new(
            field,
            format!("{field} must be at least {min} characters"),
        ))
    } else {
        None
    }
}

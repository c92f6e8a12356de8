//! Garde validation utilities.

use crate::domain::{DomainError, FieldError};
use garde::{Report, Validate};

/// Validate a value, reporting every failing field.
pub fn validate_struct<T>(value: &T) -> Result<(), DomainError>
where
    T: Validate,
    T::Context: Default,
{
    value
        .validate()
        .map_err(|report| DomainError::Validation(field_errors(&report)))
}

/// Flatten a garde report into `{field, error}` pairs
pub fn field_errors(report: &Report) -> Vec<FieldError> {
    report
        .iter()
        .map(|(path, error)| FieldError::new(path.to_string(), error.message().to_string()))
        .collect()
}

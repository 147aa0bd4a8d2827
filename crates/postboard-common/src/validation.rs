//! Input validation utilities.

use validator::Validate;

use crate::error::PostboardError;

/// Validate a request body, returning a PostboardError::Validation on failure.
pub fn validate_request<T: Validate>(body: &T) -> Result<(), PostboardError> {
    body.validate().map_err(|e| PostboardError::Validation {
        message: format_validation_errors(e),
    })
}

/// Format validation errors into a human-readable string.
fn format_validation_errors(errors: validator::ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value for '{field}'"))
            })
        })
        .collect();
    // field_errors() is a HashMap; keep the output stable
    messages.sort();
    messages.join("; ")
}

use std::collections::BTreeMap;

use serde::Serialize;

use crate::types::DbId;

/// Field-level validation messages, keyed by input field name.
///
/// Serializes to the `errors` object of a 422 response body, e.g.
/// `{"quantity": ["Not enough available stock"]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(pub BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message for `field`.
    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// A set containing a single message for a single field.
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.push(field, message);
        errors
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consume accumulated errors, failing with [`CoreError::Validation`]
    /// when any message was recorded.
    pub fn into_result(self) -> Result<(), CoreError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(CoreError::Validation {
                message: "Validation failed.".to_string(),
                errors: self,
            })
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("{message}")]
    Validation { message: String, errors: FieldErrors },

    /// An action was attempted from a status that does not permit it.
    #[error("Cannot {action} {entity} in status '{current}'")]
    State {
        entity: &'static str,
        action: &'static str,
        current: String,
    },

    /// Approval would over-draw the asset's available stock.
    #[error("The requested quantity exceeds the available stock: requested {requested}, available {available}")]
    InsufficientStock { requested: i32, available: i32 },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// A validation failure on a single field, with the field message also
    /// used as the response message.
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        CoreError::Validation {
            errors: FieldErrors::single(field, message.clone()),
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_errors_accumulate_per_field() {
        let mut errors = FieldErrors::new();
        errors.push("quantity", "must be at least 1");
        errors.push("quantity", "exceeds available stock");
        errors.push("loan_date", "required");
        assert_eq!(errors.0["quantity"].len(), 2);
        assert_eq!(errors.0["loan_date"].len(), 1);
    }

    #[test]
    fn empty_field_errors_produce_ok() {
        assert!(FieldErrors::new().into_result().is_ok());
    }

    #[test]
    fn non_empty_field_errors_produce_validation_error() {
        let result = FieldErrors::single("code", "already taken").into_result();
        match result {
            Err(CoreError::Validation { errors, .. }) => {
                assert_eq!(errors.0["code"], vec!["already taken".to_string()]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn state_error_names_action_and_status() {
        let err = CoreError::State {
            entity: "asset loan",
            action: "approve",
            current: "borrowed".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Cannot approve asset loan in status 'borrowed'"
        );
    }
}

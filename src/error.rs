//! Error types for schemas and messages

use thiserror::Error;

/// Result type for schema and message operations
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Schema and message errors
///
/// None of these are recoverable at the call site; every operation that fails
/// leaves the message exactly as it was before the call.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Schema not defined: {0}")]
    SchemaNotDefined(String),

    #[error("Field [{field}] is not defined on schema [{schema}]")]
    FieldNotDefined { schema: String, field: String },

    #[error("Field [{field}] is already defined on schema [{schema}]")]
    FieldAlreadyDefined { schema: String, field: String },

    #[error("Schema id [{id}] is invalid: {reason}")]
    InvalidSchemaId { id: String, reason: String },

    #[error("Invalid version: {0}")]
    InvalidVersion(String),

    #[error("Message ref [{value}] is invalid: {reason}")]
    InvalidMessageRef { value: String, reason: String },

    #[error("Field [{field}] definition is invalid: {reason}")]
    InvalidFieldDefinition { field: String, reason: String },

    #[error("Field [{field}] rejected value [{value}]: {reason}")]
    Validation {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Failed to decode [{value}] for field [{field}] to a [{type_name}]. Detail: {detail}")]
    DecodeValueFailed {
        field: String,
        type_name: &'static str,
        value: String,
        detail: String,
    },

    #[error("Message [{schema}] is frozen and cannot be modified")]
    FrozenMessageIsImmutable { schema: String },

    #[error("Required field [{field}] must be set on message [{schema}]")]
    RequiredFieldNotSet { schema: String, field: String },

    #[error("Logic error: {0}")]
    Logic(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Semver error: {0}")]
    Semver(#[from] semver::Error),
}

impl SchemaError {
    /// Build a guard failure for `field`, rendering the offending value.
    pub(crate) fn validation(
        field: &str,
        value: impl std::fmt::Debug,
        reason: impl Into<String>,
    ) -> Self {
        SchemaError::Validation {
            field: field.to_string(),
            value: format!("{:?}", value),
            reason: reason.into(),
        }
    }

    /// Build a decode failure for `field` of type `type_name`.
    pub(crate) fn decode(
        field: &str,
        type_name: &'static str,
        value: &serde_json::Value,
        detail: impl Into<String>,
    ) -> Self {
        let value = match value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        SchemaError::DecodeValueFailed {
            field: field.to_string(),
            type_name,
            value,
            detail: detail.into(),
        }
    }

    /// True when this error came from a type guard.
    pub fn is_validation(&self) -> bool {
        matches!(self, SchemaError::Validation { .. })
    }

    /// True when this error came from decoding untrusted input.
    pub fn is_decode_failure(&self) -> bool {
        matches!(self, SchemaError::DecodeValueFailed { .. })
    }
}

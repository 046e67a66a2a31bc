//! Error types for the concept graph core.

use thiserror::Error;

/// Errors raised by the entity store, relation graph and query engine.
///
/// Every variant describes bad input or a caller mistake. None of them are
/// transient, and a failed operation leaves the store unchanged.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    /// A kind was registered twice with different schemas.
    #[error("kind '{kind}' is already registered with a different schema")]
    Schema { kind: String },

    /// An operation named a kind that was never registered.
    #[error("unknown kind: {0}")]
    UnknownKind(String),

    /// Entity attributes do not match the kind's schema.
    #[error("attribute schema violation for kind '{kind}': {reason}")]
    AttributeSchema { kind: String, reason: String },

    /// No entity exists for the given reference.
    #[error("entity not found: {0}")]
    NotFound(String),

    /// A relation or annotation endpoint does not resolve to an entity.
    #[error("referential integrity violation: {0} does not exist")]
    ReferentialIntegrity(String),

    /// A numeric value fell outside its allowed range.
    #[error("{field} must be within [0.0, 1.0], got {value}")]
    ValueRange { field: &'static str, value: f64 },

    /// A text value is not one of the allowed enum members.
    #[error("invalid {field} '{value}': expected one of {allowed}")]
    InvalidEnum {
        field: &'static str,
        value: String,
        allowed: &'static str,
    },
}

impl GraphError {
    pub(crate) fn attribute(kind: &str, reason: impl Into<String>) -> Self {
        GraphError::AttributeSchema {
            kind: kind.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result alias for core operations.
pub type Result<T> = std::result::Result<T, GraphError>;

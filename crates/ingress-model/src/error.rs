//! Error types for model parsing and validation.

/// Errors produced while parsing or validating model values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// Invalid AWS account ID format.
    #[error("invalid AWS account ID: {0} (must be 12-digit numeric string)")]
    InvalidAccountId(String),

    /// The string is not a well-formed ARN.
    #[error("invalid ARN {arn:?}: {reason}")]
    InvalidArn {
        /// The rejected input.
        arn: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// A policy document could not be encoded or decoded.
    #[error("invalid policy document: {0}")]
    InvalidPolicyDocument(String),

    /// A queue attribute held a value that could not be interpreted.
    #[error("invalid value for queue attribute {name}: {value:?}")]
    InvalidQueueAttribute {
        /// Attribute name as sent on the wire.
        name: &'static str,
        /// The raw value.
        value: String,
    },

    /// A required queue attribute was missing from the provider response.
    #[error("queue attribute {0} missing from response")]
    MissingQueueAttribute(&'static str),
}

/// Convenience result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

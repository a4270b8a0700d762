//! Error types for the wsctl-proto crate.

use thiserror::Error;

/// Local validation errors. None of these ever reach the network.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtoError {
    /// A required parameter was not provided at all.
    #[error("missing required parameter '{param}' for {operation}")]
    MissingRequired {
        /// API operation name.
        operation: &'static str,
        /// Parameter name.
        param: &'static str,
    },

    /// A required parameter was provided, but as an explicit null.
    #[error("required parameter '{param}' for {operation} cannot be null")]
    NullRequired {
        /// API operation name.
        operation: &'static str,
        /// Parameter name.
        param: &'static str,
    },

    /// A value could not be parsed as the parameter's declared kind.
    #[error("invalid value for '{param}': {reason}")]
    InvalidValue {
        /// Parameter name.
        param: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// A parameter name the operation does not declare.
    #[error("unknown parameter '{param}' for {operation}")]
    UnknownParameter {
        /// API operation name.
        operation: &'static str,
        /// The name that was looked up.
        param: String,
    },

    /// The `--select` expression did not resolve.
    #[error("invalid selector '{expr}': {reason}")]
    InvalidSelector {
        /// The expression as given.
        expr: String,
        /// Why it did not resolve.
        reason: String,
    },

    /// Two flags that cannot be combined.
    #[error("conflicting flags: {0}")]
    ConflictingFlags(String),

    /// No catalog entry matches the name.
    #[error("unknown operation: {0}")]
    UnknownOperation(String),
}

impl ProtoError {
    /// Short machine-readable kind, used in structured error output.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::MissingRequired { .. } => "MissingRequired",
            Self::NullRequired { .. } => "NullRequired",
            Self::InvalidValue { .. } => "InvalidValue",
            Self::UnknownParameter { .. } => "UnknownParameter",
            Self::InvalidSelector { .. } => "InvalidSelector",
            Self::ConflictingFlags(_) => "ConflictingFlags",
            Self::UnknownOperation(_) => "UnknownOperation",
        }
    }
}

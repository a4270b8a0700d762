//! CLI error types.

use std::time::Duration;

use thiserror::Error;
use wsctl_proto::ProtoError;

/// Failures of a remote call. Captured per call or page and never retried.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The service answered with an error.
    #[error("{code}: {message}")]
    Service {
        /// Exception name, e.g. `ResourceNotFoundException`.
        code: String,
        /// Service-provided message.
        message: String,
        /// HTTP status.
        status: u16,
        /// `x-amzn-requestid`, when present.
        request_id: Option<String>,
    },

    /// The endpoint host name did not resolve.
    #[error(
        "name resolution failure attempting to reach {endpoint} in region '{region}' \
         (check the region given with --region or configured as the default)"
    )]
    NameResolution {
        /// Region the endpoint was derived from.
        region: String,
        /// Endpoint that failed to resolve.
        endpoint: String,
    },

    /// No response within the request timeout.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Connection-level failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// Credentials could not be resolved.
    #[error("credentials error: {0}")]
    Credentials(String),

    /// The request could not be signed.
    #[error("signing error: {0}")]
    Signing(String),

    /// The request body could not be encoded.
    #[error("could not encode request: {0}")]
    Encode(String),

    /// The response body was not the expected JSON.
    #[error("could not decode response: {0}")]
    Decode(String),

    /// A listing operation returned the token it was just given.
    #[error("pagination stalled: service returned continuation token '{0}' again")]
    PaginationStalled(String),
}

impl RemoteError {
    /// Short machine-readable kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Service { .. } => "ServiceError",
            Self::NameResolution { .. } => "NameResolution",
            Self::Timeout(_) => "Timeout",
            Self::Transport(_) => "Transport",
            Self::Credentials(_) => "Credentials",
            Self::Signing(_) => "Signing",
            Self::Encode(_) => "Encode",
            Self::Decode(_) => "Decode",
            Self::PaginationStalled(_) => "PaginationStalled",
        }
    }
}

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Local validation failed; nothing was sent.
    #[error(transparent)]
    Validation(#[from] ProtoError),

    /// The remote call failed.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// Output formatting error.
    #[error("format error: {0}")]
    Format(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Short machine-readable kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "Config",
            Self::Validation(e) => e.kind(),
            Self::Remote(e) => e.kind(),
            Self::Format(_) => "Format",
            Self::Io(_) => "Io",
        }
    }

    /// Service error code, for remote service errors.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Remote(RemoteError::Service { code, .. }) => Some(code),
            _ => None,
        }
    }

    /// Whether the error was raised locally, before any network call.
    #[must_use]
    pub const fn is_local(&self) -> bool {
        !matches!(self, Self::Remote(_))
    }
}

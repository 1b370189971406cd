//! Shared error type across webcast crates.

use thiserror::Error;

/// Stable failure categories (used in logs and by tests).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A bootstrap, status or transport call failed or timed out.
    NetworkFailure,
    /// Expected data was absent from an HTML/JSON/cookie response.
    PatternNotFound,
    /// The signing capability produced no usable signature.
    SignerFailure,
    /// Envelope, compression or response decoding failed.
    Malformed,
    /// A handler could not interpret its payload.
    DecodeFailure,
    /// Invalid configuration.
    Config,
    /// A record could not be persisted.
    SinkFailure,
    /// The connection retry budget is spent.
    Exhausted,
}

impl ErrorKind {
    /// String representation used in structured log fields.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::NetworkFailure => "NETWORK_FAILURE",
            ErrorKind::PatternNotFound => "PATTERN_NOT_FOUND",
            ErrorKind::SignerFailure => "SIGNER_FAILURE",
            ErrorKind::Malformed => "MALFORMED",
            ErrorKind::DecodeFailure => "DECODE_FAILURE",
            ErrorKind::Config => "CONFIG",
            ErrorKind::SinkFailure => "SINK_FAILURE",
            ErrorKind::Exhausted => "EXHAUSTED",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, FeedError>;

/// Unified error type used by core and client.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("network failure: {0}")]
    Network(String),
    #[error("pattern not found: {0}")]
    PatternNotFound(String),
    #[error("signer failure: {0}")]
    Signer(String),
    #[error("malformed frame: {0}")]
    Malformed(String),
    #[error("cannot decode {method} ({size} bytes): {reason}")]
    Decode {
        method: String,
        size: usize,
        reason: String,
    },
    #[error("invalid config: {0}")]
    Config(String),
    #[error("record sink: {0}")]
    Sink(String),
    #[error("gave up after {attempts} connection attempts")]
    Exhausted { attempts: u32 },
}

impl FeedError {
    /// Map an error to its stable category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            FeedError::Network(_) => ErrorKind::NetworkFailure,
            FeedError::PatternNotFound(_) => ErrorKind::PatternNotFound,
            FeedError::Signer(_) => ErrorKind::SignerFailure,
            FeedError::Malformed(_) => ErrorKind::Malformed,
            FeedError::Decode { .. } => ErrorKind::DecodeFailure,
            FeedError::Config(_) => ErrorKind::Config,
            FeedError::Sink(_) => ErrorKind::SinkFailure,
            FeedError::Exhausted { .. } => ErrorKind::Exhausted,
        }
    }

    /// Build a handler decode failure for `method`.
    pub fn decode(method: &str, size: usize, reason: impl std::fmt::Display) -> Self {
        FeedError::Decode {
            method: method.to_string(),
            size,
            reason: reason.to_string(),
        }
    }
}

//! Protocol error types.

use thiserror::Error;

/// Result alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors raised while encoding or decoding protocol values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Envelope could not be serialized to JSON
    #[error("envelope encode failed: {0}")]
    Encode(String),

    /// Wire text is not a valid envelope
    #[error("envelope decode failed: {0}")]
    Decode(String),

    /// Unknown session kind name
    #[error("unknown session kind: {0:?}")]
    UnknownKind(String),
}

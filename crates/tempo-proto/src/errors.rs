//! Protocol error types.

use thiserror::Error;

/// Errors produced while encoding or decoding payloads.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Payload could not be decoded as a known intent or event.
    #[error("failed to decode payload: {0}")]
    Decode(String),

    /// Payload could not be encoded.
    #[error("failed to encode payload: {0}")]
    Encode(String),
}

/// Convenience alias for protocol results.
pub type Result<T> = std::result::Result<T, ProtocolError>;

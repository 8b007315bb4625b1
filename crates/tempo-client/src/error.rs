//! Client error types.

use thiserror::Error;

/// Fatal runtime failures.
///
/// Everything else — send failures, drops, malformed events — is absorbed by
/// the reconnect/resync machinery and surfaced as connection status or
/// notices, never as an error to the caller.
#[derive(Debug, Error)]
pub enum RuntimeError<E: std::error::Error> {
    /// The initial connection could not be established.
    #[error("failed to establish push channel: {0}")]
    Connect(#[source] E),
}

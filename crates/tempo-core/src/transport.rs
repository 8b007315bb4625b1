//! Transport abstraction for the per-session push channel.
//!
//! Abstracts over the persistent, ordered, at-least-once channel the server
//! pushes events on. Production uses a websocket-style connection; tests use
//! an in-memory scripted server. The session state machine never touches
//! this trait directly — the adapter in `tempo-client` drives both.

use async_trait::async_trait;
use tempo_proto::{ClientIntent, ServerEvent, SessionId};

/// A persistent push channel for a single game session.
///
/// Implementations must deliver events in the order the server sent them for
/// the session (ordered-channel assumption). Delivery is at-least-once; the
/// session state machine's `move_index` check handles duplication on top of
/// that guarantee, not in place of it.
#[async_trait]
pub trait Transport: Send {
    /// Transport-specific failure type.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Establish the channel for a session.
    ///
    /// Called for the initial connection and again after any detected drop.
    /// The caller must re-request a full state before resuming event
    /// processing, since events missed during a drop are unrecoverable by
    /// sequence-patching.
    async fn connect(&mut self, session_id: SessionId) -> Result<(), Self::Error>;

    /// Transmit an intent to the server.
    ///
    /// Fire-and-forget from the state machine's perspective: the server's
    /// answer arrives through the ordinary event stream.
    async fn send(&mut self, intent: ClientIntent) -> Result<(), Self::Error>;

    /// Receive the next pushed event.
    ///
    /// Returns `None` when the channel has dropped; the caller is expected
    /// to reconnect and resync.
    async fn recv(&mut self) -> Option<ServerEvent>;

    /// Tear down the channel.
    async fn disconnect(&mut self);
}

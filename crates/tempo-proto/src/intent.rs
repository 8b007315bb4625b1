//! Outgoing intent payloads.

use serde::{Deserialize, Serialize};

use crate::types::Promotion;

/// A locally-initiated action request sent toward the server.
///
/// Intents are fire-and-forget: the client does not block waiting for the
/// matching event, and never applies an intent's effect optimistically. The
/// server's answer arrives through the ordinary event stream — an accepted
/// move as `MoveApplied`, a rejected intent as `GameError`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum ClientIntent {
    /// Submit a move for the authoritative position.
    SubmitMove {
        /// Origin square in algebraic notation, e.g. `"e2"`.
        from: String,
        /// Destination square in algebraic notation, e.g. `"e4"`.
        to: String,
        /// Promotion piece for a pawn reaching the last rank.
        promotion: Option<Promotion>,
    },

    /// Offer the opponent a draw.
    OfferDraw,

    /// Accept or decline the opponent's pending draw offer.
    RespondDraw {
        /// `true` to accept, `false` to decline.
        accepted: bool,
    },

    /// Resign the game.
    Resign,

    /// Request a full authoritative state snapshot.
    ///
    /// Sent on initial load, after any reconnect, and whenever a sequence gap
    /// is detected. Patching a gap is unsafe for a game position; a full
    /// resync is cheap and always correct.
    RequestFullState,
}

//! Error types for the session core.
//!
//! Three distinct failure layers, matching the propagation policy: oracle
//! errors block a local intent before it is sent, intent errors are surfaced
//! synchronously to the caller and never reach the network, and session
//! errors mark a malformed remote payload that the runtime answers with a
//! resync request. Nothing here propagates as a panic.

use thiserror::Error;

/// Errors from the rules oracle.
///
/// Only ever used to reject local input. An authoritative server position is
/// adopted even when the oracle disagrees with it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OracleError {
    /// A FEN string could not be parsed into a position.
    #[error("invalid FEN: {0}")]
    InvalidFen(String),

    /// A square name could not be parsed.
    #[error("invalid square: {0}")]
    InvalidSquare(String),

    /// The move is not legal in the given position.
    #[error("illegal move: {0}")]
    IllegalMove(String),
}

/// Local validation rejections.
///
/// Returned synchronously from [`crate::GameSession::handle_intent`]; a
/// rejected intent is never transmitted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntentError {
    /// No authoritative state has been received yet.
    #[error("the game has not started")]
    NotStarted,

    /// The game already finished; no further intents are accepted.
    #[error("the game is already finished")]
    GameFinished,

    /// The local identity is a spectator, not a seated player.
    #[error("not a player in this game")]
    NotAPlayer,

    /// It is the opponent's turn.
    #[error("it is not your turn")]
    NotYourTurn,

    /// A draw offer is already pending; a second one is rejected without
    /// round-tripping to the server.
    #[error("a draw offer is already pending")]
    OfferAlreadyPending,

    /// There is no pending draw offer to respond to.
    #[error("no draw offer is pending")]
    NoPendingOffer,

    /// The pending draw offer was made locally; only the opponent may
    /// respond to it.
    #[error("cannot respond to your own draw offer")]
    OwnOffer,

    /// The move failed the local legality pre-check.
    #[error(transparent)]
    Illegal(#[from] OracleError),
}

/// Reconciliation failures.
///
/// The only error a remote event can produce: its payload did not parse into
/// a usable position. The runtime logs it and requests a full resync.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// An event carried a position the client could not parse.
    #[error("malformed event payload: {0}")]
    MalformedEvent(#[from] OracleError),
}

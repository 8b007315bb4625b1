//! Shared wire types.
//!
//! Serializable values carried by intents and events. These are plain data;
//! all game logic lives in `tempo-core`.

use serde::{Deserialize, Serialize};

/// Piece color, also used to identify the two sides of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    /// White pieces.
    White,
    /// Black pieces.
    Black,
}

impl Color {
    /// Get the opposite color.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::White => Self::Black,
            Self::Black => Self::White,
        }
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::White => write!(f, "white"),
            Self::Black => write!(f, "black"),
        }
    }
}

/// Opaque player identity, supplied by the authentication collaborator.
///
/// The synchronization engine only reads this identity (to answer "is it my
/// turn" and "did I make this offer"); it never manages it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub u64);

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque session identifier, immutable for the session's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub u64);

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A player's identity plus display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRef {
    /// Player identity.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
}

/// Both seats of a session, set once at game start and immutable thereafter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Players {
    /// The white player.
    pub white: PlayerRef,
    /// The black player.
    pub black: PlayerRef,
}

impl Players {
    /// Which color the given player plays, or `None` for a spectator.
    #[must_use]
    pub fn color_of(&self, id: PlayerId) -> Option<Color> {
        if self.white.id == id {
            Some(Color::White)
        } else if self.black.id == id {
            Some(Color::Black)
        } else {
            None
        }
    }
}

/// Authoritative clock values, emitted by the server on every move and at a
/// minimum heartbeat interval while a clock is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockSnapshot {
    /// White's remaining time in milliseconds.
    pub white_remaining_ms: u64,
    /// Black's remaining time in milliseconds.
    pub black_remaining_ms: u64,
    /// Which side's clock is counting down, if any.
    pub running_side: Option<Color>,
}

/// A serialized board configuration plus the monotone move sequence number.
///
/// The FEN string carries piece placement, side to move, and
/// castling/en-passant metadata. `move_index` counts applied moves and is the
/// client's sequence-gap detector: an event whose index is not exactly
/// `current + 1` is never merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WirePosition {
    /// Board configuration in FEN notation.
    pub fen: String,
    /// Number of moves applied to reach this position.
    pub move_index: u64,
}

/// Promotion piece for a pawn reaching the last rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Promotion {
    /// Promote to queen.
    Queen,
    /// Promote to rook.
    Rook,
    /// Promote to bishop.
    Bishop,
    /// Promote to knight.
    Knight,
}

impl Promotion {
    /// UCI suffix character for this promotion.
    #[must_use]
    pub const fn uci_char(self) -> char {
        match self {
            Self::Queen => 'q',
            Self::Rook => 'r',
            Self::Bishop => 'b',
            Self::Knight => 'n',
        }
    }
}

/// Why a finished game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeReason {
    /// Checkmate.
    Checkmate,
    /// A player resigned.
    Resignation,
    /// A player ran out of time.
    Timeout,
    /// Draw by agreement.
    Agreement,
    /// A player abandoned the game.
    Abandonment,
    /// Stalemate.
    Stalemate,
    /// Insufficient mating material.
    InsufficientMaterial,
}

/// Terminal result of a game. `winner` is `None` for draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameOutcome {
    /// Winning color, or `None` for a draw.
    pub winner: Option<Color>,
    /// Why the game ended.
    pub reason: OutcomeReason,
}

/// Game status as reported by the server.
///
/// The server never reports `Loading`; that state exists only client-side,
/// between adopting a session identifier and receiving the first full state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireStatus {
    /// Game is in progress.
    Ongoing,
    /// Game has ended.
    Finished,
}

/// Server bounce codes for intents rejected after the fact.
///
/// These cover race conditions the client failed to prevent locally, e.g. a
/// move submitted against a position that an opponent's move had already
/// superseded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// It is not the sender's turn.
    NotYourTurn,
    /// The move is not legal in the authoritative position.
    IllegalMove,
    /// A draw offer is already pending.
    DrawOfferPending,
    /// The game already finished.
    GameFinished,
    /// Unspecified server-side failure.
    Internal,
}

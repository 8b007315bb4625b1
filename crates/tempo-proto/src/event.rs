//! Incoming event payloads.

use serde::{Deserialize, Serialize};

use crate::types::{
    ClockSnapshot, Color, ErrorCode, GameOutcome, Players, WirePosition, WireStatus,
};

/// A server-pushed fact the client must reconcile into its session state.
///
/// The transport delivers events in the order the server sent them for a
/// given session (ordered-channel assumption) with at-least-once semantics.
/// `MoveApplied` carries a sequence number as its duplicate/gap detector; all
/// other events are idempotent or order-insensitive by the reconciliation
/// rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Complete authoritative session state.
    ///
    /// Always accepted, replacing client state wholesale. Used for the
    /// initial load and for desynchronization recovery.
    FullState {
        /// Authoritative position.
        position: WirePosition,
        /// Both seats.
        players: Players,
        /// Authoritative clock values.
        clocks: ClockSnapshot,
        /// Game status.
        status: WireStatus,
        /// Pending draw offer, if one exists.
        pending_draw_offer: Option<Color>,
        /// Terminal outcome, present iff `status` is finished.
        outcome: Option<GameOutcome>,
        /// Move history in standard algebraic notation.
        move_log: Vec<String>,
    },

    /// A move (by either player) was accepted by the server.
    MoveApplied {
        /// Position after the move; its `move_index` must be exactly one
        /// past the client's current index to be merged.
        position: WirePosition,
        /// The applied move in standard algebraic notation.
        san: String,
        /// Clock values after the move.
        clocks: ClockSnapshot,
    },

    /// Authoritative clock heartbeat. Never changes position or status.
    ClockUpdate {
        /// Authoritative clock values.
        clocks: ClockSnapshot,
    },

    /// A draw was offered.
    DrawOffered {
        /// Which side offered.
        by: Color,
    },

    /// The pending draw offer was declined.
    DrawDeclined,

    /// The game ended.
    GameOver {
        /// Terminal outcome.
        outcome: GameOutcome,
    },

    /// An intent was rejected server-side after the fact.
    ///
    /// A transient, dismissible notice; never a status change.
    GameError {
        /// Machine-readable bounce code.
        code: ErrorCode,
        /// Human-readable explanation.
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PlayerId, PlayerRef};

    #[test]
    fn full_state_serde() {
        let event = ServerEvent::FullState {
            position: WirePosition {
                fen: "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1".into(),
                move_index: 0,
            },
            players: Players {
                white: PlayerRef { id: PlayerId(1), name: "ada".into() },
                black: PlayerRef { id: PlayerId(2), name: "bo".into() },
            },
            clocks: ClockSnapshot {
                white_remaining_ms: 600_000,
                black_remaining_ms: 600_000,
                running_side: Some(Color::White),
            },
            status: WireStatus::Ongoing,
            pending_draw_offer: None,
            outcome: None,
            move_log: Vec::new(),
        };

        let cbor = ciborium::ser::into_writer(&event, Vec::new());
        assert!(cbor.is_ok());
    }
}

//! Shared fixtures for scripted scenarios.

use tempo_proto::{
    ClockSnapshot, Color, GameOutcome, OutcomeReason, PlayerId, PlayerRef, Players, ServerEvent,
    WirePosition, WireStatus,
};

/// Standard starting position.
pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
/// Position after 1. e4.
pub const AFTER_E4: &str = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1";
/// Position after 1. e4 e5.
pub const AFTER_E4_E5: &str = "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq e6 0 2";
/// Position after 1. e4 e5 2. Nf3.
pub const AFTER_NF3: &str = "rnbqkbnr/pppp1ppp/8/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq - 1 2";

/// White seat: player 1. Black seat: player 2.
#[must_use]
pub fn players() -> Players {
    Players {
        white: PlayerRef { id: PlayerId(1), name: "ada".into() },
        black: PlayerRef { id: PlayerId(2), name: "bo".into() },
    }
}

/// Clock snapshot shorthand.
#[must_use]
pub fn clocks(white_ms: u64, black_ms: u64, running: Option<Color>) -> ClockSnapshot {
    ClockSnapshot {
        white_remaining_ms: white_ms,
        black_remaining_ms: black_ms,
        running_side: running,
    }
}

/// An ongoing full state with ten minutes a side.
#[must_use]
pub fn ongoing_full_state(fen: &str, move_index: u64) -> ServerEvent {
    ServerEvent::FullState {
        position: WirePosition { fen: fen.into(), move_index },
        players: players(),
        clocks: clocks(600_000, 600_000, Some(Color::White)),
        status: WireStatus::Ongoing,
        pending_draw_offer: None,
        outcome: None,
        move_log: Vec::new(),
    }
}

/// A move event with plausible post-move clocks.
#[must_use]
pub fn move_applied(fen: &str, move_index: u64, san: &str) -> ServerEvent {
    let running = if move_index % 2 == 0 { Color::White } else { Color::Black };
    ServerEvent::MoveApplied {
        position: WirePosition { fen: fen.into(), move_index },
        san: san.into(),
        clocks: clocks(599_000, 599_000, Some(running)),
    }
}

/// A terminal event.
#[must_use]
pub fn game_over(winner: Option<Color>, reason: OutcomeReason) -> ServerEvent {
    ServerEvent::GameOver { outcome: GameOutcome { winner, reason } }
}

//! Session state machine for a two-player clocked game.
//!
//! This module implements the reconciliation layer: it owns the canonical
//! client-side game state and the transition rules driven by local intents
//! and remote events.
//!
//! # Architecture: Action-Based State Machine
//!
//! The machine follows the action pattern:
//! - Methods accept time as a parameter (no stored clock source)
//! - Methods return `Vec<SessionAction>` describing intended effects
//! - A runtime executes the actions (transmit intents, surface notices)
//!
//! All entry points run to completion before the next input is processed;
//! there is no internal parallelism and no locking. The concurrency to
//! manage is the temporal interleaving of independently-sourced inputs, not
//! shared-memory races.
//!
//! # State Machine
//!
//! ```text
//! ┌─────────┐  FullState   ┌─────────┐  GameOver / FullState(finished)
//! │ Loading │─────────────>│ Ongoing │──────────────────────┐
//! └─────────┘              └─────────┘                      ↓
//!      │                                               ┌──────────┐
//!      └──────────────── GameOver ────────────────────>│ Finished │
//!                                                      └──────────┘
//! ```
//!
//! `Finished` is terminal: the session is discarded, never mutated further.
//!
//! # Optimism policy
//!
//! Local intents are fire-and-forget. A validated move is transmitted and
//! recorded as pending, but the position changes only when the server's
//! `MoveApplied` arrives: the server may still reject the move (a stale
//! position race), and a premature local apply would require a rollback that
//! is more error-prone than a short wait.

use std::time::Instant;

use tempo_proto::{
    ClientIntent, ClockSnapshot, Color, ErrorCode, GameOutcome, PlayerId, Players, ServerEvent,
    SessionId, WirePosition, WireStatus,
};
use tracing::{debug, info, warn};

use crate::{
    clock::{ClockConfig, ClockModel},
    error::{IntentError, SessionError},
    oracle::{MoveRequest, Position},
};

/// Lifecycle status of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Session identifier adopted, waiting for the first authoritative
    /// full state.
    Loading,
    /// Game in progress.
    Ongoing,
    /// Game ended (terminal).
    Finished,
}

/// A locally-initiated action, from the presentation binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalIntent {
    /// Play a move.
    RequestMove(MoveRequest),
    /// Offer the opponent a draw.
    OfferDraw,
    /// Accept or decline the opponent's pending draw offer.
    RespondToDraw {
        /// `true` to accept, `false` to decline.
        accepted: bool,
    },
    /// Resign the game.
    Resign,
}

/// Non-fatal notices surfaced to the presentation binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionNotice {
    /// The server rejected an intent after the fact; transient and
    /// dismissible, never a status change.
    ServerBounce {
        /// Machine-readable bounce code.
        code: ErrorCode,
        /// Human-readable explanation.
        message: String,
    },
    /// A sequence gap was detected and a full resync is in flight.
    Resyncing,
}

/// Actions returned by the session state machine.
///
/// The runtime executes these:
/// - `Send`: transmit the intent over the push channel
/// - `Notice`: surface a dismissible notice to the presentation binding
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// Transmit this intent to the server.
    Send(ClientIntent),
    /// Surface this notice.
    Notice(SessionNotice),
}

/// A transmitted move awaiting server confirmation.
#[derive(Debug, Clone)]
struct PendingMove {
    request: MoveRequest,
    /// FEN the oracle expects the server to confirm, kept to detect
    /// rule-mismatch bugs between oracle and server.
    expected_fen: String,
}

/// The aggregate root: canonical client-side state of one game session.
///
/// Owned and mutated exclusively by its entry points
/// ([`GameSession::handle_intent`], [`GameSession::handle_event`],
/// [`GameSession::tick`]); the rendering collaborator reads it as an
/// immutable snapshot after each processed input.
#[derive(Debug)]
pub struct GameSession {
    session_id: SessionId,
    local_player: PlayerId,
    status: SessionStatus,
    position: Option<Position>,
    players: Option<Players>,
    local_side: Option<Color>,
    clocks: ClockModel,
    pending_draw_offer: Option<Color>,
    /// Local offer transmitted but not yet echoed back by the server.
    ///
    /// `pending_draw_offer` itself is set only by the server's event, so
    /// that simultaneous offers from both sides resolve through the server;
    /// this latch exists solely to suppress duplicate transmissions.
    draw_offer_in_flight: bool,
    pending_move: Option<PendingMove>,
    outcome: Option<GameOutcome>,
    move_log: Vec<String>,
    awaiting_resync: bool,
}

impl GameSession {
    /// Create a session in `Loading`, bound to the authenticated player.
    #[must_use]
    pub fn new(session_id: SessionId, local_player: PlayerId, clock_config: ClockConfig) -> Self {
        Self {
            session_id,
            local_player,
            status: SessionStatus::Loading,
            position: None,
            players: None,
            local_side: None,
            clocks: ClockModel::new(clock_config),
            pending_draw_offer: None,
            draw_offer_in_flight: false,
            pending_move: None,
            outcome: None,
            move_log: Vec::new(),
            awaiting_resync: false,
        }
    }

    /// Session identifier, immutable for the session's lifetime.
    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Current lifecycle status.
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Current authoritative position, if one has arrived.
    #[must_use]
    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    /// Whose turn it is, derived from the position.
    #[must_use]
    pub fn side_to_move(&self) -> Option<Color> {
        self.position.as_ref().map(Position::side_to_move)
    }

    /// Both seats, set once at `Ongoing` entry.
    #[must_use]
    pub fn players(&self) -> Option<&Players> {
        self.players.as_ref()
    }

    /// Which color the local identity plays; `None` for a spectator.
    #[must_use]
    pub fn local_side(&self) -> Option<Color> {
        self.local_side
    }

    /// The clocks. Mutated only through the session's entry points.
    #[must_use]
    pub fn clocks(&self) -> &ClockModel {
        &self.clocks
    }

    /// Pending draw offer, if one exists.
    #[must_use]
    pub fn pending_draw_offer(&self) -> Option<Color> {
        self.pending_draw_offer
    }

    /// The transmitted move awaiting confirmation, for the UI's "pending"
    /// affordance.
    #[must_use]
    pub fn pending_move(&self) -> Option<&MoveRequest> {
        self.pending_move.as_ref().map(|p| &p.request)
    }

    /// Terminal outcome; `Some` exactly when the status is `Finished`.
    #[must_use]
    pub fn outcome(&self) -> Option<GameOutcome> {
        self.outcome
    }

    /// Move history in standard algebraic notation.
    #[must_use]
    pub fn move_log(&self) -> &[String] {
        &self.move_log
    }

    /// Whether a desynchronization was detected and a full resync is in
    /// flight.
    #[must_use]
    pub fn is_awaiting_resync(&self) -> bool {
        self.awaiting_resync
    }

    /// Legal destination squares for highlighting, via the rules oracle.
    #[must_use]
    pub fn legal_destinations(&self, from: shakmaty::Square) -> Vec<shakmaty::Square> {
        match &self.position {
            Some(position) => position.legal_destinations(from),
            None => Vec::new(),
        }
    }

    /// Process a local intent.
    ///
    /// Validation happens here, synchronously: a rejected intent never
    /// reaches the network. A valid intent is returned as a `Send` action
    /// with no optimistic state change beyond pending-move bookkeeping.
    ///
    /// # Errors
    ///
    /// Returns the local validation rejection; surfaced directly to the
    /// presentation binding.
    pub fn handle_intent(
        &mut self,
        intent: LocalIntent,
    ) -> Result<Vec<SessionAction>, IntentError> {
        match self.status {
            SessionStatus::Loading => return Err(IntentError::NotStarted),
            SessionStatus::Finished => return Err(IntentError::GameFinished),
            SessionStatus::Ongoing => {},
        }
        let local_side = self.local_side.ok_or(IntentError::NotAPlayer)?;

        match intent {
            LocalIntent::RequestMove(request) => self.intend_move(local_side, request),
            LocalIntent::OfferDraw => {
                if self.pending_draw_offer.is_some() || self.draw_offer_in_flight {
                    return Err(IntentError::OfferAlreadyPending);
                }
                self.draw_offer_in_flight = true;
                Ok(vec![SessionAction::Send(ClientIntent::OfferDraw)])
            },
            LocalIntent::RespondToDraw { accepted } => {
                match self.pending_draw_offer {
                    None => return Err(IntentError::NoPendingOffer),
                    Some(by) if by == local_side => return Err(IntentError::OwnOffer),
                    Some(_) => {},
                }
                self.pending_draw_offer = None;
                Ok(vec![SessionAction::Send(ClientIntent::RespondDraw { accepted })])
            },
            LocalIntent::Resign => {
                // No local transition; the server confirms with GameOver.
                Ok(vec![SessionAction::Send(ClientIntent::Resign)])
            },
        }
    }

    fn intend_move(
        &mut self,
        local_side: Color,
        request: MoveRequest,
    ) -> Result<Vec<SessionAction>, IntentError> {
        let Some(position) = self.position.as_ref() else {
            return Err(IntentError::NotStarted);
        };
        if position.side_to_move() != local_side {
            return Err(IntentError::NotYourTurn);
        }

        let applied = position.apply_move(&request)?;
        self.pending_move =
            Some(PendingMove { request, expected_fen: applied.position.fen() });

        Ok(vec![SessionAction::Send(ClientIntent::SubmitMove {
            from: request.from.to_string(),
            to: request.to.to_string(),
            promotion: request.promotion,
        })])
    }

    /// Reconcile a remote event into the session state.
    ///
    /// Events are applied strictly in the order the transport delivers them.
    /// The `move_index` check in `MoveApplied` is the only defense against
    /// transport-level duplication or gaps; every other event type is
    /// idempotent or order-insensitive.
    ///
    /// # Errors
    ///
    /// Only a malformed payload (unparseable position) errors; the runtime
    /// logs it and requests a full resync.
    pub fn handle_event(
        &mut self,
        event: ServerEvent,
        now: Instant,
    ) -> Result<Vec<SessionAction>, SessionError> {
        if self.status == SessionStatus::Finished {
            // Terminal: duplicates of GameOver and all trailing events are
            // no-ops.
            debug!(session = %self.session_id, "event after finish ignored");
            return Ok(Vec::new());
        }

        match event {
            ServerEvent::FullState {
                position,
                players,
                clocks,
                status,
                pending_draw_offer,
                outcome,
                move_log,
            } => self.apply_full_state(
                &position,
                players,
                &clocks,
                status,
                pending_draw_offer,
                outcome,
                move_log,
                now,
            ),
            ServerEvent::GameOver { outcome } => {
                info!(session = %self.session_id, reason = ?outcome.reason, "game over");
                self.status = SessionStatus::Finished;
                self.outcome = Some(outcome);
                self.pending_draw_offer = None;
                self.draw_offer_in_flight = false;
                self.pending_move = None;
                self.awaiting_resync = false;
                self.clocks.stop();
                Ok(Vec::new())
            },
            _ if self.status == SessionStatus::Loading => {
                // The initial full state is already in flight; anything else
                // arriving first is unusable without a position.
                debug!(session = %self.session_id, "event before initial full state discarded");
                Ok(Vec::new())
            },
            ServerEvent::MoveApplied { position, san, clocks } => {
                self.apply_move_event(&position, san, &clocks, now)
            },
            ServerEvent::ClockUpdate { clocks } => {
                self.clocks.apply_snapshot(&clocks, now);
                Ok(Vec::new())
            },
            ServerEvent::DrawOffered { by } => {
                if Some(by) == self.local_side {
                    // The server echoed our own offer back.
                    self.draw_offer_in_flight = false;
                }
                if self.pending_draw_offer.is_some() {
                    // At-least-once delivery can replay the offer.
                    debug!(session = %self.session_id, "redundant draw offer ignored");
                } else {
                    self.pending_draw_offer = Some(by);
                }
                Ok(Vec::new())
            },
            ServerEvent::DrawDeclined => {
                self.draw_offer_in_flight = false;
                if self.pending_draw_offer.take().is_none() {
                    debug!(session = %self.session_id, "draw decline with no pending offer");
                }
                Ok(Vec::new())
            },
            ServerEvent::GameError { code, message } => {
                // A race the client failed to prevent locally; whichever
                // intent was in flight (move or offer) was bounced.
                self.pending_move = None;
                self.draw_offer_in_flight = false;
                Ok(vec![SessionAction::Notice(SessionNotice::ServerBounce { code, message })])
            },
        }
    }

    /// Drive the advisory clock countdown.
    pub fn tick(&mut self, now: Instant) -> Vec<SessionAction> {
        self.clocks.tick(now);
        Vec::new()
    }

    #[allow(clippy::too_many_arguments)]
    fn apply_full_state(
        &mut self,
        position: &WirePosition,
        players: Players,
        clocks: &ClockSnapshot,
        status: WireStatus,
        pending_draw_offer: Option<Color>,
        outcome: Option<GameOutcome>,
        move_log: Vec<String>,
        now: Instant,
    ) -> Result<Vec<SessionAction>, SessionError> {
        let parsed = Position::from_wire(position)?;

        if self.status == SessionStatus::Loading {
            info!(session = %self.session_id, "authoritative state received, session live");
        }

        self.local_side = players.color_of(self.local_player);
        self.players = Some(players);
        self.position = Some(parsed);
        self.move_log = move_log;
        self.pending_draw_offer = pending_draw_offer;
        self.draw_offer_in_flight = false;
        self.pending_move = None;
        self.awaiting_resync = false;
        self.clocks.apply_snapshot(clocks, now);

        match status {
            WireStatus::Ongoing => {
                self.status = SessionStatus::Ongoing;
                self.outcome = None;
            },
            WireStatus::Finished => {
                if outcome.is_none() {
                    warn!(session = %self.session_id, "finished state without outcome");
                }
                self.status = SessionStatus::Finished;
                self.outcome = outcome;
                self.clocks.stop();
            },
        }

        Ok(Vec::new())
    }

    fn apply_move_event(
        &mut self,
        position: &WirePosition,
        san: String,
        clocks: &ClockSnapshot,
        now: Instant,
    ) -> Result<Vec<SessionAction>, SessionError> {
        let Some(current) = self.position.as_ref() else {
            return Ok(Vec::new());
        };

        if self.awaiting_resync {
            // Anything sequenced before the pending full state is stale by
            // construction, even if its index happens to line up.
            debug!(session = %self.session_id, "move event during resync discarded");
            return Ok(Vec::new());
        }

        let expected = current.move_index() + 1;

        if position.move_index != expected {
            // Stale duplicate or a gap: never merged. Patching a gap is
            // unsafe for a game position; a full resync is cheap and always
            // correct.
            warn!(
                session = %self.session_id,
                got = position.move_index,
                expected,
                "move event out of sequence, discarding"
            );
            self.awaiting_resync = true;
            return Ok(vec![
                SessionAction::Send(ClientIntent::RequestFullState),
                SessionAction::Notice(SessionNotice::Resyncing),
            ]);
        }

        let parsed = Position::from_wire(position)?;
        let mover = current.side_to_move();

        if Some(mover) == self.local_side {
            if let Some(pending) = self.pending_move.take() {
                // The server's word is final even if the oracle disagrees;
                // a mismatch here is a variant/rule bug worth logging.
                if pending.expected_fen != parsed.fen() {
                    warn!(
                        session = %self.session_id,
                        expected = %pending.expected_fen,
                        got = %parsed.fen(),
                        "oracle disagrees with authoritative position"
                    );
                }
            }
        }

        self.position = Some(parsed);
        self.move_log.push(san);
        // A move supersedes any pending draw offer, local or remote.
        self.pending_draw_offer = None;
        self.draw_offer_in_flight = false;
        self.clocks.apply_snapshot(clocks, now);

        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tempo_proto::{OutcomeReason, PlayerRef};

    use super::*;

    const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
    const AFTER_E4: &str = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1";
    const AFTER_E4_E5: &str = "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq e6 0 2";

    fn players() -> Players {
        Players {
            white: PlayerRef { id: PlayerId(1), name: "ada".into() },
            black: PlayerRef { id: PlayerId(2), name: "bo".into() },
        }
    }

    fn clocks(white_ms: u64, black_ms: u64, running: Option<Color>) -> ClockSnapshot {
        ClockSnapshot {
            white_remaining_ms: white_ms,
            black_remaining_ms: black_ms,
            running_side: running,
        }
    }

    fn full_state(fen: &str, move_index: u64) -> ServerEvent {
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

    fn move_applied(fen: &str, move_index: u64, san: &str) -> ServerEvent {
        ServerEvent::MoveApplied {
            position: WirePosition { fen: fen.into(), move_index },
            san: san.into(),
            clocks: clocks(599_000, 600_000, Some(Color::Black)),
        }
    }

    fn game_over(winner: Option<Color>, reason: OutcomeReason) -> ServerEvent {
        ServerEvent::GameOver { outcome: GameOutcome { winner, reason } }
    }

    fn mv(from: &str, to: &str) -> LocalIntent {
        LocalIntent::RequestMove(MoveRequest::parse(from, to, None).unwrap())
    }

    /// Session for the white player, loaded with the starting position.
    fn live_session() -> (GameSession, Instant) {
        let t0 = Instant::now();
        let mut session = GameSession::new(SessionId(7), PlayerId(1), ClockConfig::default());
        session.handle_event(full_state(START_FEN, 0), t0).unwrap();
        (session, t0)
    }

    fn sent_intents(actions: &[SessionAction]) -> Vec<&ClientIntent> {
        actions
            .iter()
            .filter_map(|a| match a {
                SessionAction::Send(intent) => Some(intent),
                SessionAction::Notice(_) => None,
            })
            .collect()
    }

    #[test]
    fn fresh_session_load() {
        let (session, _) = live_session();

        assert_eq!(session.status(), SessionStatus::Ongoing);
        assert_eq!(session.local_side(), Some(Color::White));
        assert_eq!(session.side_to_move(), Some(Color::White));
        assert_eq!(session.pending_draw_offer(), None);
        assert_eq!(session.clocks().remaining(Color::White), Duration::from_millis(600_000));
        assert_eq!(session.clocks().remaining(Color::Black), Duration::from_millis(600_000));
    }

    #[test]
    fn intents_rejected_while_loading() {
        let mut session = GameSession::new(SessionId(7), PlayerId(1), ClockConfig::default());

        let result = session.handle_intent(mv("e2", "e4"));
        assert_eq!(result, Err(IntentError::NotStarted));
    }

    #[test]
    fn events_before_full_state_discarded() {
        let t0 = Instant::now();
        let mut session = GameSession::new(SessionId(7), PlayerId(1), ClockConfig::default());

        let actions = session.handle_event(move_applied(AFTER_E4, 1, "e4"), t0).unwrap();
        assert!(actions.is_empty());
        assert_eq!(session.status(), SessionStatus::Loading);
        assert!(session.position().is_none());
    }

    #[test]
    fn legal_move_intent_is_sent_and_pending() {
        let (mut session, _) = live_session();

        let actions = session.handle_intent(mv("e2", "e4")).unwrap();
        assert_eq!(
            sent_intents(&actions),
            vec![&ClientIntent::SubmitMove { from: "e2".into(), to: "e4".into(), promotion: None }]
        );

        // Not applied optimistically: the position waits for the server.
        assert_eq!(session.position().unwrap().move_index(), 0);
        assert!(session.pending_move().is_some());
    }

    #[test]
    fn illegal_move_never_reaches_transport() {
        let (mut session, _) = live_session();

        let result = session.handle_intent(mv("e2", "e5"));
        assert!(matches!(result, Err(IntentError::Illegal(_))));
        assert!(session.pending_move().is_none());
    }

    #[test]
    fn opponents_turn_rejected() {
        let (mut session, t0) = live_session();
        session.handle_event(move_applied(AFTER_E4, 1, "e4"), t0).unwrap();

        let result = session.handle_intent(mv("e7", "e5"));
        assert_eq!(result, Err(IntentError::NotYourTurn));
    }

    #[test]
    fn spectator_cannot_act() {
        let t0 = Instant::now();
        let mut session = GameSession::new(SessionId(7), PlayerId(99), ClockConfig::default());
        session.handle_event(full_state(START_FEN, 0), t0).unwrap();

        assert_eq!(session.local_side(), None);
        assert_eq!(session.handle_intent(mv("e2", "e4")), Err(IntentError::NotAPlayer));
        assert_eq!(session.handle_intent(LocalIntent::Resign), Err(IntentError::NotAPlayer));
    }

    #[test]
    fn in_sequence_move_applies() {
        let (mut session, t0) = live_session();

        let actions = session.handle_event(move_applied(AFTER_E4, 1, "e4"), t0).unwrap();
        assert!(actions.is_empty());

        assert_eq!(session.position().unwrap().move_index(), 1);
        assert_eq!(session.side_to_move(), Some(Color::Black));
        assert_eq!(session.move_log(), ["e4"]);
        // The move's clock snapshot is authoritative.
        assert_eq!(session.clocks().remaining(Color::White), Duration::from_millis(599_000));
    }

    #[test]
    fn own_move_confirmation_clears_pending() {
        let (mut session, t0) = live_session();

        session.handle_intent(mv("e2", "e4")).unwrap();
        assert!(session.pending_move().is_some());

        session.handle_event(move_applied(AFTER_E4, 1, "e4"), t0).unwrap();
        assert!(session.pending_move().is_none());
    }

    #[test]
    fn out_of_order_move_delivery_triggers_single_resync() {
        let (mut session, t0) = live_session();

        // Gap: index 2 when 1 was expected.
        let actions = session.handle_event(move_applied(AFTER_E4_E5, 2, "e5"), t0).unwrap();
        assert_eq!(
            actions,
            vec![
                SessionAction::Send(ClientIntent::RequestFullState),
                SessionAction::Notice(SessionNotice::Resyncing),
            ]
        );
        assert!(session.is_awaiting_resync());
        assert_eq!(session.position().unwrap().move_index(), 0);

        // The straggler arrives next. Its index lines up, but it predates
        // the requested snapshot and must not be merged either.
        let actions = session.handle_event(move_applied(AFTER_E4, 1, "e4"), t0).unwrap();
        assert!(actions.is_empty());
        assert_eq!(session.position().unwrap().move_index(), 0);
        assert!(session.move_log().is_empty());
    }

    #[test]
    fn duplicate_move_event_discarded() {
        let (mut session, t0) = live_session();

        session.handle_event(move_applied(AFTER_E4, 1, "e4"), t0).unwrap();
        // At-least-once delivery replays the same event.
        let actions = session.handle_event(move_applied(AFTER_E4, 1, "e4"), t0).unwrap();

        assert_eq!(actions.len(), 2, "stale duplicate requests a resync");
        assert_eq!(session.position().unwrap().move_index(), 1);
        assert_eq!(session.move_log(), ["e4"]);
    }

    #[test]
    fn full_state_resync_recovers() {
        let (mut session, t0) = live_session();

        session.handle_event(move_applied(AFTER_E4_E5, 2, "e5"), t0).unwrap();
        assert!(session.is_awaiting_resync());

        let resync = ServerEvent::FullState {
            position: WirePosition { fen: AFTER_E4_E5.into(), move_index: 2 },
            players: players(),
            clocks: clocks(598_000, 599_500, Some(Color::White)),
            status: WireStatus::Ongoing,
            pending_draw_offer: None,
            outcome: None,
            move_log: vec!["e4".into(), "e5".into()],
        };
        session.handle_event(resync, t0).unwrap();

        assert!(!session.is_awaiting_resync());
        assert_eq!(session.position().unwrap().move_index(), 2);
        assert_eq!(session.move_log(), ["e4", "e5"]);

        // Move events merge normally again.
        let next = ServerEvent::MoveApplied {
            position: WirePosition {
                fen: "rnbqkbnr/pppp1ppp/8/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq - 1 2".into(),
                move_index: 3,
            },
            san: "Nf3".into(),
            clocks: clocks(597_000, 599_500, Some(Color::Black)),
        };
        session.handle_event(next, t0).unwrap();
        assert_eq!(session.position().unwrap().move_index(), 3);
    }

    #[test]
    fn terminal_state_is_idempotent() {
        let (mut session, t0) = live_session();

        session.handle_event(game_over(Some(Color::White), OutcomeReason::Resignation), t0).unwrap();
        assert_eq!(session.status(), SessionStatus::Finished);
        assert_eq!(
            session.outcome(),
            Some(GameOutcome { winner: Some(Color::White), reason: OutcomeReason::Resignation })
        );

        // Duplicate terminal event and trailing events are all no-ops.
        session.handle_event(game_over(None, OutcomeReason::Agreement), t0).unwrap();
        assert_eq!(
            session.outcome(),
            Some(GameOutcome { winner: Some(Color::White), reason: OutcomeReason::Resignation })
        );

        let white_before = session.clocks().remaining(Color::White);
        session.handle_event(move_applied(AFTER_E4, 1, "e4"), t0).unwrap();
        session.handle_event(ServerEvent::DrawOffered { by: Color::Black }, t0).unwrap();
        session
            .handle_event(
                ServerEvent::ClockUpdate { clocks: clocks(1, 1, Some(Color::White)) },
                t0,
            )
            .unwrap();

        assert_eq!(session.status(), SessionStatus::Finished);
        assert_eq!(session.position().unwrap().move_index(), 0);
        assert_eq!(session.pending_draw_offer(), None);
        assert_eq!(session.clocks().remaining(Color::White), white_before);
    }

    #[test]
    fn finished_session_rejects_intents() {
        let (mut session, t0) = live_session();
        session.handle_event(game_over(None, OutcomeReason::Agreement), t0).unwrap();

        assert_eq!(session.handle_intent(mv("e2", "e4")), Err(IntentError::GameFinished));
        assert_eq!(session.handle_intent(LocalIntent::Resign), Err(IntentError::GameFinished));
        assert_eq!(session.handle_intent(LocalIntent::OfferDraw), Err(IntentError::GameFinished));
    }

    #[test]
    fn game_over_accepted_while_loading() {
        let t0 = Instant::now();
        let mut session = GameSession::new(SessionId(7), PlayerId(1), ClockConfig::default());

        session.handle_event(game_over(Some(Color::Black), OutcomeReason::Abandonment), t0).unwrap();
        assert_eq!(session.status(), SessionStatus::Finished);
        assert!(session.outcome().is_some());
    }

    #[test]
    fn second_draw_offer_not_transmitted() {
        let (mut session, _) = live_session();

        let first = session.handle_intent(LocalIntent::OfferDraw).unwrap();
        assert_eq!(sent_intents(&first), vec![&ClientIntent::OfferDraw]);

        // No server echo yet; the duplicate is suppressed locally.
        let second = session.handle_intent(LocalIntent::OfferDraw);
        assert_eq!(second, Err(IntentError::OfferAlreadyPending));
        assert_eq!(session.pending_draw_offer(), None);
    }

    #[test]
    fn offer_again_after_decline() {
        let (mut session, t0) = live_session();

        session.handle_intent(LocalIntent::OfferDraw).unwrap();
        session.handle_event(ServerEvent::DrawOffered { by: Color::White }, t0).unwrap();
        assert_eq!(session.pending_draw_offer(), Some(Color::White));

        session.handle_event(ServerEvent::DrawDeclined, t0).unwrap();
        assert_eq!(session.pending_draw_offer(), None);

        let actions = session.handle_intent(LocalIntent::OfferDraw).unwrap();
        assert_eq!(sent_intents(&actions), vec![&ClientIntent::OfferDraw]);
    }

    #[test]
    fn draw_offer_race_stays_consistent() {
        let (mut session, t0) = live_session();

        // Local offer goes out first from the client's point of view…
        let actions = session.handle_intent(LocalIntent::OfferDraw).unwrap();
        assert_eq!(sent_intents(&actions), vec![&ClientIntent::OfferDraw]);

        // …but the opponent's offer was already in flight and lands first.
        session.handle_event(ServerEvent::DrawOffered { by: Color::Black }, t0).unwrap();
        assert_eq!(session.pending_draw_offer(), Some(Color::Black));

        // The server bounces our side of the race. No crash, no state loss.
        let actions = session
            .handle_event(
                ServerEvent::GameError {
                    code: ErrorCode::DrawOfferPending,
                    message: "a draw offer is already pending".into(),
                },
                t0,
            )
            .unwrap();
        assert_eq!(
            actions,
            vec![SessionAction::Notice(SessionNotice::ServerBounce {
                code: ErrorCode::DrawOfferPending,
                message: "a draw offer is already pending".into(),
            })]
        );
        assert_eq!(session.pending_draw_offer(), Some(Color::Black));
        assert_eq!(session.status(), SessionStatus::Ongoing);

        // The opponent's offer is still answerable.
        let actions = session.handle_intent(LocalIntent::RespondToDraw { accepted: true }).unwrap();
        assert_eq!(sent_intents(&actions), vec![&ClientIntent::RespondDraw { accepted: true }]);
    }

    #[test]
    fn cannot_respond_to_own_offer() {
        let (mut session, t0) = live_session();

        session.handle_event(ServerEvent::DrawOffered { by: Color::White }, t0).unwrap();
        let result = session.handle_intent(LocalIntent::RespondToDraw { accepted: true });
        assert_eq!(result, Err(IntentError::OwnOffer));
    }

    #[test]
    fn cannot_respond_without_offer() {
        let (mut session, _) = live_session();

        let result = session.handle_intent(LocalIntent::RespondToDraw { accepted: false });
        assert_eq!(result, Err(IntentError::NoPendingOffer));
    }

    #[test]
    fn move_clears_pending_offer() {
        let (mut session, t0) = live_session();

        session.handle_event(ServerEvent::DrawOffered { by: Color::Black }, t0).unwrap();
        assert_eq!(session.pending_draw_offer(), Some(Color::Black));

        session.handle_event(move_applied(AFTER_E4, 1, "e4"), t0).unwrap();
        assert_eq!(session.pending_draw_offer(), None);
    }

    #[test]
    fn redundant_draw_offer_ignored() {
        let (mut session, t0) = live_session();

        session.handle_event(ServerEvent::DrawOffered { by: Color::Black }, t0).unwrap();
        session.handle_event(ServerEvent::DrawOffered { by: Color::White }, t0).unwrap();

        assert_eq!(session.pending_draw_offer(), Some(Color::Black));
    }

    #[test]
    fn resign_waits_for_server() {
        let (mut session, _) = live_session();

        let actions = session.handle_intent(LocalIntent::Resign).unwrap();
        assert_eq!(sent_intents(&actions), vec![&ClientIntent::Resign]);
        assert_eq!(session.status(), SessionStatus::Ongoing);
    }

    #[test]
    fn clock_update_is_authoritative() {
        let (mut session, t0) = live_session();

        // Local ticking drifts the display.
        session.tick(t0 + Duration::from_secs(4));
        assert_eq!(session.clocks().remaining(Color::White), Duration::from_millis(596_000));

        let t1 = t0 + Duration::from_secs(4);
        session
            .handle_event(
                ServerEvent::ClockUpdate { clocks: clocks(597_250, 600_000, Some(Color::White)) },
                t1,
            )
            .unwrap();

        assert_eq!(session.clocks().remaining(Color::White), Duration::from_millis(597_250));
    }

    #[test]
    fn game_error_clears_pending_move() {
        let (mut session, t0) = live_session();

        session.handle_intent(mv("e2", "e4")).unwrap();
        assert!(session.pending_move().is_some());

        let actions = session
            .handle_event(
                ServerEvent::GameError {
                    code: ErrorCode::NotYourTurn,
                    message: "it is not your turn".into(),
                },
                t0,
            )
            .unwrap();

        assert!(matches!(actions[0], SessionAction::Notice(SessionNotice::ServerBounce { .. })));
        assert!(session.pending_move().is_none());
        assert_eq!(session.status(), SessionStatus::Ongoing);
    }

    #[test]
    fn malformed_full_state_is_an_error() {
        let t0 = Instant::now();
        let mut session = GameSession::new(SessionId(7), PlayerId(1), ClockConfig::default());

        let event = ServerEvent::FullState {
            position: WirePosition { fen: "garbage".into(), move_index: 0 },
            players: players(),
            clocks: clocks(600_000, 600_000, None),
            status: WireStatus::Ongoing,
            pending_draw_offer: None,
            outcome: None,
            move_log: Vec::new(),
        };

        let result = session.handle_event(event, t0);
        assert!(matches!(result, Err(SessionError::MalformedEvent(_))));
        assert_eq!(session.status(), SessionStatus::Loading);
    }

    #[test]
    fn finished_full_state_adopted() {
        let t0 = Instant::now();
        let mut session = GameSession::new(SessionId(7), PlayerId(2), ClockConfig::default());

        let event = ServerEvent::FullState {
            position: WirePosition { fen: AFTER_E4_E5.into(), move_index: 2 },
            players: players(),
            clocks: clocks(0, 598_000, None),
            status: WireStatus::Finished,
            pending_draw_offer: None,
            outcome: Some(GameOutcome { winner: Some(Color::Black), reason: OutcomeReason::Timeout }),
            move_log: vec!["e4".into(), "e5".into()],
        };

        session.handle_event(event, t0).unwrap();
        assert_eq!(session.status(), SessionStatus::Finished);
        assert_eq!(session.local_side(), Some(Color::Black));
        assert_eq!(
            session.outcome(),
            Some(GameOutcome { winner: Some(Color::Black), reason: OutcomeReason::Timeout })
        );
        assert_eq!(session.clocks().running_side(), None);
    }
}

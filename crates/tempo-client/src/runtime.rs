//! Session runtime: the orchestration loop.
//!
//! Multiplexes three independently-sourced input streams — local intents
//! from the presentation binding, remote events from the transport adapter,
//! and the advisory clock tick — into the pure session state machine, one
//! input at a time. Each input runs to completion before the next is
//! processed, so the machine never sees parallel mutation; the only
//! concurrency is the temporal interleaving handled here.

use std::time::Instant;

use tempo_core::{
    GameSession, IntentError, LocalIntent, SessionAction, SessionNotice, SessionStatus, Transport,
};
use tempo_proto::{ClientIntent, ClockSnapshot, Color, ErrorCode, GameOutcome};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::{
    adapter::{AdapterEvent, ConnectionStatus, TransportAdapter},
    error::RuntimeError,
};

/// Runtime configuration.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeConfig {
    /// Capacity of the bounded update channel toward the presentation
    /// binding. A slow consumer backpressures the loop rather than seeing
    /// torn state.
    pub update_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self { update_capacity: 64 }
    }
}

/// Transient notices attached to an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateNotice {
    /// A local intent failed validation; nothing was transmitted.
    Rejected(IntentError),
    /// The server bounced a transmitted intent.
    Bounce {
        /// Machine-readable bounce code.
        code: ErrorCode,
        /// Human-readable explanation.
        message: String,
    },
    /// A desynchronization was detected; a full resync is in flight.
    Resyncing,
    /// The push channel dropped and was reestablished.
    Reconnected,
}

/// Immutable snapshot of the session, published after every processed input.
///
/// The rendering collaborator consumes these and never mutates session state
/// directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUpdate {
    /// Lifecycle status.
    pub status: SessionStatus,
    /// Current position in FEN notation, if loaded.
    pub fen: Option<String>,
    /// Whose turn it is.
    pub side_to_move: Option<Color>,
    /// Which color the local identity plays.
    pub local_side: Option<Color>,
    /// Advisory clock values.
    pub clocks: ClockSnapshot,
    /// Whether the clock display is running on stale trust.
    pub clocks_unconfirmed: bool,
    /// Pending draw offer, if any.
    pub pending_draw_offer: Option<Color>,
    /// Whether a transmitted move awaits confirmation.
    pub move_pending: bool,
    /// Terminal outcome, once finished.
    pub outcome: Option<GameOutcome>,
    /// Move history in standard algebraic notation.
    pub move_log: Vec<String>,
    /// Connection status indicator.
    pub connection: ConnectionStatus,
    /// Transient notices for this update.
    pub notices: Vec<UpdateNotice>,
}

/// Drives a [`GameSession`] against a transport.
pub struct SessionRuntime<T: Transport> {
    session: GameSession,
    adapter: TransportAdapter<T>,
    intents: mpsc::Receiver<LocalIntent>,
    updates: mpsc::Sender<SessionUpdate>,
}

impl<T: Transport> SessionRuntime<T> {
    /// Assemble a runtime over an unconnected adapter.
    ///
    /// Returns the runtime together with the intent sender and update
    /// receiver handed to the presentation binding.
    pub fn new(
        session: GameSession,
        adapter: TransportAdapter<T>,
        config: RuntimeConfig,
    ) -> (Self, mpsc::Sender<LocalIntent>, mpsc::Receiver<SessionUpdate>) {
        let (intent_tx, intent_rx) = mpsc::channel(config.update_capacity);
        let (update_tx, update_rx) = mpsc::channel(config.update_capacity);

        let runtime =
            Self { session, adapter, intents: intent_rx, updates: update_tx };
        (runtime, intent_tx, update_rx)
    }

    /// Run until the presentation binding goes away or the reconnect policy
    /// gives up.
    ///
    /// Connects, requests the initial full state, then processes inputs in
    /// strict arrival order.
    ///
    /// # Errors
    ///
    /// Only the initial connection failure is fatal; later drops go through
    /// the reconnect/resync path.
    pub async fn run(mut self) -> Result<(), RuntimeError<T::Error>> {
        self.adapter.connect().await.map_err(RuntimeError::Connect)?;
        self.try_send(ClientIntent::RequestFullState).await;
        self.publish(Vec::new()).await;

        loop {
            let tick = tokio::time::sleep(self.session.clocks().tick_interval());
            tokio::pin!(tick);

            tokio::select! {
                maybe_intent = self.intents.recv() => {
                    let Some(intent) = maybe_intent else {
                        // Presentation binding dropped its sender; the view
                        // navigated away and the session is discarded.
                        break;
                    };
                    self.process_intent(intent).await;
                },
                adapter_event = self.adapter.next() => {
                    match adapter_event {
                        AdapterEvent::Event(event) => self.process_event(event).await,
                        AdapterEvent::Reconnected { attempts } => {
                            debug!(attempts, "resyncing after reconnect");
                            self.try_send(ClientIntent::RequestFullState).await;
                            self.publish(vec![UpdateNotice::Reconnected]).await;
                        },
                        AdapterEvent::Closed => {
                            self.publish(Vec::new()).await;
                            break;
                        },
                    }
                },
                () = &mut tick => {
                    let actions = self.session.tick(Instant::now());
                    self.execute(actions).await;
                },
            }
        }

        self.adapter.shutdown().await;
        Ok(())
    }

    async fn process_intent(&mut self, intent: LocalIntent) {
        match self.session.handle_intent(intent) {
            Ok(actions) => self.execute(actions).await,
            Err(rejection) => {
                debug!(%rejection, "intent rejected locally");
                self.publish(vec![UpdateNotice::Rejected(rejection)]).await;
            },
        }
    }

    async fn process_event(&mut self, event: tempo_proto::ServerEvent) {
        match self.session.handle_event(event, Instant::now()) {
            Ok(actions) => self.execute(actions).await,
            Err(error) => {
                // A payload we could not parse leaves the position suspect;
                // recover the same way as a sequence gap.
                warn!(%error, "malformed event, requesting resync");
                self.try_send(ClientIntent::RequestFullState).await;
                self.publish(vec![UpdateNotice::Resyncing]).await;
            },
        }
    }

    async fn execute(&mut self, actions: Vec<SessionAction>) {
        let mut notices = Vec::new();
        for action in actions {
            match action {
                SessionAction::Send(intent) => self.try_send(intent).await,
                SessionAction::Notice(notice) => notices.push(match notice {
                    SessionNotice::ServerBounce { code, message } => {
                        UpdateNotice::Bounce { code, message }
                    },
                    SessionNotice::Resyncing => UpdateNotice::Resyncing,
                }),
            }
        }
        self.publish(notices).await;
    }

    /// Transmit an intent, absorbing failures.
    ///
    /// A failed send is not retried — a retry could double-submit a move.
    /// The drop will surface through the receive path and trigger
    /// reconnect-plus-resync.
    async fn try_send(&mut self, intent: ClientIntent) {
        if let Err(error) = self.adapter.send(intent).await {
            warn!(%error, "intent transmission failed");
        }
    }

    async fn publish(&mut self, notices: Vec<UpdateNotice>) {
        let now = Instant::now();
        let session = &self.session;
        let update = SessionUpdate {
            status: session.status(),
            fen: session.position().map(tempo_core::Position::fen),
            side_to_move: session.side_to_move(),
            local_side: session.local_side(),
            clocks: session.clocks().snapshot(),
            clocks_unconfirmed: session.clocks().is_unconfirmed(now),
            pending_draw_offer: session.pending_draw_offer(),
            move_pending: session.pending_move().is_some(),
            outcome: session.outcome(),
            move_log: session.move_log().to_vec(),
            connection: self.adapter.status(),
            notices,
        };

        // The update channel closing means the presentation is gone; the
        // intent channel will close right behind it and end the loop.
        let _ = self.updates.send(update).await;
    }
}

//! Tempo session synchronization core logic
//!
//! Pure state machine logic for keeping a client's view of an ongoing
//! two-player clocked game consistent with a server-authoritative source of
//! truth, completely decoupled from I/O.
//!
//! # Architecture
//!
//! The session, clock, and rules components are deterministic state machines
//! isolated from I/O, time, and scheduling. Time is passed in as a parameter;
//! state transitions produce declarative actions that describe intended
//! effects (send this intent, surface this notice) rather than executing
//! them. A runtime or test harness interprets and executes the actions.
//!
//! This separation keeps reconciliation correctness independent of execution
//! concerns and allows the same code to run in the production client and in
//! deterministic tests.
//!
//! # Components
//!
//! - [`session`]: Session state machine (intents, remote events, lifecycle)
//! - [`clock`]: Clock model (advisory countdown, authoritative corrections)
//! - [`oracle`]: Rules oracle (local legality pre-checks, never the source
//!   of truth)
//! - [`transport`]: Push-channel abstraction implemented by adapters
//! - [`error`]: Intent, oracle, and reconciliation error types

pub mod clock;
pub mod error;
pub mod oracle;
pub mod session;
pub mod transport;

pub use clock::{ClockConfig, ClockModel};
pub use error::{IntentError, OracleError, SessionError};
pub use oracle::{AppliedMove, MoveRequest, Position};
pub use session::{GameSession, LocalIntent, SessionAction, SessionNotice, SessionStatus};
pub use transport::Transport;

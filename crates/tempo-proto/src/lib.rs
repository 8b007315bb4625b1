//! Wire-level event taxonomy for the Tempo synchronization protocol.
//!
//! A game session is kept in sync through two closed enums: outgoing
//! [`ClientIntent`]s (locally-initiated, not-yet-confirmed action requests)
//! and incoming [`ServerEvent`]s (server-pushed facts the client reconciles
//! into its session state). Making both taxonomies closed enums keeps
//! reconciliation exhaustiveness-checkable, instead of spreading it across
//! independently registered callbacks with implicit ordering assumptions.
//!
//! Payloads are serialized as CBOR values. Framing below the CBOR layer
//! (length prefixes, stream multiplexing) is the transport's concern.
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod codec;
pub mod errors;
pub mod event;
pub mod intent;
pub mod types;

pub use codec::{decode_event, decode_intent, encode_event, encode_intent};
pub use errors::ProtocolError;
pub use event::ServerEvent;
pub use intent::ClientIntent;
pub use types::{
    ClockSnapshot, Color, ErrorCode, GameOutcome, OutcomeReason, PlayerId, PlayerRef, Players,
    Promotion, SessionId, WirePosition, WireStatus,
};

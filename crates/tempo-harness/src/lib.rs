//! Deterministic test harness for the Tempo synchronization engine.
//!
//! Provides an in-memory scripted server implementing the [`Transport`]
//! trait, a seeded environment for reproducible identifiers, and shared
//! fixtures, so integration tests can drive the real client runtime through
//! arbitrary event sequences — including duplicates, gaps, and channel
//! drops — without a network.
//!
//! [`Transport`]: tempo_core::Transport

pub mod fixtures;
pub mod sim_env;
pub mod sim_server;

pub use sim_env::SimEnv;
pub use sim_server::{ChannelClosed, ScriptedServer, ServerHandle};

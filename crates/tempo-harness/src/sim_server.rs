//! Scripted in-memory server.
//!
//! Implements [`Transport`] over tokio channels. A test holds the
//! [`ServerHandle`] and plays the server's side: pushing events (in any
//! order, with duplicates), inspecting transmitted intents, and dropping the
//! channel to exercise the reconnect path.

use std::sync::{
    Arc,
    atomic::{AtomicU32, Ordering},
};

use async_trait::async_trait;
use tempo_core::Transport;
use tempo_proto::{ClientIntent, ServerEvent, SessionId};
use thiserror::Error;
use tokio::sync::mpsc;

/// The scripted channel was closed by the test.
#[derive(Debug, Error)]
#[error("scripted channel closed")]
pub struct ChannelClosed;

enum Frame {
    Event(ServerEvent),
    Drop,
}

/// Client-side half: a [`Transport`] backed by in-memory channels.
pub struct ScriptedServer {
    frames: mpsc::UnboundedReceiver<Frame>,
    intents: mpsc::UnboundedSender<ClientIntent>,
    connects: Arc<AtomicU32>,
}

/// Test-side half: push events, read intents, drop the channel.
pub struct ServerHandle {
    frames: mpsc::UnboundedSender<Frame>,
    intents: mpsc::UnboundedReceiver<ClientIntent>,
    connects: Arc<AtomicU32>,
}

impl ScriptedServer {
    /// Create a connected pair of halves.
    #[must_use]
    pub fn new() -> (Self, ServerHandle) {
        let (frame_tx, frame_rx) = mpsc::unbounded_channel();
        let (intent_tx, intent_rx) = mpsc::unbounded_channel();
        let connects = Arc::new(AtomicU32::new(0));

        let server = Self {
            frames: frame_rx,
            intents: intent_tx,
            connects: Arc::clone(&connects),
        };
        let handle = ServerHandle { frames: frame_tx, intents: intent_rx, connects };
        (server, handle)
    }
}

#[async_trait]
impl Transport for ScriptedServer {
    type Error = ChannelClosed;

    async fn connect(&mut self, _session_id: SessionId) -> Result<(), Self::Error> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn send(&mut self, intent: ClientIntent) -> Result<(), Self::Error> {
        self.intents.send(intent).map_err(|_| ChannelClosed)
    }

    async fn recv(&mut self) -> Option<ServerEvent> {
        match self.frames.recv().await {
            Some(Frame::Event(event)) => Some(event),
            // A scripted drop or the handle going away both read as a
            // channel drop to the adapter.
            Some(Frame::Drop) | None => None,
        }
    }

    async fn disconnect(&mut self) {}
}

impl ServerHandle {
    /// Push an event toward the client.
    pub fn push(&self, event: ServerEvent) {
        let _ = self.frames.send(Frame::Event(event));
    }

    /// Sever the channel once; the client sees a drop and reconnects.
    pub fn drop_channel(&self) {
        let _ = self.frames.send(Frame::Drop);
    }

    /// Wait for the next intent the client transmitted.
    pub async fn next_intent(&mut self) -> Option<ClientIntent> {
        self.intents.recv().await
    }

    /// Non-blocking read of a transmitted intent.
    pub fn try_next_intent(&mut self) -> Option<ClientIntent> {
        self.intents.try_recv().ok()
    }

    /// How many times the client has (re)connected.
    #[must_use]
    pub fn connect_count(&self) -> u32 {
        self.connects.load(Ordering::SeqCst)
    }
}

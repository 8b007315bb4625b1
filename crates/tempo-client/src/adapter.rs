//! Transport adapter: reconnection and delivery over the push channel.
//!
//! The adapter owns the single persistent channel for a session. When the
//! channel drops it reconnects under an exponential backoff policy and
//! reports the reconnection to the runtime, which must re-request a full
//! state before resuming event processing — events missed during the drop
//! are unrecoverable by sequence-patching.

use std::time::Duration;

use tempo_core::Transport;
use tempo_proto::{ClientIntent, ServerEvent, SessionId};
use tracing::{info, warn};

/// Exponential backoff policy for reconnect attempts.
///
/// Delay for attempt `n` (zero-based) is `initial_delay * 2^n`, capped at
/// `max_delay`. Attempts are unbounded by default: resync-on-demand is
/// unlimited, and giving up is a product decision, not a correctness one.
#[derive(Debug, Clone, Copy)]
pub struct ReconnectPolicy {
    /// Delay before the first reconnect attempt.
    pub initial_delay: Duration,
    /// Upper bound on the backoff delay.
    pub max_delay: Duration,
    /// Give up after this many failed attempts, if set.
    pub max_attempts: Option<u32>,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            max_attempts: None,
        }
    }
}

impl ReconnectPolicy {
    /// Backoff delay for the given zero-based attempt number.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.initial_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Whether another attempt is permitted.
    #[must_use]
    pub fn allows(&self, attempt: u32) -> bool {
        self.max_attempts.is_none_or(|max| attempt < max)
    }
}

/// Connection state surfaced to the presentation binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// Channel established.
    Connected,
    /// Channel dropped; reconnect in progress.
    Reconnecting {
        /// Zero-based attempt number.
        attempt: u32,
    },
    /// Reconnect attempts exhausted; the channel stays down.
    Closed,
}

/// What the adapter delivered to the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterEvent {
    /// A pushed server event, in order.
    Event(ServerEvent),
    /// The channel dropped and was reestablished. The runtime must request
    /// a full state before processing further events.
    Reconnected {
        /// How many attempts the reconnect took.
        attempts: u32,
    },
    /// The channel dropped and the policy exhausted its attempts.
    Closed,
}

/// Owns the persistent push channel for one session.
#[derive(Debug)]
pub struct TransportAdapter<T: Transport> {
    transport: T,
    session_id: SessionId,
    policy: ReconnectPolicy,
    status: ConnectionStatus,
}

impl<T: Transport> TransportAdapter<T> {
    /// Wrap a transport for the given session.
    pub fn new(transport: T, session_id: SessionId, policy: ReconnectPolicy) -> Self {
        Self { transport, session_id, policy, status: ConnectionStatus::Closed }
    }

    /// Establish the initial connection.
    ///
    /// # Errors
    ///
    /// Returns the transport's error if the channel cannot be established;
    /// the backoff policy applies only to reconnects after an initial
    /// success.
    pub async fn connect(&mut self) -> Result<(), T::Error> {
        self.transport.connect(self.session_id).await?;
        self.status = ConnectionStatus::Connected;
        Ok(())
    }

    /// Transmit an intent.
    ///
    /// # Errors
    ///
    /// Returns the transport's error; the caller logs it and relies on the
    /// reconnect path rather than retrying the intent (a retry could
    /// double-submit a move).
    pub async fn send(&mut self, intent: ClientIntent) -> Result<(), T::Error> {
        self.transport.send(intent).await
    }

    /// Current connection status.
    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    /// Wait for the next event, reconnecting through drops.
    pub async fn next(&mut self) -> AdapterEvent {
        if self.status == ConnectionStatus::Closed {
            return AdapterEvent::Closed;
        }
        match self.transport.recv().await {
            Some(event) => AdapterEvent::Event(event),
            None => self.reconnect().await,
        }
    }

    /// Tear the channel down for good.
    pub async fn shutdown(&mut self) {
        self.transport.disconnect().await;
        self.status = ConnectionStatus::Closed;
    }

    async fn reconnect(&mut self) -> AdapterEvent {
        warn!(session = %self.session_id, "push channel dropped");
        self.transport.disconnect().await;

        let mut attempt = 0;
        loop {
            if !self.policy.allows(attempt) {
                warn!(session = %self.session_id, attempt, "reconnect attempts exhausted");
                self.status = ConnectionStatus::Closed;
                return AdapterEvent::Closed;
            }

            self.status = ConnectionStatus::Reconnecting { attempt };
            tokio::time::sleep(self.policy.delay_for(attempt)).await;

            match self.transport.connect(self.session_id).await {
                Ok(()) => {
                    self.status = ConnectionStatus::Connected;
                    info!(session = %self.session_id, attempt, "push channel reestablished");
                    return AdapterEvent::Reconnected { attempts: attempt + 1 };
                },
                Err(error) => {
                    warn!(session = %self.session_id, attempt, %error, "reconnect failed");
                    attempt += 1;
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_up_to_cap() {
        let policy = ReconnectPolicy {
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            max_attempts: None,
        };

        assert_eq!(policy.delay_for(0), Duration::from_millis(500));
        assert_eq!(policy.delay_for(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for(2), Duration::from_secs(2));
        assert_eq!(policy.delay_for(6), Duration::from_secs(30));
        // Far past the cap, including exponent overflow territory.
        assert_eq!(policy.delay_for(40), Duration::from_secs(30));
    }

    #[test]
    fn unbounded_attempts_by_default() {
        let policy = ReconnectPolicy::default();
        assert!(policy.allows(0));
        assert!(policy.allows(1_000_000));
    }

    #[test]
    fn bounded_attempts_exhaust() {
        let policy = ReconnectPolicy { max_attempts: Some(3), ..ReconnectPolicy::default() };
        assert!(policy.allows(0));
        assert!(policy.allows(2));
        assert!(!policy.allows(3));
    }
}

//! Seeded environment for deterministic harness runs.

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tempo_proto::{PlayerId, SessionId};

/// Deterministic source of identifiers for scripted scenarios.
///
/// The same seed always produces the same sequence, so a failing test can be
/// replayed exactly.
#[derive(Debug, Clone)]
pub struct SimEnv {
    rng: ChaCha8Rng,
}

impl SimEnv {
    /// Create an environment from a seed.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self { rng: ChaCha8Rng::seed_from_u64(seed) }
    }

    /// Next random 64-bit value.
    pub fn random_u64(&mut self) -> u64 {
        self.rng.next_u64()
    }

    /// Next session identifier.
    pub fn session_id(&mut self) -> SessionId {
        SessionId(self.random_u64())
    }

    /// Next player identifier.
    pub fn player_id(&mut self) -> PlayerId {
        PlayerId(self.random_u64())
    }
}

//! Clock model: two countdown timers corrected by authoritative snapshots.
//!
//! The model ticks locally between server updates so the display moves, but
//! the local countdown is advisory only. Drift is resolved solely by the next
//! authoritative snapshot ([`ClockModel::apply_snapshot`]), which the server
//! emits on every move and at a minimum heartbeat interval while a clock is
//! running. The model never estimates network latency and never declares a
//! timeout: a clock reaching zero locally changes nothing until the server
//! confirms the time forfeit.
//!
//! Time is passed in as a parameter; the model never reads a clock itself.

use std::time::{Duration, Instant};

use tempo_proto::{ClockSnapshot, Color};

/// Clock model configuration.
#[derive(Debug, Clone, Copy)]
pub struct ClockConfig {
    /// Below this remaining time, the advisory tick rate increases to 10
    /// ticks per second for visual fidelity near time-forfeit.
    pub low_time_threshold: Duration,
    /// Without an authoritative snapshot for this long while ticking, the
    /// display is marked unconfirmed.
    pub staleness_threshold: Duration,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            low_time_threshold: Duration::from_secs(10),
            staleness_threshold: Duration::from_secs(10),
        }
    }
}

/// Two countdown timers, one per side, owned by the session.
///
/// Mutated only through this API: local ticking via [`ClockModel::tick`] and
/// authoritative corrections via [`ClockModel::apply_snapshot`].
#[derive(Debug, Clone)]
pub struct ClockModel {
    white_remaining: Duration,
    black_remaining: Duration,
    running_side: Option<Color>,
    last_tick: Option<Instant>,
    last_snapshot: Option<Instant>,
    stopped: bool,
    config: ClockConfig,
}

impl ClockModel {
    /// Create a clock model with no time on either side and nothing running.
    #[must_use]
    pub fn new(config: ClockConfig) -> Self {
        Self {
            white_remaining: Duration::ZERO,
            black_remaining: Duration::ZERO,
            running_side: None,
            last_tick: None,
            last_snapshot: None,
            stopped: false,
            config,
        }
    }

    /// Unconditionally adopt authoritative values and restart local ticking.
    ///
    /// This is the only correction mechanism: whatever the local countdown
    /// had drifted to is discarded.
    pub fn apply_snapshot(&mut self, snapshot: &ClockSnapshot, now: Instant) {
        self.white_remaining = Duration::from_millis(snapshot.white_remaining_ms);
        self.black_remaining = Duration::from_millis(snapshot.black_remaining_ms);
        self.running_side = snapshot.running_side;
        self.last_tick = Some(now);
        self.last_snapshot = Some(now);
        self.stopped = false;
    }

    /// Begin (or re-aim) the local countdown for a side.
    ///
    /// Keeps the current remaining values; only the running side changes.
    /// Authoritative snapshots do this implicitly, so this is needed only
    /// when the product wants the display moving before the first snapshot
    /// lands.
    pub fn start_ticking(&mut self, side: Color, now: Instant) {
        self.running_side = Some(side);
        self.last_tick = Some(now);
        self.stopped = false;
    }

    /// Advance the advisory countdown for the running side.
    ///
    /// Floored at zero; never transitions any state. Call at the cadence
    /// suggested by [`ClockModel::tick_interval`].
    pub fn tick(&mut self, now: Instant) {
        if self.stopped {
            return;
        }
        let Some(side) = self.running_side else { return };
        let Some(last) = self.last_tick else {
            self.last_tick = Some(now);
            return;
        };

        let elapsed = now.saturating_duration_since(last);
        self.last_tick = Some(now);

        match side {
            Color::White => {
                self.white_remaining = self.white_remaining.saturating_sub(elapsed);
            },
            Color::Black => {
                self.black_remaining = self.black_remaining.saturating_sub(elapsed);
            },
        }
    }

    /// Halt ticking. Used when the session reaches a terminal state.
    pub fn stop(&mut self) {
        self.stopped = true;
        self.last_tick = None;
    }

    /// Remaining time for a side.
    #[must_use]
    pub fn remaining(&self, side: Color) -> Duration {
        match side {
            Color::White => self.white_remaining,
            Color::Black => self.black_remaining,
        }
    }

    /// Which side's clock is counting down, if any.
    #[must_use]
    pub fn running_side(&self) -> Option<Color> {
        if self.stopped { None } else { self.running_side }
    }

    /// Suggested local tick cadence.
    ///
    /// 10 ticks per second when either side is under the low-time threshold,
    /// else 1 tick per second. Purely cosmetic resolution.
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        if self.running_side().is_none() {
            return Duration::from_secs(1);
        }
        let lowest = self.white_remaining.min(self.black_remaining);
        if lowest < self.config.low_time_threshold {
            Duration::from_millis(100)
        } else {
            Duration::from_secs(1)
        }
    }

    /// Whether the displayed values are running on borrowed trust.
    ///
    /// True when no authoritative snapshot has arrived within the staleness
    /// threshold while a clock is running. A presentation concern only; the
    /// model keeps ticking optimistically.
    #[must_use]
    pub fn is_unconfirmed(&self, now: Instant) -> bool {
        if self.stopped || self.running_side.is_none() {
            return false;
        }
        match self.last_snapshot {
            Some(at) => now.saturating_duration_since(at) > self.config.staleness_threshold,
            None => false,
        }
    }

    /// Current values as a snapshot, for display.
    #[must_use]
    pub fn snapshot(&self) -> ClockSnapshot {
        ClockSnapshot {
            white_remaining_ms: self.white_remaining.as_millis() as u64,
            black_remaining_ms: self.black_remaining.as_millis() as u64,
            running_side: self.running_side(),
        }
    }
}

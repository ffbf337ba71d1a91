use serde::{Deserialize, Serialize};

/// Simulation time in milliseconds. Never derived from the wall clock.
pub type Millis = f64;

/// Monotonic simulation clock advanced only by explicit deltas.
///
/// When the host loop stops calling [`SimClock::advance`], every timer measured
/// against this clock freezes with it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SimClock {
    now: Millis,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the clock at an arbitrary offset (useful for replays).
    pub fn starting_at(now: Millis) -> Self {
        Self { now: now.max(0.0) }
    }

    /// Current simulation time.
    pub fn now(&self) -> Millis {
        self.now
    }

    /// Advance by `delta` milliseconds. Negative or non-finite deltas are ignored.
    pub fn advance(&mut self, delta: Millis) -> Millis {
        if delta.is_finite() && delta > 0.0 {
            self.now += delta;
        }
        self.now
    }
}

/// Remaining time of a span that started at `start` and lasts `duration`,
/// measured at `now`. Never negative.
pub fn remaining(start: Millis, duration: Millis, now: Millis) -> Millis {
    (duration - (now - start)).max(0.0)
}

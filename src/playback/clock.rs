use std::cell::Cell;

/// Monotonic wall clock in seconds.
pub trait Clock {
    /// Seconds since an arbitrary fixed origin.
    fn now_secs(&self) -> f64;
}

/// Hand-driven clock for deterministic playback.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<f64>,
}

impl ManualClock {
    /// Clock starting at `secs`.
    pub fn starting_at(secs: f64) -> Self {
        Self {
            now: Cell::new(secs),
        }
    }

    /// Move time forward.
    pub fn advance(&self, secs: f64) {
        self.now.set(self.now.get() + secs);
    }
}

impl Clock for ManualClock {
    fn now_secs(&self) -> f64 {
        self.now.get()
    }
}

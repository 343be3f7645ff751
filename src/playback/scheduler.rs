use crate::foundation::error::{GiftbeatError, GiftbeatResult};

/// Token for the next frame callback; stale tokens are ignored.
///
/// Pausing, seeking and finishing all invalidate outstanding tokens, so a callback scheduled
/// before one of those never renders.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameRequest {
    generation: u64,
}

/// Scheduler state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PlaybackState {
    /// Not playing; the last rendered position stays on screen.
    Stopped,
    /// Playing; timeline position is `now - anchor`.
    Playing {
        /// Wall-clock time corresponding to timeline position 0.
        anchor: f64,
    },
}

/// Result of one [`PlaybackScheduler::tick`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TickOutcome {
    /// The request was stale; nothing to do.
    Cancelled,
    /// Render timeline time `t`, then call back with `next`.
    Render {
        /// Timeline position to render.
        t: f64,
        /// Request for the following tick.
        next: FrameRequest,
    },
    /// Playback reached the end; position reset to 0 and playback stopped.
    Finished,
}

/// Wall-clock anchored playback state machine.
///
/// The scheduler does not render; its owner renders whatever [`TickOutcome::Render`] asks for.
#[derive(Clone, Debug)]
pub struct PlaybackScheduler {
    state: PlaybackState,
    position: f64,
    generation: u64,
}

impl Default for PlaybackScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackScheduler {
    /// Stopped at position 0.
    pub fn new() -> Self {
        Self {
            state: PlaybackState::Stopped,
            position: 0.0,
            generation: 0,
        }
    }

    /// Current state.
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Whether playback is active.
    pub fn is_playing(&self) -> bool {
        matches!(self.state, PlaybackState::Playing { .. })
    }

    /// Last position rendered or sought to.
    pub fn position(&self) -> f64 {
        self.position
    }

    /// Start playing from `from` at wall time `now`.
    pub fn play(&mut self, from: f64, now: f64, total: f64) -> GiftbeatResult<FrameRequest> {
        if total <= 0.0 {
            return Err(GiftbeatError::validation("nothing to play: timeline is empty"));
        }
        let from = clamp_position(from, total);
        self.position = from;
        self.state = PlaybackState::Playing { anchor: now - from };
        tracing::debug!(from, "playback started");
        Ok(self.invalidate())
    }

    /// Halt at the current position. Outstanding requests become stale.
    pub fn pause(&mut self) -> f64 {
        if self.is_playing() {
            tracing::debug!(at = self.position, "playback paused");
        }
        self.state = PlaybackState::Stopped;
        self.invalidate();
        self.position
    }

    /// Stop and rewind to 0.
    pub fn stop(&mut self) {
        self.state = PlaybackState::Stopped;
        self.position = 0.0;
        self.invalidate();
    }

    /// Jump to `time`, clamped to `[0, total]`.
    ///
    /// Returns the clamped position and, when playback was active, the request of the restarted
    /// loop.
    pub fn seek(&mut self, time: f64, now: f64, total: f64) -> (f64, Option<FrameRequest>) {
        let t = clamp_position(time, total);
        let was_playing = self.is_playing();
        self.pause();
        self.position = t;
        if was_playing && let Ok(req) = self.play(t, now, total) {
            return (t, Some(req));
        }
        (t, None)
    }

    /// Advance by wall clock.
    pub fn tick(&mut self, req: FrameRequest, now: f64, total: f64) -> TickOutcome {
        let PlaybackState::Playing { anchor } = self.state else {
            return TickOutcome::Cancelled;
        };
        if req.generation != self.generation {
            return TickOutcome::Cancelled;
        }
        let elapsed = now - anchor;
        if elapsed >= total {
            tracing::debug!("playback finished");
            self.stop();
            return TickOutcome::Finished;
        }
        self.position = elapsed.max(0.0);
        TickOutcome::Render {
            t: self.position,
            next: req,
        }
    }

    fn invalidate(&mut self) -> FrameRequest {
        self.generation = self.generation.wrapping_add(1);
        FrameRequest {
            generation: self.generation,
        }
    }
}

fn clamp_position(t: f64, total: f64) -> f64 {
    if t.is_nan() {
        return 0.0;
    }
    t.clamp(0.0, total.max(0.0))
}

#[cfg(test)]
#[path = "../../tests/unit/playback/scheduler.rs"]
mod tests;

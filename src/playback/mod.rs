/// Time sources.
pub mod clock;
pub mod scheduler;

pub use clock::{Clock, ManualClock};
pub use scheduler::{FrameRequest, PlaybackScheduler, PlaybackState, TickOutcome};

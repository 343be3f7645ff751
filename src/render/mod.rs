pub mod draw;
pub mod fit;
pub mod frame;
/// Frame planning and the timeline renderer.
pub mod renderer;
/// Transition compositing.
pub mod transitions;

pub use frame::FrameRGBA;
pub use renderer::{FramePlan, PlannedSource, RenderedFrame, Renderer, plan_frame};

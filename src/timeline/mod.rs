/// Serialized projection exchanged with the host and project files.
pub mod interchange;
/// Clips and the prefix-summed timeline.
pub mod model;
/// Transition kinds and limits.
pub mod transition;

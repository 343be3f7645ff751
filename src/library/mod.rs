/// Media library: ingested assets keyed by id.
pub mod media_library;
/// Scoped resource handles (object-URL analogue) with explicit release.
pub mod resources;

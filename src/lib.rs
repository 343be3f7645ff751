//! GiftBeat: a timeline compositing engine for image slideshows.
//!
//! A [`MediaLibrary`] holds ingested assets behind scoped resource handles, a [`Timeline`] places
//! them back to back with per-clip transitions, the [`Renderer`] composites any timestamp into a
//! premultiplied RGBA frame, the [`PlaybackScheduler`] maps wall-clock ticks onto timeline time,
//! and the [`Exporter`] steps through the whole timeline into a [`FrameSink`] (an ffmpeg-backed
//! MP4 sink is included). [`EditorSession`] ties it together behind a command surface.
//!
//! Video assets decode through the system `ffmpeg`/`ffprobe` binaries and need the
//! `media-ffmpeg` feature.
#![forbid(unsafe_code)]

/// Decoding and caching of image and video assets.
pub mod assets;
/// Engine options.
pub mod config;
/// Frame sinks and the offline exporter.
pub mod export;
/// Core value types, errors, and pixel math.
pub mod foundation;
/// Media library and resource handles.
pub mod library;
/// Wall-clock playback scheduling.
pub mod playback;
/// Frame planning and compositing.
pub mod render;
pub mod session;
/// Clips, transitions, and the serialized project projection.
pub mod timeline;

pub use assets::cache::{AssetCache, VideoDecoder, VideoSeek, VideoStream};
pub use config::EngineConfig;
pub use export::{
    CancelToken, EncodedVideo, ExportOpts, ExportOutcome, ExportSource, Exporter, FfmpegSink,
    FfmpegSinkOpts, FrameSink, InMemorySink, SinkConfig,
};
pub use foundation::core::{AspectRatio, Canvas, Fps, FrameIndex, Resolution};
pub use foundation::error::{GiftbeatError, GiftbeatResult};
pub use library::media_library::{
    IncomingFile, IngestReport, LibraryItem, LibraryItemId, MediaKind, MediaLibrary, VideoPolicy,
};
pub use library::resources::{ResourceHandle, ResourceRegistry};
pub use playback::{PlaybackScheduler, PlaybackState, TickOutcome};
pub use render::{FrameRGBA, FramePlan, Renderer, fit::FitMode};
pub use session::{EditorSession, ExportArtifact, PlaybackTick, SessionEvent};
pub use timeline::interchange::{ProjectSnapshot, SerializedLibraryItem, SerializedTimelineItem};
pub use timeline::model::{ClipId, ClipTransition, MoveDirection, Timeline, TimelineClip};
pub use timeline::transition::TransitionKind;

//! The editor session: one owner for library, timeline, resources, caches and playback.
//!
//! Every command validates before it mutates, so a rejected command leaves no trace. Successful
//! mutations queue a [`SessionEvent::StateChanged`] carrying the serialized projection; hosts drain
//! the queue with [`EditorSession::take_events`].

use std::{collections::HashSet, path::Path};

use crate::{
    assets::cache::{AssetCache, VideoDecoder},
    config::EngineConfig,
    export::{
        exporter::{CancelToken, ExportOpts, ExportOutcome, ExportSource, Exporter},
        sink::FrameSink,
    },
    foundation::error::{GiftbeatError, GiftbeatResult},
    library::{
        media_library::{IncomingFile, IngestReport, LibraryItemId, MediaKind, MediaLibrary},
        resources::{ResourceHandle, ResourceRegistry},
    },
    playback::scheduler::{FrameRequest, PlaybackScheduler, TickOutcome},
    render::{frame::FrameRGBA, renderer::Renderer},
    timeline::{
        interchange::{ProjectSnapshot, hydrate},
        model::{ClipId, ClipTransition, MoveDirection, Timeline},
        transition::{DEFAULT_TRANSITION_SECS, TransitionKind, clamp_transition_secs},
    },
};

/// Transition length used by [`EditorSession::build_slideshow`].
pub const SLIDESHOW_TRANSITION_SECS: f64 = 1.0;
/// Default per-image duration of [`EditorSession::build_slideshow`].
pub const SLIDESHOW_IMAGE_SECS: f64 = 4.0;

/// Something the host should know about.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionEvent {
    /// Library or timeline changed; carries the current projection.
    StateChanged(ProjectSnapshot),
    /// Non-fatal problem, reported once per distinct message.
    Advisory(String),
    /// An export finished and its artifact is registered.
    ExportSucceeded(ExportArtifact),
    /// An export failed; nothing was produced.
    ExportFailed(String),
}

/// A finished export, held as a resource handle until the session is torn down.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportArtifact {
    /// Handle to the encoded bytes.
    pub handle: ResourceHandle,
    /// MIME type of the bytes.
    pub mime: String,
    /// Frames encoded.
    pub frames: u64,
}

/// What one [`EditorSession::tick`] did.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PlaybackTick {
    /// Not playing.
    Idle,
    /// Rendered the frame at this timeline time.
    Rendered(f64),
    /// Reached the end; playback stopped and rewound.
    Finished,
}

/// Owns the engine state for one editing session.
pub struct EditorSession {
    config: EngineConfig,
    registry: ResourceRegistry,
    library: MediaLibrary,
    timeline: Timeline,
    cache: AssetCache,
    scheduler: PlaybackScheduler,
    pending: Option<FrameRequest>,
    preview: Renderer,
    preview_frame: FrameRGBA,
    preview_dirty: bool,
    default_transition: ClipTransition,
    hydrated: bool,
    events: Vec<SessionEvent>,
    advised: HashSet<String>,
}

impl std::fmt::Debug for EditorSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorSession")
            .field("library", &self.library.len())
            .field("clips", &self.timeline.len())
            .field("position", &self.scheduler.position())
            .field("playing", &self.scheduler.is_playing())
            .finish_non_exhaustive()
    }
}

impl EditorSession {
    /// New empty session using the ffmpeg video decoder.
    pub fn new(config: EngineConfig) -> GiftbeatResult<Self> {
        let cache = AssetCache::new(config.video_resync_tolerance_secs);
        Self::with_cache(config, cache)
    }

    /// New empty session with a custom video decoder.
    pub fn with_video_decoder(
        config: EngineConfig,
        decoder: Box<dyn VideoDecoder>,
    ) -> GiftbeatResult<Self> {
        let cache = AssetCache::with_video_decoder(config.video_resync_tolerance_secs, decoder);
        Self::with_cache(config, cache)
    }

    fn with_cache(config: EngineConfig, cache: AssetCache) -> GiftbeatResult<Self> {
        config.validate()?;
        let preview = Renderer::new(config.preview_canvas, config.fit, config.background_rgba);
        let default_transition = ClipTransition {
            kind: config.default_transition,
            secs: Some(config.default_transition_secs),
        };
        Ok(Self {
            preview_frame: preview.blank(),
            preview,
            registry: ResourceRegistry::new(),
            library: MediaLibrary::new(),
            timeline: Timeline::new(),
            cache,
            scheduler: PlaybackScheduler::new(),
            pending: None,
            preview_dirty: true,
            default_transition,
            hydrated: false,
            events: Vec::new(),
            advised: HashSet::new(),
            config,
        })
    }

    // --- library -------------------------------------------------------------------------------

    /// Ingest a batch of files. Rejections are per file and never fail the batch.
    pub fn add_files(&mut self, files: impl IntoIterator<Item = IncomingFile>) -> IngestReport {
        let report = self
            .library
            .add_files(files, &mut self.registry, self.config.video_uploads);
        if !report.accepted.is_empty() {
            self.changed();
        }
        report
    }

    /// Remove a library item, cascading to every clip that references it.
    ///
    /// Returns how many clips were removed.
    pub fn remove_library_item(&mut self, id: &LibraryItemId) -> GiftbeatResult<usize> {
        let source = self
            .library
            .get(id)
            .map(|it| it.source.clone())
            .ok_or_else(|| GiftbeatError::validation(format!("unknown library item '{id}'")))?;
        let removed_clips = self.timeline.remove_clips_for(id);
        self.library.remove(id, &mut self.registry);
        if !self.registry.is_live(&source) {
            self.cache.evict(&source);
        }
        tracing::debug!(item = %id, removed_clips, "library item removed");
        self.changed();
        Ok(removed_clips)
    }

    /// Record the intrinsic duration reported for a video item and fix up its clips.
    pub fn on_video_metadata(&mut self, id: &LibraryItemId, secs: f64) -> GiftbeatResult<usize> {
        self.library.resolve_video_duration(id, secs)?;
        let n = self.timeline.apply_video_duration(id, secs);
        self.changed();
        Ok(n)
    }

    /// Probe every video item whose duration is still unknown. Returns how many were resolved.
    pub fn probe_video_durations(&mut self) -> usize {
        let pending: Vec<(LibraryItemId, ResourceHandle)> = self
            .library
            .items()
            .iter()
            .filter(|it| it.kind == MediaKind::Video && it.duration.is_none())
            .map(|it| (it.id.clone(), it.source.clone()))
            .collect();
        let mut resolved = 0;
        for (id, handle) in pending {
            match self.cache.video_duration(&handle, &self.registry) {
                Ok(Some(secs)) => {
                    if self.on_video_metadata(&id, secs).is_ok() {
                        resolved += 1;
                    }
                }
                Ok(None) => {}
                Err(e) => self.advise(e.to_string()),
            }
        }
        resolved
    }

    // --- timeline ------------------------------------------------------------------------------

    /// Append a clip for `item` using the session's default transition.
    pub fn add_clip(&mut self, item: &LibraryItemId) -> GiftbeatResult<ClipId> {
        let id = self
            .timeline
            .add_clip(&self.library, item, self.default_transition)?;
        self.changed();
        Ok(id)
    }

    /// Remove one clip.
    pub fn remove_clip(&mut self, id: &ClipId) -> GiftbeatResult<()> {
        self.timeline.remove_clip(id)?;
        self.changed();
        Ok(())
    }

    /// Move a clip one slot; `false` at the boundaries.
    pub fn move_clip(&mut self, id: &ClipId, dir: MoveDirection) -> GiftbeatResult<bool> {
        let moved = self.timeline.move_clip(id, dir)?;
        if moved {
            self.changed();
        }
        Ok(moved)
    }

    /// Set an image clip's duration; returns the clamped value stored.
    pub fn set_duration(&mut self, id: &ClipId, secs: f64) -> GiftbeatResult<f64> {
        let stored = self.timeline.set_duration(id, secs)?;
        self.changed();
        Ok(stored)
    }

    /// Set a clip's transition.
    pub fn set_transition(
        &mut self,
        id: &ClipId,
        kind: TransitionKind,
        secs: Option<f64>,
    ) -> GiftbeatResult<ClipTransition> {
        let tr = self.timeline.set_transition(id, kind, secs)?;
        self.changed();
        Ok(tr)
    }

    /// Change the transition given to clips added from now on.
    pub fn set_default_transition(
        &mut self,
        kind: TransitionKind,
        secs: Option<f64>,
    ) -> GiftbeatResult<ClipTransition> {
        let secs = secs.map(clamp_transition_secs).transpose()?;
        self.default_transition = ClipTransition {
            kind,
            secs: Some(
                secs.or(self.default_transition.secs)
                    .unwrap_or(DEFAULT_TRANSITION_SECS),
            ),
        };
        Ok(self.default_transition)
    }

    /// Replace the timeline with one clip per library image, in library order.
    pub fn build_slideshow(&mut self, kind: TransitionKind, image_secs: f64) -> GiftbeatResult<usize> {
        if !image_secs.is_finite() {
            return Err(GiftbeatError::validation("image duration must be finite"));
        }
        let transition = match kind {
            TransitionKind::None => ClipTransition::none(),
            kind => ClipTransition::new(kind, SLIDESHOW_TRANSITION_SECS)?,
        };
        let clips: Vec<_> = self
            .library
            .items()
            .iter()
            .filter(|it| it.kind == MediaKind::Image)
            .map(|it| (it.id.clone(), image_secs, transition))
            .collect();
        if clips.is_empty() {
            return Err(GiftbeatError::validation(
                "upload at least one image to build a slideshow",
            ));
        }
        let n = clips.len();
        self.stop_playback();
        self.timeline.replace_all(clips);
        self.changed();
        Ok(n)
    }

    // --- playback ------------------------------------------------------------------------------

    /// Start playback from the current position at wall time `now`.
    ///
    /// Every image on the timeline is decoded before the first tick.
    pub fn play(&mut self, now: f64) -> GiftbeatResult<()> {
        let total = self.timeline.total_duration();
        if self.timeline.is_empty() {
            return Err(GiftbeatError::validation("add a clip to the timeline to play"));
        }
        let handles: Vec<ResourceHandle> = self
            .timeline
            .clips()
            .iter()
            .filter_map(|c| self.library.get(c.library_item_id()))
            .filter(|it| it.kind == MediaKind::Image)
            .map(|it| it.source.clone())
            .collect();
        let failed = self.cache.preload(handles.iter(), &self.registry);
        if failed > 0 {
            tracing::debug!(failed, "some images failed to preload");
        }
        let req = self.scheduler.play(self.scheduler.position(), now, total)?;
        self.pending = Some(req);
        Ok(())
    }

    /// Pause; the frame at the paused position stays on screen.
    pub fn pause(&mut self) -> f64 {
        let at = self.scheduler.pause();
        self.pending = None;
        self.redraw(at);
        at
    }

    /// Jump to `time` (clamped), rendering it immediately. Playback continues if it was active.
    pub fn seek(&mut self, time: f64, now: f64) -> f64 {
        let total = self.timeline.total_duration();
        let (t, restarted) = self.scheduler.seek(time, now, total);
        self.pending = restarted;
        self.redraw(t);
        t
    }

    /// Drive playback; call once per display refresh.
    pub fn tick(&mut self, now: f64) -> PlaybackTick {
        let Some(req) = self.pending else {
            return PlaybackTick::Idle;
        };
        let total = self.timeline.total_duration();
        match self.scheduler.tick(req, now, total) {
            TickOutcome::Cancelled => {
                self.pending = None;
                PlaybackTick::Idle
            }
            TickOutcome::Render { t, next } => {
                self.pending = Some(next);
                self.redraw(t);
                PlaybackTick::Rendered(t)
            }
            TickOutcome::Finished => {
                self.pending = None;
                self.redraw(0.0);
                PlaybackTick::Finished
            }
        }
    }

    /// The preview frame at the current position, re-rendered if state changed since.
    pub fn current_frame(&mut self) -> &FrameRGBA {
        if self.preview_dirty {
            let t = self.scheduler.position().min(self.timeline.total_duration());
            self.redraw(t);
        }
        &self.preview_frame
    }

    fn redraw(&mut self, t: f64) {
        let result = self.preview.render_into(
            &mut self.preview_frame,
            &self.timeline,
            &self.library,
            &self.registry,
            &mut self.cache,
            t,
        );
        self.preview_dirty = false;
        match result {
            Ok(None) => {}
            Ok(Some(advisory)) => self.advise(advisory),
            Err(e) => {
                self.preview_frame.clear(self.config.background_rgba);
                self.advise(e.to_string());
            }
        }
    }

    fn stop_playback(&mut self) {
        if self.scheduler.is_playing() {
            self.scheduler.pause();
        }
        self.pending = None;
    }

    // --- export --------------------------------------------------------------------------------

    /// Export the whole timeline into `sink` at the configured resolution and frame rate.
    ///
    /// Playback is stopped first. The export renders from a snapshot of the timeline and library
    /// taken here. Returns `None` when canceled.
    pub fn export(
        &mut self,
        sink: &mut dyn FrameSink,
        cancel: CancelToken,
        progress: impl FnMut(f64),
    ) -> GiftbeatResult<Option<ExportArtifact>> {
        self.stop_playback();
        let opts = ExportOpts {
            canvas: self.config.export_canvas(),
            fps: self.config.fps()?,
            fit: self.config.fit,
            background: self.config.background_rgba,
        };
        let timeline = self.timeline.clone();
        let library = self.library.clone();
        let result = Exporter::new(opts)
            .with_cancel(cancel)
            .on_progress(progress)
            .run(
                ExportSource {
                    timeline: &timeline,
                    library: &library,
                    registry: &self.registry,
                },
                &mut self.cache,
                sink,
            );

        match result {
            Ok(ExportOutcome::Completed(report)) => {
                for advisory in report.advisories {
                    self.advise(advisory);
                }
                let artifact = ExportArtifact {
                    handle: self.registry.acquire_bytes(report.video.bytes),
                    mime: report.video.mime,
                    frames: report.frames,
                };
                tracing::info!(frames = artifact.frames, handle = %artifact.handle, "export succeeded");
                self.events
                    .push(SessionEvent::ExportSucceeded(artifact.clone()));
                Ok(Some(artifact))
            }
            Ok(ExportOutcome::Canceled { .. }) => Ok(None),
            Err(e) => {
                self.events.push(SessionEvent::ExportFailed(e.to_string()));
                Err(e)
            }
        }
    }

    // --- interchange ---------------------------------------------------------------------------

    /// Hydrate from a saved projection, at most once per session.
    ///
    /// Returns `false` when ignored: the session was already hydrated, or the snapshot is empty
    /// (which does not use up the one hydration). URLs resolve relative to `root`.
    pub fn hydrate(&mut self, snapshot: &ProjectSnapshot, root: &Path) -> GiftbeatResult<bool> {
        if self.hydrated {
            tracing::debug!("ignoring hydration: session already hydrated");
            return Ok(false);
        }
        if snapshot.library_items.is_empty() && snapshot.timeline_items.is_empty() {
            return Ok(false);
        }

        let mut staged = ResourceRegistry::new();
        let restored = hydrate(snapshot, root, &mut staged)?;

        self.stop_playback();
        let old_ids: Vec<LibraryItemId> =
            self.library.items().iter().map(|it| it.id.clone()).collect();
        for id in &old_ids {
            if let Some(item) = self.library.remove(id, &mut self.registry) {
                self.cache.evict(&item.source);
            }
        }
        self.registry.absorb(staged);
        self.library = restored.library;
        self.timeline = restored.timeline;
        self.hydrated = true;
        for warning in restored.warnings {
            self.advise(warning);
        }
        self.changed();
        Ok(true)
    }

    /// Current serialized projection.
    pub fn snapshot(&self) -> ProjectSnapshot {
        ProjectSnapshot::capture(&self.library, &self.timeline)
    }

    /// Drain queued events.
    pub fn take_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    /// Release every resource and cached decode. The session is empty afterwards.
    pub fn teardown(&mut self) -> usize {
        self.stop_playback();
        self.cache.clear();
        self.library = MediaLibrary::new();
        self.timeline = Timeline::new();
        let released = self.registry.release_all();
        tracing::debug!(released, "session torn down");
        released
    }

    // --- accessors -----------------------------------------------------------------------------

    /// Engine options.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Media library.
    pub fn library(&self) -> &MediaLibrary {
        &self.library
    }

    /// Timeline.
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Resource registry (artifact bytes, uploads).
    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    /// Decode cache.
    pub fn cache(&self) -> &AssetCache {
        &self.cache
    }

    /// Transition applied to new clips.
    pub fn default_transition(&self) -> ClipTransition {
        self.default_transition
    }

    /// Playback position in seconds.
    pub fn position(&self) -> f64 {
        self.scheduler.position()
    }

    /// Whether playback is active.
    pub fn is_playing(&self) -> bool {
        self.scheduler.is_playing()
    }

    /// Whether a hydration has been applied.
    pub fn is_hydrated(&self) -> bool {
        self.hydrated
    }

    fn changed(&mut self) {
        self.preview_dirty = true;
        self.events.push(SessionEvent::StateChanged(self.snapshot()));
    }

    fn advise(&mut self, msg: String) {
        if self.advised.insert(msg.clone()) {
            tracing::warn!(advisory = %msg, "advisory");
            self.events.push(SessionEvent::Advisory(msg));
        }
    }
}

impl Drop for EditorSession {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
#[path = "../tests/unit/session.rs"]
mod tests;

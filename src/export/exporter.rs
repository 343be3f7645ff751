use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use crate::{
    assets::cache::{AssetCache, VideoSeek},
    export::sink::{EncodedVideo, FrameSink, SinkConfig},
    foundation::{
        core::{Canvas, Fps, FrameIndex},
        error::{GiftbeatError, GiftbeatResult},
    },
    library::{media_library::MediaLibrary, resources::ResourceRegistry},
    render::{fit::FitMode, renderer::Renderer},
    timeline::model::Timeline,
};

/// Output parameters of one export.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExportOpts {
    /// Off-screen target size, independent of any preview canvas.
    pub canvas: Canvas,
    /// Output frame rate.
    pub fps: Fps,
    /// Source placement.
    pub fit: FitMode,
    /// Straight-alpha background.
    pub background: [u8; 4],
}

/// Shared cancellation flag, checked between frames.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Fresh, not-canceled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    pub fn is_canceled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// The state an export reads from. Held by shared reference for the whole run.
#[derive(Clone, Copy, Debug)]
pub struct ExportSource<'a> {
    /// Clips to render.
    pub timeline: &'a Timeline,
    /// Assets the clips reference.
    pub library: &'a MediaLibrary,
    /// Bytes behind the assets.
    pub registry: &'a ResourceRegistry,
}

/// Summary of a completed export.
#[derive(Clone, Debug)]
pub struct ExportReport {
    /// The finalized artifact.
    pub video: EncodedVideo,
    /// Frames rendered.
    pub frames: u64,
    /// Frames replaced by the background because an asset failed to decode.
    pub blank_frames: u64,
    /// Distinct decode problems hit along the way.
    pub advisories: Vec<String>,
}

/// How an export ended, short of an error.
#[derive(Clone, Debug)]
pub enum ExportOutcome {
    /// Every frame was written and the sink finalized.
    Completed(ExportReport),
    /// Cancellation was requested; partial output was discarded.
    Canceled {
        /// Frames written before the cancel was seen.
        frames_written: u64,
    },
}

/// Number of frames an export of `total_secs` produces at `fps`.
pub fn frame_count(total_secs: f64, fps: Fps) -> u64 {
    fps.secs_to_frames_round(total_secs)
}

/// Offline frame-stepping exporter.
///
/// Renders `t = i / fps` for `i` in `0..frame_count` strictly in order and feeds every frame to
/// the sink before rendering the next.
pub struct Exporter<'p> {
    opts: ExportOpts,
    cancel: CancelToken,
    progress: Option<Box<dyn FnMut(f64) + 'p>>,
}

impl<'p> Exporter<'p> {
    /// Exporter with a fresh cancel token and no progress callback.
    pub fn new(opts: ExportOpts) -> Self {
        Self {
            opts,
            cancel: CancelToken::new(),
            progress: None,
        }
    }

    /// Use `token` for cancellation.
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Report progress (fraction of timeline time exported, monotonically increasing).
    pub fn on_progress(mut self, f: impl FnMut(f64) + 'p) -> Self {
        self.progress = Some(Box::new(f));
        self
    }

    /// Run the export into `sink`.
    ///
    /// Decode failures produce background frames; sink or render errors abort the sink and are
    /// returned.
    #[tracing::instrument(skip_all, fields(fps = self.opts.fps.as_f64(), width = self.opts.canvas.width, height = self.opts.canvas.height))]
    pub fn run(
        &mut self,
        src: ExportSource<'_>,
        cache: &mut AssetCache,
        sink: &mut dyn FrameSink,
    ) -> GiftbeatResult<ExportOutcome> {
        if src.timeline.is_empty() {
            return Err(GiftbeatError::validation(
                "nothing to export: the timeline has no clips",
            ));
        }
        let total = src.timeline.total_duration();
        let n = frame_count(total, self.opts.fps);
        let renderer = Renderer::new(self.opts.canvas, self.opts.fit, self.opts.background)
            .with_video_seek(VideoSeek::Exact);

        sink.begin(SinkConfig {
            width: self.opts.canvas.width,
            height: self.opts.canvas.height,
            fps: self.opts.fps,
        })?;
        tracing::debug!(frames = n, total_secs = total, "export started");

        let mut frame = renderer.blank();
        let mut blank_frames = 0u64;
        let mut advisories: Vec<String> = Vec::new();

        for i in 0..n {
            if self.cancel.is_canceled() {
                sink.abort();
                tracing::debug!(frames_written = i, "export canceled");
                return Ok(ExportOutcome::Canceled { frames_written: i });
            }

            let idx = FrameIndex(i);
            let t = self.opts.fps.frame_to_secs(idx);
            let step = renderer
                .render_into(&mut frame, src.timeline, src.library, src.registry, cache, t)
                .and_then(|advisory| {
                    sink.push_frame(idx, &frame)?;
                    Ok(advisory)
                });
            match step {
                Ok(Some(advisory)) => {
                    blank_frames += 1;
                    if !advisories.contains(&advisory) {
                        advisories.push(advisory);
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    sink.abort();
                    tracing::warn!(frame = i, error = %e, "export failed");
                    return Err(e);
                }
            }

            if let Some(progress) = self.progress.as_mut() {
                progress((i + 1) as f64 / n as f64);
            }
        }

        let video = match sink.end() {
            Ok(v) => v,
            Err(e) => {
                sink.abort();
                return Err(e);
            }
        };
        tracing::debug!(frames = n, bytes = video.bytes.len(), "export finished");
        Ok(ExportOutcome::Completed(ExportReport {
            video,
            frames: n,
            blank_frames,
            advisories,
        }))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/export/exporter.rs"]
mod tests;

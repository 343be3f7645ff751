use crate::{
    assets::{
        cache::{AssetCache, VideoSeek},
        decode::DecodedImage,
    },
    foundation::{
        core::Canvas,
        error::{GiftbeatError, GiftbeatResult},
    },
    library::{
        media_library::{MediaKind, MediaLibrary},
        resources::{ResourceHandle, ResourceRegistry},
    },
    render::{
        fit::FitMode,
        frame::FrameRGBA,
        transitions::{compose_transition, draw_fitted},
    },
    timeline::{model::Timeline, transition::TransitionKind},
};

/// Source drawn for a single-clip frame.
#[derive(Clone, Debug, PartialEq)]
pub enum PlannedSource {
    /// Static image.
    Image(ResourceHandle),
    /// Video frame at clip-local time `local_t`.
    Video {
        /// Video resource.
        handle: ResourceHandle,
        /// Seconds since the clip started.
        local_t: f64,
    },
}

/// What a frame at a given timestamp consists of.
#[derive(Clone, Debug, PartialEq)]
pub enum FramePlan {
    /// Nothing to draw (empty timeline).
    Blank,
    /// One clip drawn alone.
    Single {
        /// Clip index.
        clip: usize,
        /// What to draw.
        source: PlannedSource,
    },
    /// Two image clips blended by a transition.
    Blend {
        /// Outgoing clip index.
        from: usize,
        /// Outgoing image.
        a: ResourceHandle,
        /// Incoming image.
        b: ResourceHandle,
        /// Transition kind of the outgoing clip.
        kind: TransitionKind,
        /// Transition progress in `[0, 1]`.
        progress: f64,
    },
}

/// Work out what to draw at time `t`.
///
/// A clip whose library item is gone is a decode error, so it renders blank like a failed asset.
pub fn plan_frame(timeline: &Timeline, library: &MediaLibrary, t: f64) -> GiftbeatResult<FramePlan> {
    let Some(idx) = timeline.index_at(t) else {
        return Ok(FramePlan::Blank);
    };
    let clips = timeline.clips();
    let current = &clips[idx];
    let item = library.get(current.library_item_id()).ok_or_else(|| {
        GiftbeatError::decode(format!(
            "clip '{}' references missing library item '{}'",
            current.id(),
            current.library_item_id()
        ))
    })?;

    let kind = current.transition().kind;
    let secs = current.transition_secs();
    let window_start = current.end_time() - secs;
    if kind != TransitionKind::None
        && secs > 0.0
        && t >= window_start
        && item.kind == MediaKind::Image
        && let Some(next) = clips.get(idx + 1)
        && let Some(next_item) = library.get(next.library_item_id())
        && next_item.kind == MediaKind::Image
    {
        let progress = ((t - window_start) / secs).clamp(0.0, 1.0);
        return Ok(FramePlan::Blend {
            from: idx,
            a: item.source.clone(),
            b: next_item.source.clone(),
            kind,
            progress,
        });
    }

    let source = match item.kind {
        MediaKind::Image => PlannedSource::Image(item.source.clone()),
        MediaKind::Video => PlannedSource::Video {
            handle: item.source.clone(),
            local_t: (t - current.start_time()).max(0.0),
        },
    };
    Ok(FramePlan::Single { clip: idx, source })
}

/// A rendered frame plus the non-fatal problem hit while drawing it, if any.
#[derive(Clone, Debug)]
pub struct RenderedFrame {
    /// Pixels.
    pub frame: FrameRGBA,
    /// Decode failure that forced a blank frame.
    pub advisory: Option<String>,
}

/// Composites timeline frames onto a fixed-size canvas.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Renderer {
    canvas: Canvas,
    fit: FitMode,
    background: [u8; 4],
    video_seek: VideoSeek,
}

impl Renderer {
    /// Renderer for `canvas` with straight-alpha `background`.
    pub fn new(canvas: Canvas, fit: FitMode, background: [u8; 4]) -> Self {
        Self {
            canvas,
            fit,
            background,
            video_seek: VideoSeek::Tolerant,
        }
    }

    /// Use `seek` when sampling video frames. Preview keeps the default [`VideoSeek::Tolerant`].
    pub fn with_video_seek(mut self, seek: VideoSeek) -> Self {
        self.video_seek = seek;
        self
    }

    /// Output size.
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Fresh frame filled with the background.
    pub fn blank(&self) -> FrameRGBA {
        FrameRGBA::filled(self.canvas, self.background)
    }

    /// Render the frame at `t` into a new buffer.
    pub fn render_frame(
        &self,
        timeline: &Timeline,
        library: &MediaLibrary,
        registry: &ResourceRegistry,
        cache: &mut AssetCache,
        t: f64,
    ) -> GiftbeatResult<RenderedFrame> {
        let mut frame = self.blank();
        let advisory = self.render_into(&mut frame, timeline, library, registry, cache, t)?;
        Ok(RenderedFrame { frame, advisory })
    }

    /// Render the frame at `t` into `dst`, reusing its allocation.
    ///
    /// Decode failures leave `dst` blank and come back as the advisory string; anything else is an
    /// error.
    #[tracing::instrument(level = "trace", skip(self, dst, timeline, library, registry, cache))]
    pub fn render_into(
        &self,
        dst: &mut FrameRGBA,
        timeline: &Timeline,
        library: &MediaLibrary,
        registry: &ResourceRegistry,
        cache: &mut AssetCache,
        t: f64,
    ) -> GiftbeatResult<Option<String>> {
        if dst.canvas() != self.canvas {
            *dst = self.blank();
        } else {
            dst.clear(self.background);
        }

        match self.draw_plan(dst, timeline, library, registry, cache, t) {
            Ok(()) => Ok(None),
            Err(e) if e.is_decode() => {
                tracing::warn!(t, error = %e, "rendering blank frame");
                dst.clear(self.background);
                Ok(Some(e.to_string()))
            }
            Err(e) => Err(e),
        }
    }

    fn draw_plan(
        &self,
        dst: &mut FrameRGBA,
        timeline: &Timeline,
        library: &MediaLibrary,
        registry: &ResourceRegistry,
        cache: &mut AssetCache,
        t: f64,
    ) -> GiftbeatResult<()> {
        match plan_frame(timeline, library, t)? {
            FramePlan::Blank => Ok(()),
            FramePlan::Single { source, .. } => {
                let img: DecodedImage = match &source {
                    PlannedSource::Image(h) => cache.image(h, registry)?,
                    PlannedSource::Video { handle, local_t } => {
                        cache.video_frame(handle, registry, *local_t, self.video_seek)?
                    }
                };
                draw_fitted(dst, &img, self.fit)
            }
            FramePlan::Blend {
                a,
                b,
                kind,
                progress,
                ..
            } => {
                let img_a = cache.image(&a, registry)?;
                let img_b = cache.image(&b, registry)?;
                compose_transition(dst, kind, &img_a, &img_b, progress, self.fit)
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/renderer.rs"]
mod tests;

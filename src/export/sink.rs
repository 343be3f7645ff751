use crate::{
    foundation::{
        core::{Fps, FrameIndex},
        error::{GiftbeatError, GiftbeatResult},
    },
    render::frame::FrameRGBA,
};

/// Configuration provided to a [`FrameSink`] before the first frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SinkConfig {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Output frames-per-second.
    pub fps: Fps,
}

/// Finalized output of a sink.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedVideo {
    /// Container bytes.
    pub bytes: Vec<u8>,
    /// MIME type of `bytes`.
    pub mime: String,
    /// Frames consumed.
    pub frames: u64,
}

/// Sink contract for consuming rendered frames in timeline order.
///
/// `push_frame` is called in strictly increasing `FrameIndex` order. After an error or a
/// cancellation the exporter calls `abort` instead of `end`; no partial output may survive it.
pub trait FrameSink {
    /// Called once before any frames are pushed.
    fn begin(&mut self, cfg: SinkConfig) -> GiftbeatResult<()>;
    /// Push one frame.
    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> GiftbeatResult<()>;
    /// Finalize and hand back the encoded artifact.
    fn end(&mut self) -> GiftbeatResult<EncodedVideo>;
    /// Discard everything written so far.
    fn abort(&mut self) {}
}

/// In-memory sink for tests and debugging. Its artifact is the raw straight-alpha RGBA8 stream.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<(FrameIndex, FrameRGBA)>,
}

impl InMemorySink {
    /// MIME type of the artifact produced by [`InMemorySink::end`].
    pub const MIME: &'static str = "video/x-raw-rgba";

    /// Create a new in-memory sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<SinkConfig> {
        self.cfg
    }

    /// Captured frames, in push order.
    pub fn frames(&self) -> &[(FrameIndex, FrameRGBA)] {
        &self.frames
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> GiftbeatResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> GiftbeatResult<()> {
        let cfg = self
            .cfg
            .ok_or_else(|| GiftbeatError::encode("in-memory sink not started"))?;
        if let Some((last, _)) = self.frames.last()
            && idx <= *last
        {
            return Err(GiftbeatError::encode("sink received out-of-order frame index"));
        }
        if frame.width != cfg.width || frame.height != cfg.height {
            return Err(GiftbeatError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            )));
        }
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> GiftbeatResult<EncodedVideo> {
        if self.cfg.is_none() {
            return Err(GiftbeatError::encode("in-memory sink not started"));
        }
        let bytes = self
            .frames
            .iter()
            .flat_map(|(_, f)| f.to_straight_rgba8())
            .collect();
        Ok(EncodedVideo {
            bytes,
            mime: Self::MIME.to_string(),
            frames: self.frames.len() as u64,
        })
    }

    fn abort(&mut self) {
        self.frames.clear();
        self.cfg = None;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/export/sink.rs"]
mod tests;

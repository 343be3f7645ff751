use std::collections::HashMap;

use crate::{
    assets::{
        decode::{DecodedImage, decode_image},
        media::{self, SpilledFile, VideoSourceInfo},
    },
    foundation::error::{GiftbeatError, GiftbeatResult},
    library::resources::{ResourceBody, ResourceHandle, ResourceRegistry},
};

/// Opens frame-addressable streams over video resources.
pub trait VideoDecoder {
    /// Open a stream over the bytes or file behind a resource.
    fn open(&self, body: &ResourceBody) -> GiftbeatResult<Box<dyn VideoStream>>;
}

/// A seekable video stream.
pub trait VideoStream {
    /// Intrinsic duration, when the container reports one.
    fn duration_secs(&self) -> Option<f64>;

    /// Source frames per second, when known.
    fn source_fps(&self) -> Option<f64>;

    /// Decode the frame shown at `t` seconds into the source.
    fn frame_at(&mut self, t: f64) -> GiftbeatResult<DecodedImage>;
}

/// [`VideoDecoder`] backed by the system `ffprobe`/`ffmpeg` binaries.
#[derive(Clone, Copy, Debug, Default)]
pub struct FfmpegVideoDecoder;

struct FfmpegVideoStream {
    info: VideoSourceInfo,
    _spill: Option<SpilledFile>,
}

impl VideoDecoder for FfmpegVideoDecoder {
    fn open(&self, body: &ResourceBody) -> GiftbeatResult<Box<dyn VideoStream>> {
        let (info, spill) = match body {
            ResourceBody::File(path) => (media::probe_video(path)?, None),
            ResourceBody::Bytes(bytes) => {
                let spill = SpilledFile::write(bytes, "upload.mp4")?;
                (media::probe_video(spill.path())?, Some(spill))
            }
        };
        Ok(Box::new(FfmpegVideoStream {
            info,
            _spill: spill,
        }))
    }
}

impl VideoStream for FfmpegVideoStream {
    fn duration_secs(&self) -> Option<f64> {
        (self.info.duration_sec > 0.0).then_some(self.info.duration_sec)
    }

    fn source_fps(&self) -> Option<f64> {
        let fps = self.info.source_fps();
        (fps.is_finite() && fps > 0.0).then_some(fps)
    }

    fn frame_at(&mut self, t: f64) -> GiftbeatResult<DecodedImage> {
        let rgba = media::decode_video_frame_rgba8(&self.info, self.info.clamp_time(t))?;
        DecodedImage::from_straight_rgba8(self.info.width, self.info.height, rgba)
    }
}

/// How a video frame request is matched against what the decoder already holds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum VideoSeek {
    /// Reuse the last decoded frame while the request stays within the resync tolerance of it.
    #[default]
    Tolerant,
    /// Decode every distinct source frame.
    Exact,
}

struct VideoSlot {
    stream: Box<dyn VideoStream>,
    // Time of the last request, and of the last seek.
    cursor: Option<f64>,
    seeked_at: Option<f64>,
    frame: Option<(u64, DecodedImage)>,
}

/// Decode counters, mostly useful for tests and debug logging.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Image decodes attempted (successful or not).
    pub image_decodes: u64,
    /// Image lookups served from the cache.
    pub image_hits: u64,
    /// Video frames decoded.
    pub video_frame_decodes: u64,
    /// Video seeks away from the previous position past the tolerance.
    pub video_resyncs: u64,
}

/// Decoded-asset cache keyed by source identity.
///
/// Images are decoded once and kept until their library item is removed, so the cache is bounded by
/// the library. Failed decodes are remembered as well, so a broken asset costs one attempt.
pub struct AssetCache {
    images: HashMap<ResourceHandle, Result<DecodedImage, String>>,
    videos: HashMap<ResourceHandle, VideoSlot>,
    decoder: Box<dyn VideoDecoder>,
    resync_tolerance: f64,
    stats: CacheStats,
}

impl std::fmt::Debug for AssetCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetCache")
            .field("images", &self.images.len())
            .field("videos", &self.videos.len())
            .field("resync_tolerance", &self.resync_tolerance)
            .field("stats", &self.stats)
            .finish()
    }
}

impl AssetCache {
    /// Cache using the ffmpeg video decoder.
    pub fn new(resync_tolerance: f64) -> Self {
        Self::with_video_decoder(resync_tolerance, Box::new(FfmpegVideoDecoder))
    }

    /// Cache using a custom video decoder.
    pub fn with_video_decoder(resync_tolerance: f64, decoder: Box<dyn VideoDecoder>) -> Self {
        Self {
            images: HashMap::new(),
            videos: HashMap::new(),
            decoder,
            resync_tolerance: resync_tolerance.max(0.0),
            stats: CacheStats::default(),
        }
    }

    /// Decode every handle not cached yet. Returns the number of handles that failed.
    pub fn preload<'a>(
        &mut self,
        handles: impl IntoIterator<Item = &'a ResourceHandle>,
        registry: &ResourceRegistry,
    ) -> usize {
        handles
            .into_iter()
            .filter(|h| self.image(h, registry).is_err())
            .count()
    }

    /// Decoded image for `handle`, decoding on first use.
    pub fn image(
        &mut self,
        handle: &ResourceHandle,
        registry: &ResourceRegistry,
    ) -> GiftbeatResult<DecodedImage> {
        if let Some(entry) = self.images.get(handle) {
            self.stats.image_hits += 1;
            return entry.clone().map_err(GiftbeatError::decode);
        }

        self.stats.image_decodes += 1;
        let decoded = registry
            .read(handle)
            .and_then(|bytes| decode_image(&bytes))
            .map_err(failure_message);
        if let Err(msg) = &decoded {
            tracing::warn!(%handle, error = %msg, "image decode failed");
        }
        self.images.insert(handle.clone(), decoded.clone());
        decoded.map_err(GiftbeatError::decode)
    }

    /// Frame of the video behind `handle` at clip-local time `local_t`.
    ///
    /// With [`VideoSeek::Tolerant`], a request within the resync tolerance of the last seek reuses
    /// that frame and anything further seeks again (a resync). With [`VideoSeek::Exact`], every new
    /// source frame index is decoded and a jump past the tolerance only counts as a resync.
    pub fn video_frame(
        &mut self,
        handle: &ResourceHandle,
        registry: &ResourceRegistry,
        local_t: f64,
        seek: VideoSeek,
    ) -> GiftbeatResult<DecodedImage> {
        let tolerance = self.resync_tolerance;
        let slot = self.video_slot(handle, registry)?;
        let t = local_t.max(0.0);

        let key = match slot.stream.source_fps() {
            Some(fps) => (t * fps).floor() as u64,
            None => (t / tolerance.max(1e-3)).round() as u64,
        };
        let reuse = match (seek, &slot.frame) {
            (_, Some((k, _))) if *k == key => true,
            (VideoSeek::Tolerant, Some(_)) => {
                slot.seeked_at.is_some_and(|at| (at - t).abs() <= tolerance)
            }
            _ => false,
        };
        let drifted = match seek {
            VideoSeek::Tolerant => slot.seeked_at.is_some() && !reuse,
            VideoSeek::Exact => slot.cursor.is_some_and(|c| (c - t).abs() > tolerance),
        };
        slot.cursor = Some(t);

        if reuse && let Some((_, frame)) = &slot.frame {
            return Ok(frame.clone());
        }

        let frame = slot.stream.frame_at(t).map_err(into_decode)?;
        slot.frame = Some((key, frame.clone()));
        slot.seeked_at = Some(t);
        self.stats.video_frame_decodes += 1;
        if drifted {
            self.stats.video_resyncs += 1;
        }
        Ok(frame)
    }

    /// Intrinsic duration of the video behind `handle`, probing it if needed.
    pub fn video_duration(
        &mut self,
        handle: &ResourceHandle,
        registry: &ResourceRegistry,
    ) -> GiftbeatResult<Option<f64>> {
        Ok(self.video_slot(handle, registry)?.stream.duration_secs())
    }

    fn video_slot(
        &mut self,
        handle: &ResourceHandle,
        registry: &ResourceRegistry,
    ) -> GiftbeatResult<&mut VideoSlot> {
        if !self.videos.contains_key(handle) {
            let stream = self
                .decoder
                .open(registry.resolve(handle)?)
                .map_err(into_decode)?;
            self.videos.insert(
                handle.clone(),
                VideoSlot {
                    stream,
                    cursor: None,
                    seeked_at: None,
                    frame: None,
                },
            );
        }
        self.videos
            .get_mut(handle)
            .ok_or_else(|| GiftbeatError::evaluation("video slot vanished"))
    }

    /// Drop everything cached for `handle`. Returns `true` if anything was cached.
    pub fn evict(&mut self, handle: &ResourceHandle) -> bool {
        let had_image = self.images.remove(handle).is_some();
        let had_video = self.videos.remove(handle).is_some();
        had_image || had_video
    }

    /// Drop every cached entry.
    pub fn clear(&mut self) {
        self.images.clear();
        self.videos.clear();
    }

    /// Whether an image entry (decoded or failed) exists for `handle`.
    pub fn is_cached(&self, handle: &ResourceHandle) -> bool {
        self.images.contains_key(handle)
    }

    /// Number of cached image entries.
    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    /// Decode counters.
    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}

fn into_decode(e: GiftbeatError) -> GiftbeatError {
    if e.is_decode() {
        e
    } else {
        GiftbeatError::decode(e.to_string())
    }
}

fn failure_message(e: GiftbeatError) -> String {
    match e {
        GiftbeatError::Decode(msg) => msg,
        other => other.to_string(),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/cache.rs"]
mod tests;

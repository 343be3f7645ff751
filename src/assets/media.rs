use std::path::{Path, PathBuf};

use crate::foundation::error::{GiftbeatError, GiftbeatResult};

/// Probed metadata of a video source.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoSourceInfo {
    /// File the metadata was read from.
    pub source_path: PathBuf,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Source frame-rate numerator.
    pub fps_num: u32,
    /// Source frame-rate denominator.
    pub fps_den: u32,
    /// Container duration in seconds (0 when unknown).
    pub duration_sec: f64,
}

impl VideoSourceInfo {
    /// Source frames per second, 0 when unknown.
    pub fn source_fps(&self) -> f64 {
        if self.fps_den == 0 {
            0.0
        } else {
            f64::from(self.fps_num) / f64::from(self.fps_den)
        }
    }

    /// Clamp a clip-local time into the decodable range of this source.
    pub fn clamp_time(&self, local_t: f64) -> f64 {
        let t = local_t.max(0.0);
        if self.duration_sec > 0.0 {
            let last_frame = self.duration_sec - self.source_fps().recip().min(self.duration_sec);
            t.min(last_frame.max(0.0))
        } else {
            t
        }
    }
}

/// Temporary file removed on drop; used to hand in-memory uploads to `ffmpeg`.
#[derive(Debug)]
pub struct SpilledFile(PathBuf);

impl SpilledFile {
    /// Write `bytes` to a fresh file in the system temp directory.
    pub fn write(bytes: &[u8], hint: &str) -> GiftbeatResult<Self> {
        use anyhow::Context as _;
        let path = std::env::temp_dir().join(format!(
            "giftbeat_{}_{}_{}",
            std::process::id(),
            uuid::Uuid::new_v4().simple(),
            hint
        ));
        std::fs::write(&path, bytes)
            .with_context(|| format!("spill media to '{}'", path.display()))?;
        Ok(Self(path))
    }

    /// Path of the spilled file.
    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl Drop for SpilledFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}

/// Probe dimensions, frame rate, and duration of a video file with `ffprobe`.
#[cfg(feature = "media-ffmpeg")]
pub fn probe_video(source_path: &Path) -> GiftbeatResult<VideoSourceInfo> {
    #[derive(serde::Deserialize)]
    struct ProbeStream {
        codec_type: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
        r_frame_rate: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeFormat {
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        streams: Vec<ProbeStream>,
        format: Option<ProbeFormat>,
    }

    let out = std::process::Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(source_path)
        .output()
        .map_err(|e| GiftbeatError::decode(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(GiftbeatError::decode(format!(
            "ffprobe failed for '{}': {}",
            source_path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let parsed: ProbeOut = serde_json::from_slice(&out.stdout)
        .map_err(|e| GiftbeatError::decode(format!("ffprobe json parse failed: {e}")))?;
    let video_stream = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| GiftbeatError::decode("no video stream found"))?;
    let width = video_stream
        .width
        .ok_or_else(|| GiftbeatError::decode("missing video width from ffprobe"))?;
    let height = video_stream
        .height
        .ok_or_else(|| GiftbeatError::decode("missing video height from ffprobe"))?;

    let (fps_num, fps_den) = parse_ff_ratio(video_stream.r_frame_rate.as_deref().unwrap_or("0/1"))
        .ok_or_else(|| GiftbeatError::decode("invalid video r_frame_rate"))?;
    let duration_sec = parsed
        .format
        .as_ref()
        .and_then(|f| f.duration.as_ref())
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(0.0);

    Ok(VideoSourceInfo {
        source_path: source_path.to_path_buf(),
        width,
        height,
        fps_num,
        fps_den,
        duration_sec,
    })
}

/// Probe dimensions, frame rate, and duration of a video file with `ffprobe`.
#[cfg(not(feature = "media-ffmpeg"))]
pub fn probe_video(_source_path: &Path) -> GiftbeatResult<VideoSourceInfo> {
    Err(GiftbeatError::decode(
        "video assets require the 'media-ffmpeg' feature",
    ))
}

/// Decode one straight-alpha RGBA8 frame at `source_time_sec`.
#[cfg(feature = "media-ffmpeg")]
pub fn decode_video_frame_rgba8(
    source: &VideoSourceInfo,
    source_time_sec: f64,
) -> GiftbeatResult<Vec<u8>> {
    let out = std::process::Command::new("ffmpeg")
        .args(["-v", "error", "-ss", &format!("{source_time_sec:.9}")])
        .arg("-i")
        .arg(&source.source_path)
        .args([
            "-frames:v",
            "1",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "pipe:1",
        ])
        .output()
        .map_err(|e| GiftbeatError::decode(format!("failed to run ffmpeg for video decode: {e}")))?;

    if !out.status.success() {
        return Err(GiftbeatError::decode(format!(
            "ffmpeg video decode failed for '{}': {}",
            source.source_path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let expected_len = source.width as usize * source.height as usize * 4;
    if expected_len == 0 {
        return Err(GiftbeatError::decode(
            "decoded video frame size is zero (invalid source dimensions)",
        ));
    }
    if out.stdout.len() < expected_len {
        return Err(GiftbeatError::decode(format!(
            "ffmpeg returned no video frame for '{}' at {source_time_sec:.3}s",
            source.source_path.display()
        )));
    }
    let mut frame = out.stdout;
    frame.truncate(expected_len);
    Ok(frame)
}

/// Decode one straight-alpha RGBA8 frame at `source_time_sec`.
#[cfg(not(feature = "media-ffmpeg"))]
pub fn decode_video_frame_rgba8(
    _source: &VideoSourceInfo,
    _source_time_sec: f64,
) -> GiftbeatResult<Vec<u8>> {
    Err(GiftbeatError::decode(
        "video assets require the 'media-ffmpeg' feature",
    ))
}

#[cfg(feature = "media-ffmpeg")]
fn parse_ff_ratio(s: &str) -> Option<(u32, u32)> {
    let mut parts = s.split('/');
    let a = parts.next()?.parse::<u32>().ok()?;
    let b = parts.next()?.parse::<u32>().ok()?;
    if b == 0 {
        return None;
    }
    Some((a, b))
}

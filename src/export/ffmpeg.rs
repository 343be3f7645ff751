use std::{
    io::Read,
    path::{Path, PathBuf},
    process::{Child, ChildStdin, Command, Stdio},
};

use crate::{
    export::sink::{EncodedVideo, FrameSink, SinkConfig},
    foundation::{
        core::{Fps, FrameIndex},
        error::{GiftbeatError, GiftbeatResult},
        math::{premul_over_px, premultiply_rgba8_in_place},
    },
    render::frame::FrameRGBA,
};

/// MIME type of the MP4 artifacts produced by [`FfmpegSink`].
pub const MP4_MIME: &str = "video/mp4";

/// Options for [`FfmpegSink`].
#[derive(Clone, Debug)]
pub struct FfmpegSinkOpts {
    /// Where to keep the MP4. `None` encodes into a temp file that is removed once read back.
    pub out_path: Option<PathBuf>,
    /// Overwrite `out_path` if it already exists.
    pub overwrite: bool,
    /// Background used to flatten alpha (straight RGBA8).
    pub bg_rgba: [u8; 4],
}

impl Default for FfmpegSinkOpts {
    fn default() -> Self {
        Self {
            out_path: None,
            overwrite: true,
            bg_rgba: [0, 0, 0, 255],
        }
    }
}

impl FfmpegSinkOpts {
    /// Keep the encoded MP4 at `out_path`.
    pub fn to_file(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: Some(out_path.into()),
            ..Self::default()
        }
    }
}

/// Sink that spawns the system `ffmpeg` and streams raw frames to its stdin (h264/yuv420p MP4).
pub struct FfmpegSink {
    opts: FfmpegSinkOpts,
    target: Option<PathBuf>,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,
    scratch: Vec<u8>,
    cfg: Option<SinkConfig>,
    last_idx: Option<FrameIndex>,
    frames: u64,
}

impl FfmpegSink {
    /// Create a sink; nothing is spawned until `begin`.
    pub fn new(opts: FfmpegSinkOpts) -> Self {
        Self {
            opts,
            target: None,
            child: None,
            stdin: None,
            stderr_drain: None,
            scratch: Vec::new(),
            cfg: None,
            last_idx: None,
            frames: 0,
        }
    }

    fn remove_target(&mut self) {
        if let Some(path) = self.target.take() {
            let _ = std::fs::remove_file(&path);
        }
    }
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, cfg: SinkConfig) -> GiftbeatResult<()> {
        if cfg.fps.num == 0 || cfg.fps.den == 0 {
            return Err(GiftbeatError::validation("fps must be non-zero"));
        }
        if cfg.width == 0 || cfg.height == 0 {
            return Err(GiftbeatError::validation(
                "ffmpeg sink width/height must be non-zero",
            ));
        }
        if !cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2) {
            return Err(GiftbeatError::validation(
                "ffmpeg sink width/height must be even (required for yuv420p mp4 output)",
            ));
        }

        let target = match &self.opts.out_path {
            Some(path) => {
                ensure_parent_dir(path)?;
                if !self.opts.overwrite && path.exists() {
                    return Err(GiftbeatError::validation(format!(
                        "output file '{}' already exists",
                        path.display()
                    )));
                }
                path.clone()
            }
            None => std::env::temp_dir().join(format!(
                "giftbeat_export_{}_{}.mp4",
                std::process::id(),
                uuid::Uuid::new_v4().simple()
            )),
        };

        if !is_ffmpeg_on_path() {
            return Err(GiftbeatError::encode(
                "ffmpeg is required for MP4 encoding, but was not found on PATH",
            ));
        }

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        if self.opts.overwrite {
            cmd.arg("-y");
        } else {
            cmd.arg("-n");
        }
        cmd.args([
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
        ]);
        push_input_fps(&mut cmd, cfg.fps);
        cmd.args([
            "-i",
            "pipe:0",
            "-an",
            "-c:v",
            "libx264",
            "-pix_fmt",
            "yuv420p",
            "-movflags",
            "+faststart",
        ])
        .arg(&target);

        let mut child = cmd.spawn().map_err(|e| {
            GiftbeatError::encode(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| GiftbeatError::encode("failed to open ffmpeg stdin (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| GiftbeatError::encode("failed to open ffmpeg stderr (unexpected)"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        tracing::debug!(out = %target.display(), width = cfg.width, height = cfg.height, "ffmpeg sink started");
        self.scratch = vec![0u8; (cfg.width as usize) * (cfg.height as usize) * 4];
        self.target = Some(target);
        self.child = Some(child);
        self.stdin = Some(stdin);
        self.stderr_drain = Some(stderr_drain);
        self.cfg = Some(cfg);
        self.last_idx = None;
        self.frames = 0;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> GiftbeatResult<()> {
        let cfg = self
            .cfg
            .ok_or_else(|| GiftbeatError::encode("ffmpeg sink not started"))?;
        if let Some(last) = self.last_idx
            && idx.0 <= last.0
        {
            return Err(GiftbeatError::encode(
                "ffmpeg sink received out-of-order frame index",
            ));
        }
        self.last_idx = Some(idx);

        if frame.width != cfg.width || frame.height != cfg.height {
            return Err(GiftbeatError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            )));
        }
        if frame.data.len() != self.scratch.len() {
            return Err(GiftbeatError::validation(
                "frame.data size mismatch with width*height*4",
            ));
        }

        flatten_onto_background(&mut self.scratch, frame, self.opts.bg_rgba);

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(GiftbeatError::encode("ffmpeg sink is already finalized"));
        };
        use std::io::Write as _;
        stdin.write_all(&self.scratch).map_err(|e| {
            GiftbeatError::encode(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;
        self.frames += 1;
        Ok(())
    }

    fn end(&mut self) -> GiftbeatResult<EncodedVideo> {
        drop(self.stdin.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| GiftbeatError::encode("ffmpeg sink not started"))?;

        let status = child.wait().map_err(|e| {
            GiftbeatError::encode(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;
        let stderr_bytes = match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| GiftbeatError::encode("ffmpeg stderr drain thread panicked"))?
                .map_err(|e| GiftbeatError::encode(format!("ffmpeg stderr read failed: {e}")))?,
            None => Vec::new(),
        };
        self.cfg = None;

        if !status.success() {
            self.remove_target();
            let stderr = String::from_utf8_lossy(&stderr_bytes);
            return Err(GiftbeatError::encode(format!(
                "ffmpeg exited with status {}: {}",
                status,
                stderr.trim()
            )));
        }

        let target = self
            .target
            .clone()
            .ok_or_else(|| GiftbeatError::encode("ffmpeg sink lost its output path"))?;
        let bytes = std::fs::read(&target).map_err(|e| {
            GiftbeatError::encode(format!("failed to read '{}': {e}", target.display()))
        })?;
        if self.opts.out_path.is_none() {
            self.remove_target();
        } else {
            self.target = None;
        }
        Ok(EncodedVideo {
            bytes,
            mime: MP4_MIME.to_string(),
            frames: self.frames,
        })
    }

    fn abort(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        if let Some(handle) = self.stderr_drain.take() {
            let _ = handle.join();
        }
        self.cfg = None;
        self.remove_target();
        tracing::debug!("ffmpeg sink aborted; partial output removed");
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        if self.child.is_some() {
            self.abort();
        }
    }
}

fn push_input_fps(cmd: &mut Command, fps: Fps) {
    // rawvideo input takes its rate from `-r` before `-i`.
    cmd.args(["-r", &format!("{}/{}", fps.num, fps.den)]);
}

/// Composite `frame` over the opaque background into `dst`; ffmpeg gets no alpha.
fn flatten_onto_background(dst: &mut [u8], frame: &FrameRGBA, bg: [u8; 4]) {
    let bg = [bg[0], bg[1], bg[2], 255];
    for (d, s) in dst.chunks_exact_mut(4).zip(frame.data.chunks_exact(4)) {
        let mut px = [s[0], s[1], s[2], s[3]];
        if !frame.premultiplied {
            premultiply_rgba8_in_place(&mut px);
        }
        d.copy_from_slice(&premul_over_px(bg, px, 255));
    }
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> GiftbeatResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

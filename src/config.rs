use std::path::Path;

use crate::{
    foundation::{
        core::{AspectRatio, Canvas, Fps, Resolution},
        error::{GiftbeatError, GiftbeatResult},
    },
    library::media_library::VideoPolicy,
    render::fit::FitMode,
    timeline::transition::{
        DEFAULT_TRANSITION_SECS, MAX_TRANSITION_SECS, MIN_TRANSITION_SECS, TransitionKind,
    },
};

/// Env var overriding [`EngineConfig::export_fps`].
pub const ENV_EXPORT_FPS: &str = "GIFTBEAT_EXPORT_FPS";
/// Env var overriding [`EngineConfig::video_uploads`] (`enabled` / `disabled`).
pub const ENV_VIDEO_UPLOADS: &str = "GIFTBEAT_VIDEO_UPLOADS";

/// Engine options.
///
/// Every field has a default, so partial JSON documents are accepted.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Size of the interactive preview target.
    pub preview_canvas: Canvas,
    /// Export resolution class.
    pub resolution: Resolution,
    /// Export aspect ratio.
    pub aspect_ratio: AspectRatio,
    /// Explicit export size; overrides the resolution/aspect preset when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export_size: Option<Canvas>,
    /// Export frame rate (whole frames per second).
    pub export_fps: u32,
    /// How sources are placed into frames.
    pub fit: FitMode,
    /// Whether video uploads are accepted.
    pub video_uploads: VideoPolicy,
    /// Transition given to newly added clips.
    pub default_transition: TransitionKind,
    /// Length of the default transition, seconds.
    pub default_transition_secs: f64,
    /// Straight-alpha background colour.
    pub background_rgba: [u8; 4],
    /// Video cursor drift tolerated before a resync, seconds.
    pub video_resync_tolerance_secs: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            preview_canvas: Canvas {
                width: 1920,
                height: 1080,
            },
            resolution: Resolution::P1080,
            aspect_ratio: AspectRatio::Landscape16x9,
            export_size: None,
            export_fps: 30,
            fit: FitMode::Contain,
            video_uploads: VideoPolicy::Disabled,
            default_transition: TransitionKind::Fade,
            default_transition_secs: DEFAULT_TRANSITION_SECS,
            background_rgba: [0, 0, 0, 255],
            video_resync_tolerance_secs: 0.1,
        }
    }
}

impl EngineConfig {
    /// Load from a JSON file; missing fields take their defaults.
    pub fn from_json_path(path: &Path) -> GiftbeatResult<Self> {
        use anyhow::Context as _;
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        let cfg: Self = serde_json::from_str(&text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Apply `GIFTBEAT_*` environment overrides. Unparseable values are ignored with a warning.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    pub(crate) fn with_overrides_from(mut self, get: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(raw) = get(ENV_EXPORT_FPS) {
            match raw.trim().parse::<u32>() {
                Ok(fps) if fps > 0 => self.export_fps = fps,
                _ => tracing::warn!(value = %raw, "ignoring invalid {ENV_EXPORT_FPS}"),
            }
        }
        if let Some(raw) = get(ENV_VIDEO_UPLOADS) {
            match raw.trim().to_ascii_lowercase().as_str() {
                "enabled" | "1" | "true" => self.video_uploads = VideoPolicy::Enabled,
                "disabled" | "0" | "false" => self.video_uploads = VideoPolicy::Disabled,
                _ => tracing::warn!(value = %raw, "ignoring invalid {ENV_VIDEO_UPLOADS}"),
            }
        }
        self
    }

    /// Set the export resolution class and aspect ratio.
    pub fn with_export(mut self, resolution: Resolution, aspect_ratio: AspectRatio) -> Self {
        self.resolution = resolution;
        self.aspect_ratio = aspect_ratio;
        self
    }

    /// Export at exactly `canvas`, ignoring the presets.
    pub fn with_export_size(mut self, canvas: Canvas) -> Self {
        self.export_size = Some(canvas);
        self
    }

    /// Set the export frame rate.
    pub fn with_export_fps(mut self, fps: u32) -> Self {
        self.export_fps = fps;
        self
    }

    /// Set the preview target size.
    pub fn with_preview_canvas(mut self, canvas: Canvas) -> Self {
        self.preview_canvas = canvas;
        self
    }

    /// Set the fit mode.
    pub fn with_fit(mut self, fit: FitMode) -> Self {
        self.fit = fit;
        self
    }

    /// Set the video upload policy.
    pub fn with_video_uploads(mut self, policy: VideoPolicy) -> Self {
        self.video_uploads = policy;
        self
    }

    /// Export target size.
    pub fn export_canvas(&self) -> Canvas {
        self.export_size
            .unwrap_or_else(|| self.resolution.canvas(self.aspect_ratio))
    }

    /// Export frame rate as [`Fps`].
    pub fn fps(&self) -> GiftbeatResult<Fps> {
        Fps::integer(self.export_fps)
    }

    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> GiftbeatResult<()> {
        Canvas::new(self.preview_canvas.width, self.preview_canvas.height)?;
        if let Some(size) = self.export_size {
            Canvas::new(size.width, size.height)?;
        }
        self.fps()?;
        if !(MIN_TRANSITION_SECS..=MAX_TRANSITION_SECS).contains(&self.default_transition_secs) {
            return Err(GiftbeatError::validation(format!(
                "default transition duration must be within [{MIN_TRANSITION_SECS}, {MAX_TRANSITION_SECS}] seconds"
            )));
        }
        if !self.video_resync_tolerance_secs.is_finite() || self.video_resync_tolerance_secs < 0.0 {
            return Err(GiftbeatError::validation(
                "video resync tolerance must be finite and >= 0",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;

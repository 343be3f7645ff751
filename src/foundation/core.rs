use crate::foundation::error::{GiftbeatError, GiftbeatResult};

pub use kurbo::{Affine, Point, Rect, Vec2};

/// Absolute 0-based frame index in export timeline space.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

/// Frames-per-second represented as a rational `num/den`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator (frames).
    pub num: u32,
    /// Denominator (seconds), must be non-zero.
    pub den: u32,
}

impl Fps {
    /// Create a validated FPS value.
    pub fn new(num: u32, den: u32) -> GiftbeatResult<Self> {
        if den == 0 {
            return Err(GiftbeatError::validation("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(GiftbeatError::validation("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Whole-number frame rate, e.g. `Fps::integer(30)`.
    pub fn integer(fps: u32) -> GiftbeatResult<Self> {
        Self::new(fps, 1)
    }

    /// Convert to floating-point FPS.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Duration of one frame in seconds.
    pub fn frame_duration_secs(self) -> f64 {
        f64::from(self.den) / f64::from(self.num)
    }

    /// Timestamp of frame `idx` in seconds.
    pub fn frame_to_secs(self, idx: FrameIndex) -> f64 {
        (idx.0 as f64) * self.frame_duration_secs()
    }

    /// Number of frames needed to cover `secs`, rounded to the nearest frame.
    pub fn secs_to_frames_round(self, secs: f64) -> u64 {
        (secs * self.as_f64()).round().max(0.0) as u64
    }
}

/// Output canvas dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Create a validated, non-empty canvas.
    pub fn new(width: u32, height: u32) -> GiftbeatResult<Self> {
        if width == 0 || height == 0 {
            return Err(GiftbeatError::validation(
                "canvas width/height must be non-zero",
            ));
        }
        Ok(Self { width, height })
    }

    /// Byte length of a tightly packed RGBA8 buffer of this size.
    pub fn rgba_len(self) -> usize {
        (self.width as usize) * (self.height as usize) * 4
    }

    /// Full-canvas rectangle in pixel space.
    pub fn rect(self) -> Rect {
        Rect::new(0.0, 0.0, f64::from(self.width), f64::from(self.height))
    }
}

/// Output resolution class, named by the short edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Resolution {
    /// 480 pixels on the short edge.
    #[serde(rename = "480p")]
    P480,
    /// 720 pixels on the short edge.
    #[serde(rename = "720p")]
    P720,
    /// 1080 pixels on the short edge.
    #[serde(rename = "1080p")]
    P1080,
}

impl Resolution {
    fn short_edge(self) -> u32 {
        match self {
            Self::P480 => 480,
            Self::P720 => 720,
            Self::P1080 => 1080,
        }
    }

    /// Resolve this preset at `aspect` into an even-sized canvas (yuv420p friendly).
    pub fn canvas(self, aspect: AspectRatio) -> Canvas {
        let short = self.short_edge();
        let (w, h) = aspect.ratio();
        let long = even_round(f64::from(short) * f64::from(w.max(h)) / f64::from(w.min(h)));
        let (width, height) = if w >= h { (long, short) } else { (short, long) };
        Canvas { width, height }
    }
}

impl std::str::FromStr for Resolution {
    type Err = GiftbeatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "480p" | "480" => Ok(Self::P480),
            "720p" | "720" => Ok(Self::P720),
            "1080p" | "1080" => Ok(Self::P1080),
            other => Err(GiftbeatError::validation(format!(
                "unknown resolution '{other}'"
            ))),
        }
    }
}

/// Output aspect ratio.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum AspectRatio {
    /// 16:9 landscape.
    #[serde(rename = "16:9")]
    Landscape16x9,
    /// 9:16 portrait.
    #[serde(rename = "9:16")]
    Portrait9x16,
    /// 1:1 square.
    #[serde(rename = "1:1")]
    Square1x1,
}

impl AspectRatio {
    fn ratio(self) -> (u32, u32) {
        match self {
            Self::Landscape16x9 => (16, 9),
            Self::Portrait9x16 => (9, 16),
            Self::Square1x1 => (1, 1),
        }
    }
}

impl std::str::FromStr for AspectRatio {
    type Err = GiftbeatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "16:9" => Ok(Self::Landscape16x9),
            "9:16" => Ok(Self::Portrait9x16),
            "1:1" => Ok(Self::Square1x1),
            other => Err(GiftbeatError::validation(format!(
                "unknown aspect ratio '{other}'"
            ))),
        }
    }
}

fn even_round(v: f64) -> u32 {
    let r = v.round() as u32;
    if r.is_multiple_of(2) { r } else { r + 1 }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;

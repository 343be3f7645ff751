use crate::foundation::error::{GiftbeatError, GiftbeatResult};

/// Shortest allowed transition, in seconds.
pub const MIN_TRANSITION_SECS: f64 = 0.2;
/// Longest allowed transition, in seconds.
pub const MAX_TRANSITION_SECS: f64 = 2.0;
/// Transition length used when a clip carries none.
pub const DEFAULT_TRANSITION_SECS: f64 = 0.5;

/// Blend applied at the end of a clip, into the next clip.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionKind {
    /// Hard cut.
    None,
    /// A fades out while B fades in.
    #[default]
    Fade,
    /// Same blend as `Fade`, kept as a distinct user choice.
    Crossfade,
    /// B slides in from the right edge over a static A.
    Slide,
    /// A zooms out of view while B zooms in from 70%.
    Zoom,
    /// B is revealed left to right over a static A.
    Wipe,
}

impl TransitionKind {
    /// Every kind, in menu order.
    pub const ALL: [TransitionKind; 6] = [
        Self::None,
        Self::Fade,
        Self::Slide,
        Self::Zoom,
        Self::Crossfade,
        Self::Wipe,
    ];

    /// Stable lowercase name used in project files.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Fade => "fade",
            Self::Crossfade => "crossfade",
            Self::Slide => "slide",
            Self::Zoom => "zoom",
            Self::Wipe => "wipe",
        }
    }

    /// Whether this kind blends two clips at all.
    pub fn is_blend(self) -> bool {
        self != Self::None
    }
}

impl std::fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TransitionKind {
    type Err = GiftbeatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = s.trim().to_ascii_lowercase();
        if kind.is_empty() {
            return Err(GiftbeatError::validation("transition kind must be non-empty"));
        }
        match kind.as_str() {
            "none" | "cut" => Ok(Self::None),
            "fade" => Ok(Self::Fade),
            "crossfade" | "dissolve" => Ok(Self::Crossfade),
            "slide" => Ok(Self::Slide),
            "zoom" => Ok(Self::Zoom),
            "wipe" => Ok(Self::Wipe),
            _ => Err(GiftbeatError::validation(format!(
                "unknown transition kind '{kind}'"
            ))),
        }
    }
}

/// Clamp a transition length into `[MIN_TRANSITION_SECS, MAX_TRANSITION_SECS]`.
///
/// Non-finite input is rejected rather than clamped.
pub fn clamp_transition_secs(secs: f64) -> GiftbeatResult<f64> {
    if !secs.is_finite() {
        return Err(GiftbeatError::validation(
            "transition duration must be finite",
        ));
    }
    Ok(secs.clamp(MIN_TRANSITION_SECS, MAX_TRANSITION_SECS))
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/transition.rs"]
mod tests;

use crate::foundation::{
    core::{Affine, Canvas, Rect},
    error::GiftbeatError,
};

/// How a source is scaled into the output frame. Both modes keep the aspect ratio and center.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitMode {
    /// Whole source visible, letterboxed on the shorter axis.
    #[default]
    Contain,
    /// Output fully covered, source cropped on the longer axis.
    Cover,
}

impl std::str::FromStr for FitMode {
    type Err = GiftbeatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "contain" | "fit" => Ok(Self::Contain),
            "cover" | "fill" => Ok(Self::Cover),
            other => Err(GiftbeatError::validation(format!(
                "unknown fit mode '{other}'"
            ))),
        }
    }
}

/// Uniform scale mapping a `src_w x src_h` source into `canvas`.
pub fn fit_scale(src_w: u32, src_h: u32, canvas: Canvas, mode: FitMode) -> f64 {
    if src_w == 0 || src_h == 0 {
        return 0.0;
    }
    let sx = f64::from(canvas.width) / f64::from(src_w);
    let sy = f64::from(canvas.height) / f64::from(src_h);
    match mode {
        FitMode::Contain => sx.min(sy),
        FitMode::Cover => sx.max(sy),
    }
}

/// Destination rectangle of the source in canvas pixels.
pub fn fit_rect(src_w: u32, src_h: u32, canvas: Canvas, mode: FitMode) -> Rect {
    let s = fit_scale(src_w, src_h, canvas, mode);
    let w = f64::from(src_w) * s;
    let h = f64::from(src_h) * s;
    let x = (f64::from(canvas.width) - w) / 2.0;
    let y = (f64::from(canvas.height) - h) / 2.0;
    Rect::new(x, y, x + w, y + h)
}

/// Transform from source pixel space into canvas space.
pub fn placement(src_w: u32, src_h: u32, canvas: Canvas, mode: FitMode) -> Affine {
    let r = fit_rect(src_w, src_h, canvas, mode);
    Affine::translate((r.x0, r.y0)) * Affine::scale(fit_scale(src_w, src_h, canvas, mode))
}

#[cfg(test)]
#[path = "../../tests/unit/render/fit.rs"]
mod tests;

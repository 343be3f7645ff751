use crate::{
    assets::decode::DecodedImage,
    foundation::{
        core::{Affine, Rect, Vec2},
        error::GiftbeatResult,
    },
    render::{
        draw::{DrawParams, draw_image},
        fit::{FitMode, placement},
        frame::FrameRGBA,
    },
    timeline::transition::TransitionKind,
};

/// Scale gained by the outgoing image over a zoom transition.
pub const ZOOM_OUT_GAIN: f64 = 0.3;
/// Starting scale of the incoming image in a zoom transition.
pub const ZOOM_IN_START: f64 = 0.7;

/// Draw `img` fitted into `dst` at full opacity.
pub fn draw_fitted(dst: &mut FrameRGBA, img: &DecodedImage, fit: FitMode) -> GiftbeatResult<()> {
    let place = placement(img.width, img.height, dst.canvas(), fit);
    draw_image(dst, img, &DrawParams::new(place))
}

/// Composite the transition from `a` to `b` at `progress` onto `dst`.
///
/// `dst` is expected to hold the background already. `progress` is clamped to `[0, 1]`.
pub fn compose_transition(
    dst: &mut FrameRGBA,
    kind: TransitionKind,
    a: &DecodedImage,
    b: &DecodedImage,
    progress: f64,
    fit: FitMode,
) -> GiftbeatResult<()> {
    let p = if progress.is_nan() { 0.0 } else { progress.clamp(0.0, 1.0) };
    let canvas = dst.canvas();
    let place_a = placement(a.width, a.height, canvas, fit);
    let place_b = placement(b.width, b.height, canvas, fit);
    let w = f64::from(canvas.width);
    let h = f64::from(canvas.height);

    match kind {
        TransitionKind::Fade | TransitionKind::Crossfade => {
            draw_image(dst, a, &DrawParams::new(place_a).with_opacity((1.0 - p) as f32))?;
            draw_image(dst, b, &DrawParams::new(place_b).with_opacity(p as f32))
        }
        TransitionKind::Slide => {
            draw_image(dst, a, &DrawParams::new(place_a))?;
            let shift = Affine::translate((w * (1.0 - p), 0.0));
            draw_image(dst, b, &DrawParams::new(shift * place_b))
        }
        TransitionKind::Zoom => {
            let center = Vec2::new(w / 2.0, h / 2.0);
            let about = |s: f64| {
                Affine::translate(center) * Affine::scale(s) * Affine::translate(-center)
            };
            draw_image(
                dst,
                a,
                &DrawParams::new(about(1.0 + ZOOM_OUT_GAIN * p) * place_a)
                    .with_opacity((1.0 - p) as f32),
            )?;
            draw_image(
                dst,
                b,
                &DrawParams::new(about(ZOOM_IN_START + ZOOM_OUT_GAIN * p) * place_b)
                    .with_opacity(p as f32),
            )
        }
        TransitionKind::Wipe => {
            draw_image(dst, a, &DrawParams::new(place_a))?;
            // Whole columns only; half a column rounds up.
            let edge = (w * p).round();
            draw_image(
                dst,
                b,
                &DrawParams::new(place_b).with_clip(Rect::new(0.0, 0.0, edge, h)),
            )
        }
        TransitionKind::None => draw_image(dst, b, &DrawParams::new(place_b)),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/transitions.rs"]
mod tests;

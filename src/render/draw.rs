use crate::{
    assets::decode::DecodedImage,
    foundation::{
        core::{Affine, Point, Rect},
        error::{GiftbeatError, GiftbeatResult},
        math::opacity_u8,
    },
    render::frame::FrameRGBA,
};

/// How one image is drawn onto a frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawParams {
    /// Source pixel space to canvas space.
    pub transform: Affine,
    /// Global alpha in `[0, 1]`.
    pub opacity: f32,
    /// Optional canvas-space clip rectangle.
    pub clip: Option<Rect>,
}

impl DrawParams {
    /// Fully opaque, unclipped draw with `transform`.
    pub fn new(transform: Affine) -> Self {
        Self {
            transform,
            opacity: 1.0,
            clip: None,
        }
    }

    /// Set the global alpha.
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    /// Restrict drawing to `clip`.
    pub fn with_clip(mut self, clip: Rect) -> Self {
        self.clip = Some(clip);
        self
    }
}

/// Source-over `img` onto `dst`.
///
/// A canvas pixel is covered when its center maps inside the source (and inside the clip); covered
/// pixels are sampled bilinearly with edge clamping, so an identity transform copies exactly.
pub fn draw_image(dst: &mut FrameRGBA, img: &DecodedImage, params: &DrawParams) -> GiftbeatResult<()> {
    if !dst.premultiplied || dst.data.len() != dst.canvas().rgba_len() {
        return Err(GiftbeatError::evaluation(
            "draw_image expects a premultiplied frame matching its dimensions",
        ));
    }
    let op = opacity_u8(params.opacity);
    if op == 0 || img.width == 0 || img.height == 0 {
        return Ok(());
    }
    let det = params.transform.determinant();
    if !det.is_finite() || det.abs() < 1e-12 {
        return Ok(());
    }
    let inv = params.transform.inverse();

    let src_rect = Rect::new(0.0, 0.0, f64::from(img.width), f64::from(img.height));
    let mut bounds = params
        .transform
        .transform_rect_bbox(src_rect)
        .intersect(dst.canvas().rect());
    if let Some(clip) = params.clip {
        bounds = bounds.intersect(clip);
    }
    if bounds.width() <= 0.0 || bounds.height() <= 0.0 {
        return Ok(());
    }

    let (x_start, x_end) = center_span(bounds.x0, bounds.x1, dst.width);
    let (y_start, y_end) = center_span(bounds.y0, bounds.y1, dst.height);
    let (sw, sh) = (f64::from(img.width), f64::from(img.height));

    for y in y_start..y_end {
        for x in x_start..x_end {
            let p = inv * Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
            if p.x < 0.0 || p.y < 0.0 || p.x >= sw || p.y >= sh {
                continue;
            }
            let src = sample_bilinear(img, p.x - 0.5, p.y - 0.5);
            dst.blend_px(x, y, src, op);
        }
    }
    Ok(())
}

// Pixels whose centers fall in [lo, hi).
fn center_span(lo: f64, hi: f64, limit: u32) -> (u32, u32) {
    let clamp = |v: f64| v.clamp(0.0, f64::from(limit)) as u32;
    (clamp((lo - 0.5).ceil()), clamp((hi - 0.5).ceil()))
}

fn sample_bilinear(img: &DecodedImage, u: f64, v: f64) -> [u8; 4] {
    let max_x = f64::from(img.width - 1);
    let max_y = f64::from(img.height - 1);
    let u = u.clamp(0.0, max_x);
    let v = v.clamp(0.0, max_y);
    let x0 = u.floor();
    let y0 = v.floor();
    let fx = u - x0;
    let fy = v - y0;
    let (x0, y0) = (x0 as i64, y0 as i64);
    let x1 = (x0 + 1).min(max_x as i64);
    let y1 = (y0 + 1).min(max_y as i64);

    if fx == 0.0 && fy == 0.0 {
        return img.pixel(x0, y0);
    }

    let p00 = img.pixel(x0, y0);
    let p10 = img.pixel(x1, y0);
    let p01 = img.pixel(x0, y1);
    let p11 = img.pixel(x1, y1);
    let mut out = [0u8; 4];
    for c in 0..4 {
        let top = f64::from(p00[c]) * (1.0 - fx) + f64::from(p10[c]) * fx;
        let bottom = f64::from(p01[c]) * (1.0 - fx) + f64::from(p11[c]) * fx;
        out[c] = (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8;
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/render/draw.rs"]
mod tests;

use crate::foundation::{
    core::Canvas,
    math::{mul_div255_u8, premul_over_px},
};

/// A rendered RGBA8 frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Tightly packed row-major RGBA8 pixel data.
    pub data: Vec<u8>,
    /// Whether `data` is alpha-premultiplied.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Premultiplied frame covering `canvas`, filled with a straight-alpha colour.
    pub fn filled(canvas: Canvas, rgba: [u8; 4]) -> Self {
        let px = premul(rgba);
        Self {
            width: canvas.width,
            height: canvas.height,
            data: px.repeat((canvas.width as usize) * (canvas.height as usize)),
            premultiplied: true,
        }
    }

    /// Dimensions of this frame.
    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.width,
            height: self.height,
        }
    }

    /// Refill every pixel with a straight-alpha colour.
    pub fn clear(&mut self, rgba: [u8; 4]) {
        let px = if self.premultiplied { premul(rgba) } else { rgba };
        for dst in self.data.chunks_exact_mut(4) {
            dst.copy_from_slice(&px);
        }
    }

    /// Pixel at `(x, y)`, `None` when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        let p = self.data.get(idx..idx + 4)?;
        Some([p[0], p[1], p[2], p[3]])
    }

    pub(crate) fn blend_px(&mut self, x: u32, y: u32, src: [u8; 4], op: u16) {
        let idx = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        if let Some(d) = self.data.get_mut(idx..idx + 4) {
            let out = premul_over_px([d[0], d[1], d[2], d[3]], src, op);
            d.copy_from_slice(&out);
        }
    }

    /// Copy of the pixel data with alpha un-premultiplied (PNG/encoder friendly).
    pub fn to_straight_rgba8(&self) -> Vec<u8> {
        if !self.premultiplied {
            return self.data.clone();
        }
        let mut out = self.data.clone();
        for px in out.chunks_exact_mut(4) {
            let a = u32::from(px[3]);
            if a == 0 || a == 255 {
                continue;
            }
            for c in px.iter_mut().take(3) {
                *c = ((u32::from(*c) * 255 + a / 2) / a).min(255) as u8;
            }
        }
        out
    }

    /// Whether every pixel equals the straight-alpha colour `rgba`.
    pub fn is_solid(&self, rgba: [u8; 4]) -> bool {
        let px = if self.premultiplied { premul(rgba) } else { rgba };
        self.data.chunks_exact(4).all(|p| p == px)
    }
}

fn premul(rgba: [u8; 4]) -> [u8; 4] {
    let a = u16::from(rgba[3]);
    [
        mul_div255_u8(u16::from(rgba[0]), a),
        mul_div255_u8(u16::from(rgba[1]), a),
        mul_div255_u8(u16::from(rgba[2]), a),
        rgba[3],
    ]
}

#[cfg(test)]
#[path = "../../tests/unit/render/frame.rs"]
mod tests;

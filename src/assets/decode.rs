use std::sync::Arc;

use crate::foundation::{
    error::{GiftbeatError, GiftbeatResult},
    math::premultiply_rgba8_in_place,
};

/// Decoded raster in premultiplied RGBA8 form.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel bytes in row-major premultiplied RGBA8.
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl DecodedImage {
    /// Wrap straight-alpha RGBA8 pixels, premultiplying them.
    pub fn from_straight_rgba8(width: u32, height: u32, mut rgba: Vec<u8>) -> GiftbeatResult<Self> {
        let expected = (width as usize) * (height as usize) * 4;
        if width == 0 || height == 0 || rgba.len() != expected {
            return Err(GiftbeatError::decode(format!(
                "rgba buffer of {} bytes does not match {width}x{height}",
                rgba.len()
            )));
        }
        premultiply_rgba8_in_place(&mut rgba);
        Ok(Self {
            width,
            height,
            rgba8_premul: Arc::new(rgba),
        })
    }

    /// Solid single-colour image (straight RGBA input).
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> GiftbeatResult<Self> {
        let px = (width as usize) * (height as usize);
        Self::from_straight_rgba8(width, height, rgba.repeat(px))
    }

    /// Premultiplied pixel at `(x, y)`; out-of-bounds reads are transparent.
    pub fn pixel(&self, x: i64, y: i64) -> [u8; 4] {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return [0, 0, 0, 0];
        }
        let idx = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        let d = &self.rgba8_premul;
        [d[idx], d[idx + 1], d[idx + 2], d[idx + 3]]
    }
}

/// Decode encoded image bytes and convert to premultiplied RGBA8.
pub fn decode_image(bytes: &[u8]) -> GiftbeatResult<DecodedImage> {
    let dyn_img = image::load_from_memory(bytes)
        .map_err(|e| GiftbeatError::decode(format!("decode image from memory: {e}")))?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    DecodedImage::from_straight_rgba8(width, height, rgba.into_raw())
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;

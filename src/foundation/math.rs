pub(crate) fn mul_div255_u16(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

pub(crate) fn mul_div255_u8(x: u16, y: u16) -> u8 {
    mul_div255_u16(x, y) as u8
}

/// Quantize an opacity in `[0, 1]` to an 8-bit coverage value.
pub(crate) fn opacity_u8(opacity: f32) -> u16 {
    ((opacity.clamp(0.0, 1.0) * 255.0).round() as i32).clamp(0, 255) as u16
}

/// Source-over for premultiplied RGBA8 with an extra opacity multiplier.
pub(crate) fn premul_over_px(dst: [u8; 4], src: [u8; 4], op: u16) -> [u8; 4] {
    if op == 0 || src[3] == 0 {
        return dst;
    }
    let sa = mul_div255_u16(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }
    let inv = 255u16 - sa;
    let mut out = [0u8; 4];
    out[3] = (sa + mul_div255_u16(u16::from(dst[3]), inv)).min(255) as u8;
    for c in 0..3 {
        let sc = mul_div255_u16(u16::from(src[c]), op);
        let dc = mul_div255_u16(u16::from(dst[c]), inv);
        out[c] = (sc + dc).min(255) as u8;
    }
    out
}

pub(crate) fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = mul_div255_u8(px[0] as u16, a);
        px[1] = mul_div255_u8(px[1] as u16, a);
        px[2] = mul_div255_u8(px[2] as u16, a);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;

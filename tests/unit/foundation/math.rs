use super::*;

#[test]
fn mul_div255_rounds_to_nearest() {
    assert_eq!(mul_div255_u16(255, 255), 255);
    assert_eq!(mul_div255_u16(128, 255), 128);
    assert_eq!(mul_div255_u16(255, 0), 0);
    assert_eq!(mul_div255_u8(100, 128), 50);
}

#[test]
fn opacity_quantization_clamps() {
    assert_eq!(opacity_u8(-1.0), 0);
    assert_eq!(opacity_u8(0.5), 128);
    assert_eq!(opacity_u8(2.0), 255);
}

#[test]
fn over_opacity_0_is_noop() {
    let dst = [1, 2, 3, 4];
    assert_eq!(premul_over_px(dst, [200, 200, 200, 200], 0), dst);
}

#[test]
fn over_src_opaque_replaces_dst() {
    let dst = [0, 0, 0, 255];
    let src = [255, 0, 0, 255];
    assert_eq!(premul_over_px(dst, src, 255), src);
}

#[test]
fn over_half_opacity_on_black_halves_channels() {
    let out = premul_over_px([0, 0, 0, 255], [200, 100, 0, 255], 128);
    assert_eq!(out, [100, 50, 0, 255]);
}

#[test]
fn premultiply_zeroes_transparent_pixels() {
    let mut px = vec![200u8, 100, 50, 0, 200, 100, 50, 255];
    premultiply_rgba8_in_place(&mut px);
    assert_eq!(px, vec![0, 0, 0, 0, 200, 100, 50, 255]);
}

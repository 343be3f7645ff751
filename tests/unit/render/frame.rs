use super::*;

#[test]
fn filled_frames_are_premultiplied() {
    let f = FrameRGBA::filled(Canvas::new(2, 1).unwrap(), [255, 0, 0, 128]);
    assert!(f.premultiplied);
    assert_eq!(f.data.len(), 8);
    assert_eq!(f.pixel(0, 0), Some([128, 0, 0, 128]));
    assert_eq!(f.pixel(2, 0), None);
    assert!(f.is_solid([255, 0, 0, 128]));
}

#[test]
fn straight_conversion_undoes_premultiplication() {
    let f = FrameRGBA::filled(Canvas::new(1, 1).unwrap(), [200, 100, 0, 128]);
    let straight = f.to_straight_rgba8();
    assert!((i32::from(straight[0]) - 200).abs() <= 1);
    assert!((i32::from(straight[1]) - 100).abs() <= 1);
    assert_eq!(straight[3], 128);
}

#[test]
fn clear_and_blend() {
    let mut f = FrameRGBA::filled(Canvas::new(1, 1).unwrap(), [0, 0, 0, 255]);
    f.blend_px(0, 0, [255, 255, 255, 255], 255);
    assert_eq!(f.pixel(0, 0), Some([255, 255, 255, 255]));
    f.clear([0, 0, 0, 255]);
    assert!(f.is_solid([0, 0, 0, 255]));
}

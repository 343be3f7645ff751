use std::io::Cursor;

use super::*;

#[test]
fn decode_image_png_dimensions_and_premul() {
    let src_rgba = vec![100u8, 50u8, 200u8, 128u8];
    let img = image::RgbaImage::from_raw(1, 1, src_rgba).unwrap();

    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();

    let decoded = decode_image(&buf).unwrap();
    assert_eq!(decoded.width, 1);
    assert_eq!(decoded.height, 1);
    assert_eq!(
        decoded.rgba8_premul.as_slice(),
        &[
            ((100u16 * 128 + 127) / 255) as u8,
            ((50u16 * 128 + 127) / 255) as u8,
            ((200u16 * 128 + 127) / 255) as u8,
            128u8
        ]
    );
}

#[test]
fn garbage_bytes_are_a_decode_error() {
    let err = decode_image(b"not an image").unwrap_err();
    assert!(err.is_decode());
}

#[test]
fn raw_buffers_must_match_dimensions() {
    assert!(DecodedImage::from_straight_rgba8(2, 2, vec![0u8; 4]).is_err());
    assert!(DecodedImage::from_straight_rgba8(0, 0, vec![]).is_err());
    let img = DecodedImage::solid(2, 1, [255, 0, 0, 255]).unwrap();
    assert_eq!(img.pixel(1, 0), [255, 0, 0, 255]);
    assert_eq!(img.pixel(2, 0), [0, 0, 0, 0]);
    assert_eq!(img.pixel(-1, 0), [0, 0, 0, 0]);
}

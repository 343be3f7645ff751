use super::*;

#[test]
fn fps_validation_and_conversions() {
    assert!(Fps::new(0, 1).is_err());
    assert!(Fps::new(30, 0).is_err());

    let fps = Fps::integer(30).unwrap();
    assert!((fps.frame_duration_secs() - 1.0 / 30.0).abs() < 1e-12);
    assert!((fps.frame_to_secs(FrameIndex(15)) - 0.5).abs() < 1e-12);
    assert_eq!(fps.secs_to_frames_round(9.0), 270);
    assert_eq!(fps.secs_to_frames_round(-1.0), 0);

    let ntsc = Fps::new(30_000, 1001).unwrap();
    assert!((ntsc.as_f64() - 29.97).abs() < 0.01);
}

#[test]
fn canvas_rejects_empty_dimensions() {
    assert!(Canvas::new(0, 10).is_err());
    let c = Canvas::new(4, 2).unwrap();
    assert_eq!(c.rgba_len(), 32);
    assert_eq!(c.rect(), Rect::new(0.0, 0.0, 4.0, 2.0));
}

#[test]
fn resolution_presets_resolve_to_even_canvases() {
    assert_eq!(
        Resolution::P1080.canvas(AspectRatio::Landscape16x9),
        Canvas {
            width: 1920,
            height: 1080
        }
    );
    assert_eq!(
        Resolution::P1080.canvas(AspectRatio::Portrait9x16),
        Canvas {
            width: 1080,
            height: 1920
        }
    );
    assert_eq!(
        Resolution::P720.canvas(AspectRatio::Square1x1),
        Canvas {
            width: 720,
            height: 720
        }
    );
    let sd = Resolution::P480.canvas(AspectRatio::Landscape16x9);
    assert_eq!(sd.height, 480);
    assert!(sd.width.is_multiple_of(2));
}

#[test]
fn presets_parse_from_project_strings() {
    assert_eq!("1080p".parse::<Resolution>().unwrap(), Resolution::P1080);
    assert_eq!(" 720P ".parse::<Resolution>().unwrap(), Resolution::P720);
    assert!("4k".parse::<Resolution>().is_err());
    assert_eq!(
        "16:9".parse::<AspectRatio>().unwrap(),
        AspectRatio::Landscape16x9
    );
    assert!("4:3".parse::<AspectRatio>().is_err());
}

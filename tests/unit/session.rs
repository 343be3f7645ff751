use std::io::Cursor;

use super::*;
use crate::{
    assets::{cache::VideoStream, decode::DecodedImage},
    export::sink::InMemorySink,
    foundation::core::Canvas,
    library::{media_library::VideoPolicy, resources::ResourceBody},
};

fn png_file(name: &str, rgba: [u8; 4]) -> IncomingFile {
    let img = image::RgbaImage::from_pixel(16, 9, image::Rgba(rgba));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    IncomingFile::new(name, "image/png", buf)
}

fn config() -> EngineConfig {
    EngineConfig::default()
        .with_preview_canvas(Canvas {
            width: 16,
            height: 9,
        })
        .with_export_size(Canvas {
            width: 16,
            height: 10,
        })
        .with_export_fps(10)
}

fn session_with(names: &[(&str, [u8; 4])]) -> (EditorSession, Vec<LibraryItemId>) {
    let mut s = EditorSession::new(config()).unwrap();
    let report = s.add_files(names.iter().map(|(n, c)| png_file(n, *c)));
    assert!(report.rejected.is_empty());
    s.take_events();
    (s, report.accepted)
}

struct StubVideo;

struct StubStream;

impl VideoDecoder for StubVideo {
    fn open(&self, _body: &ResourceBody) -> GiftbeatResult<Box<dyn VideoStream>> {
        Ok(Box::new(StubStream))
    }
}

impl VideoStream for StubStream {
    fn duration_secs(&self) -> Option<f64> {
        Some(7.5)
    }

    fn source_fps(&self) -> Option<f64> {
        Some(25.0)
    }

    fn frame_at(&mut self, _t: f64) -> GiftbeatResult<DecodedImage> {
        DecodedImage::solid(16, 9, [0, 255, 0, 255])
    }
}

#[test]
fn new_clips_take_the_default_transition() {
    let (mut s, ids) = session_with(&[("a.png", [255, 0, 0, 255])]);
    let first = s.add_clip(&ids[0]).unwrap();
    assert_eq!(
        s.timeline().get(&first).unwrap().transition(),
        ClipTransition {
            kind: TransitionKind::Fade,
            secs: Some(0.5)
        }
    );

    s.set_default_transition(TransitionKind::Wipe, Some(5.0))
        .unwrap();
    let second = s.add_clip(&ids[0]).unwrap();
    let tr = s.timeline().get(&second).unwrap().transition();
    assert_eq!(tr.kind, TransitionKind::Wipe);
    assert_eq!(tr.secs, Some(2.0));
}

#[test]
fn removing_a_library_item_cascades_to_clips() {
    let (mut s, ids) = session_with(&[("a.png", [255, 0, 0, 255]), ("b.png", [0, 0, 255, 255])]);
    s.add_clip(&ids[0]).unwrap();
    s.add_clip(&ids[1]).unwrap();
    s.add_clip(&ids[0]).unwrap();
    s.current_frame();

    assert_eq!(s.remove_library_item(&ids[0]).unwrap(), 2);
    assert_eq!(s.timeline().len(), 1);
    assert_eq!(s.timeline().clips()[0].start_time(), 0.0);
    assert_eq!(s.library().len(), 1);
    assert_eq!(s.registry().live_count(), 1);
    assert!(s.remove_library_item(&ids[0]).is_err());

    match s.take_events().last() {
        Some(SessionEvent::StateChanged(snap)) => {
            assert_eq!(snap.library_items.len(), 1);
            assert_eq!(snap.timeline_items.len(), 1);
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn rejected_commands_emit_nothing() {
    let (mut s, _) = session_with(&[("a.png", [255, 0, 0, 255])]);
    assert!(s.add_clip(&LibraryItemId("ghost".into())).is_err());
    assert!(s.remove_clip(&ClipId("ghost".into())).is_err());
    assert!(s.take_events().is_empty());
    assert!(s.timeline().is_empty());
}

#[test]
fn slideshow_uses_every_image_with_one_second_transitions() {
    let (mut s, _) = session_with(&[
        ("a.png", [255, 0, 0, 255]),
        ("b.png", [0, 255, 0, 255]),
        ("c.png", [0, 0, 255, 255]),
    ]);
    assert_eq!(
        s.build_slideshow(TransitionKind::Crossfade, SLIDESHOW_IMAGE_SECS)
            .unwrap(),
        3
    );
    assert!((s.timeline().total_duration() - 12.0).abs() < 1e-9);
    assert!(s
        .timeline()
        .clips()
        .iter()
        .all(|c| c.transition().secs == Some(SLIDESHOW_TRANSITION_SECS)));

    s.build_slideshow(TransitionKind::None, 2.0).unwrap();
    assert!(s
        .timeline()
        .clips()
        .iter()
        .all(|c| c.transition() == ClipTransition::none()));

    let (mut empty, _) = session_with(&[]);
    assert!(empty.build_slideshow(TransitionKind::Fade, 4.0).is_err());
}

#[test]
fn playback_runs_to_the_end_and_rewinds() {
    let (mut s, ids) = session_with(&[("a.png", [255, 0, 0, 255])]);
    assert!(s.play(0.0).is_err());
    s.add_clip(&ids[0]).unwrap();

    s.play(10.0).unwrap();
    assert!(s.is_playing());
    assert_eq!(s.cache().stats().image_decodes, 1);
    assert_eq!(s.tick(11.0), PlaybackTick::Rendered(1.0));
    assert!(s.current_frame().is_solid([255, 0, 0, 255]));
    assert_eq!(s.tick(13.5), PlaybackTick::Finished);
    assert!(!s.is_playing());
    assert_eq!(s.position(), 0.0);
    assert_eq!(s.tick(14.0), PlaybackTick::Idle);
}

#[test]
fn pause_keeps_the_frame_and_cancels_ticks() {
    let (mut s, ids) = session_with(&[("a.png", [255, 0, 0, 255]), ("b.png", [0, 0, 255, 255])]);
    let a = s.add_clip(&ids[0]).unwrap();
    s.set_transition(&a, TransitionKind::None, None).unwrap();
    s.add_clip(&ids[1]).unwrap();

    s.play(0.0).unwrap();
    s.tick(4.0);
    assert!((s.pause() - 4.0).abs() < 1e-9);
    assert!(s.current_frame().is_solid([0, 0, 255, 255]));
    assert_eq!(s.tick(5.0), PlaybackTick::Idle);
    assert!((s.position() - 4.0).abs() < 1e-9);
}

#[test]
fn seek_clamps_and_renders_immediately() {
    let (mut s, ids) = session_with(&[("a.png", [255, 0, 0, 255])]);
    s.add_clip(&ids[0]).unwrap();
    assert_eq!(s.seek(-2.0, 0.0), 0.0);
    assert_eq!(s.seek(100.0, 0.0), 3.0);
    assert!(s.current_frame().is_solid([255, 0, 0, 255]));
    assert!(!s.is_playing());
}

#[test]
fn export_registers_the_artifact_and_stops_playback() {
    let (mut s, ids) = session_with(&[("a.png", [255, 0, 0, 255])]);
    s.add_clip(&ids[0]).unwrap();
    s.play(0.0).unwrap();

    let mut sink = InMemorySink::new();
    let mut last = 0.0;
    let artifact = s
        .export(&mut sink, CancelToken::new(), |p| last = p)
        .unwrap()
        .unwrap();
    assert!(!s.is_playing());
    assert_eq!(artifact.frames, 30);
    assert_eq!(artifact.mime, InMemorySink::MIME);
    assert!(s.registry().is_live(&artifact.handle));
    assert_eq!(last, 1.0);
    assert_eq!(sink.config().unwrap().width, 16);
    assert!(s
        .take_events()
        .contains(&SessionEvent::ExportSucceeded(artifact)));
}

#[test]
fn export_of_an_empty_timeline_reports_failure() {
    let (mut s, _) = session_with(&[("a.png", [255, 0, 0, 255])]);
    let mut sink = InMemorySink::new();
    assert!(s.export(&mut sink, CancelToken::new(), |_| {}).is_err());
    assert!(matches!(
        s.take_events().as_slice(),
        [SessionEvent::ExportFailed(_)]
    ));
}

#[test]
fn advisories_are_reported_once() {
    let mut s = EditorSession::new(config()).unwrap();
    let report = s.add_files([IncomingFile::new("bad.png", "image/png", b"nope".to_vec())]);
    s.add_clip(&report.accepted[0]).unwrap();
    s.take_events();

    s.seek(0.5, 0.0);
    s.seek(1.0, 0.0);
    let advisories: Vec<_> = s
        .take_events()
        .into_iter()
        .filter(|e| matches!(e, SessionEvent::Advisory(_)))
        .collect();
    assert_eq!(advisories.len(), 1);
    assert!(s.current_frame().is_solid([0, 0, 0, 255]));
}

#[test]
fn hydration_happens_at_most_once() {
    let (mut source, ids) = session_with(&[("a.png", [255, 0, 0, 255])]);
    source.add_clip(&ids[0]).unwrap();
    let snap = source.snapshot();

    let mut s = EditorSession::new(config()).unwrap();
    assert!(!s.hydrate(&ProjectSnapshot::default(), Path::new(".")).unwrap());
    assert!(!s.is_hydrated());
    assert!(s.hydrate(&snap, Path::new(".")).unwrap());
    assert_eq!(s.timeline().len(), 1);
    assert!(!s.hydrate(&snap, Path::new(".")).unwrap());
    assert_eq!(s.timeline().len(), 1);
}

#[test]
fn video_metadata_corrects_provisional_durations() {
    let cfg = config().with_video_uploads(VideoPolicy::Enabled);
    let mut s = EditorSession::with_video_decoder(cfg, Box::new(StubVideo)).unwrap();
    let report = s.add_files([
        png_file("a.png", [255, 0, 0, 255]),
        IncomingFile::new("clip.mp4", "video/mp4", vec![0u8; 4]),
    ]);
    let video = report.accepted[1].clone();
    s.add_clip(&video).unwrap();
    let img = s.add_clip(&report.accepted[0]).unwrap();
    assert!((s.timeline().get(&img).unwrap().start_time() - 3.0).abs() < 1e-9);

    assert_eq!(s.probe_video_durations(), 1);
    assert!((s.timeline().get(&img).unwrap().start_time() - 7.5).abs() < 1e-9);
    assert_eq!(s.library().get(&video).unwrap().duration, Some(7.5));

    s.seek(1.0, 0.0);
    assert!(s.current_frame().is_solid([0, 255, 0, 255]));
}

#[test]
fn teardown_releases_everything() {
    let (mut s, ids) = session_with(&[("a.png", [255, 0, 0, 255]), ("b.png", [0, 0, 255, 255])]);
    s.add_clip(&ids[0]).unwrap();
    assert_eq!(s.teardown(), 2);
    assert_eq!(s.registry().live_count(), 0);
    assert!(s.library().is_empty());
    assert!(s.timeline().is_empty());
}

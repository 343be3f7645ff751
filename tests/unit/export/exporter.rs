use std::io::Cursor;

use super::*;
use crate::{
    assets::{
        cache::{VideoDecoder, VideoStream},
        decode::DecodedImage,
    },
    export::sink::InMemorySink,
    library::{
        media_library::{LibraryItem, LibraryItemId, MediaKind},
        resources::ResourceBody,
    },
    render::frame::FrameRGBA,
    timeline::model::ClipTransition,
};

fn png(rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(4, 2, image::Rgba(rgba));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

struct Project {
    registry: ResourceRegistry,
    library: MediaLibrary,
    timeline: Timeline,
}

impl Project {
    fn new() -> Self {
        Self {
            registry: ResourceRegistry::new(),
            library: MediaLibrary::new(),
            timeline: Timeline::new(),
        }
    }

    fn push(&mut self, id: &str, bytes: Vec<u8>, secs: f64) {
        let source = self.registry.acquire_bytes(bytes);
        let id = LibraryItemId(id.to_string());
        self.library
            .insert(LibraryItem {
                id: id.clone(),
                kind: MediaKind::Image,
                source,
                file_name: None,
                duration: None,
            })
            .unwrap();
        let clip = self
            .timeline
            .add_clip(&self.library, &id, ClipTransition::none())
            .unwrap();
        self.timeline.set_duration(&clip, secs).unwrap();
    }

    fn push_video(&mut self, id: &str, secs: f64) {
        let source = self.registry.acquire_bytes(b"video".to_vec());
        let id = LibraryItemId(id.to_string());
        self.library
            .insert(LibraryItem {
                id: id.clone(),
                kind: MediaKind::Video,
                source,
                file_name: None,
                duration: Some(secs),
            })
            .unwrap();
        self.timeline
            .add_clip(&self.library, &id, ClipTransition::none())
            .unwrap();
    }

    fn source(&self) -> ExportSource<'_> {
        ExportSource {
            timeline: &self.timeline,
            library: &self.library,
            registry: &self.registry,
        }
    }
}

fn opts(fps: u32) -> ExportOpts {
    ExportOpts {
        canvas: Canvas::new(4, 2).unwrap(),
        fps: Fps::integer(fps).unwrap(),
        fit: FitMode::Contain,
        background: [0, 0, 0, 255],
    }
}

struct FailingSink {
    fail_at: u64,
    aborted: bool,
}

impl FrameSink for FailingSink {
    fn begin(&mut self, _cfg: SinkConfig) -> GiftbeatResult<()> {
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, _frame: &FrameRGBA) -> GiftbeatResult<()> {
        if idx.0 == self.fail_at {
            return Err(GiftbeatError::encode("disk full"));
        }
        Ok(())
    }

    fn end(&mut self) -> GiftbeatResult<EncodedVideo> {
        Err(GiftbeatError::encode("unreachable in these tests"))
    }

    fn abort(&mut self) {
        self.aborted = true;
    }
}

fn completed(outcome: ExportOutcome) -> ExportReport {
    match outcome {
        ExportOutcome::Completed(r) => r,
        other => panic!("expected completion, got {other:?}"),
    }
}

#[test]
fn frame_count_covers_total_duration() {
    let mut p = Project::new();
    p.push("a", png([255, 0, 0, 255]), 2.0);
    p.push("b", png([0, 255, 0, 255]), 3.0);
    p.push("c", png([0, 0, 255, 255]), 4.0);
    assert_eq!(frame_count(p.timeline.total_duration(), Fps::integer(30).unwrap()), 270);

    let mut cache = AssetCache::new(0.1);
    let mut sink = InMemorySink::new();
    let report = completed(
        Exporter::new(opts(30))
            .run(p.source(), &mut cache, &mut sink)
            .unwrap(),
    );
    assert_eq!(report.frames, 270);
    assert_eq!(report.video.frames, 270);
    assert_eq!(report.blank_frames, 0);

    let frames = sink.frames();
    assert!(frames.windows(2).all(|w| w[0].0 < w[1].0));
    assert!(frames[0].1.is_solid([255, 0, 0, 255]));
    assert!(frames[60].1.is_solid([0, 255, 0, 255]));
    assert!(frames[269].1.is_solid([0, 0, 255, 255]));
    // Each image was decoded exactly once for the whole run.
    assert_eq!(cache.stats().image_decodes, 3);
}

#[test]
fn progress_is_monotonic_and_ends_at_one() {
    let mut p = Project::new();
    p.push("a", png([255, 0, 0, 255]), 1.0);
    let mut seen = Vec::new();
    let mut cache = AssetCache::new(0.1);
    let mut sink = InMemorySink::new();
    Exporter::new(opts(10))
        .on_progress(|f| seen.push(f))
        .run(p.source(), &mut cache, &mut sink)
        .unwrap();
    assert_eq!(seen.len(), 10);
    assert!(seen.windows(2).all(|w| w[0] < w[1]));
    assert!((seen[9] - 1.0).abs() < 1e-12);
}

#[test]
fn empty_timelines_fail_fast() {
    let p = Project::new();
    let mut cache = AssetCache::new(0.1);
    let mut sink = InMemorySink::new();
    let err = Exporter::new(opts(30))
        .run(p.source(), &mut cache, &mut sink)
        .unwrap_err();
    assert!(matches!(err, GiftbeatError::Validation(_)));
    assert!(sink.config().is_none());
}

#[test]
fn decode_failures_become_black_frames() {
    let mut p = Project::new();
    p.push("ok", png([255, 255, 255, 255]), 1.0);
    p.push("bad", b"garbage".to_vec(), 1.0);
    let mut cache = AssetCache::new(0.1);
    let mut sink = InMemorySink::new();
    let report = completed(
        Exporter::new(opts(10))
            .run(p.source(), &mut cache, &mut sink)
            .unwrap(),
    );
    assert_eq!(report.frames, 20);
    assert_eq!(report.blank_frames, 10);
    assert_eq!(report.advisories.len(), 1);
    assert!(sink.frames()[15].1.is_solid([0, 0, 0, 255]));
}

#[test]
fn sink_failures_abort_the_export() {
    let mut p = Project::new();
    p.push("a", png([255, 0, 0, 255]), 1.0);
    let mut cache = AssetCache::new(0.1);
    let mut sink = FailingSink {
        fail_at: 3,
        aborted: false,
    };
    let err = Exporter::new(opts(10))
        .run(p.source(), &mut cache, &mut sink)
        .unwrap_err();
    assert!(matches!(err, GiftbeatError::Encode(_)));
    assert!(sink.aborted);
}

#[test]
fn cancellation_discards_partial_output() {
    let mut p = Project::new();
    p.push("a", png([255, 0, 0, 255]), 1.0);
    let token = CancelToken::new();
    let trigger = token.clone();
    let mut cache = AssetCache::new(0.1);
    let mut sink = InMemorySink::new();
    let outcome = Exporter::new(opts(10))
        .with_cancel(token)
        .on_progress(move |f| {
            if f >= 0.5 {
                trigger.cancel();
            }
        })
        .run(p.source(), &mut cache, &mut sink)
        .unwrap();
    match outcome {
        ExportOutcome::Canceled { frames_written } => assert_eq!(frames_written, 5),
        other => panic!("expected cancel, got {other:?}"),
    }
    assert!(sink.frames().is_empty());
}

struct GreyRamp;

struct GreyRampStream;

impl VideoDecoder for GreyRamp {
    fn open(&self, _body: &ResourceBody) -> GiftbeatResult<Box<dyn VideoStream>> {
        Ok(Box::new(GreyRampStream))
    }
}

impl VideoStream for GreyRampStream {
    fn duration_secs(&self) -> Option<f64> {
        Some(2.0)
    }

    fn source_fps(&self) -> Option<f64> {
        Some(10.0)
    }

    fn frame_at(&mut self, t: f64) -> GiftbeatResult<DecodedImage> {
        let v = 10 + (t * 100.0).round() as u8;
        DecodedImage::solid(1, 1, [v, v, v, 255])
    }
}

#[test]
fn export_decodes_every_video_frame_even_with_a_loose_tolerance() {
    let mut p = Project::new();
    p.push_video("v", 2.0);

    let mut cache = AssetCache::with_video_decoder(10.0, Box::new(GreyRamp));
    let mut sink = InMemorySink::new();
    let report = completed(
        Exporter::new(opts(10))
            .run(p.source(), &mut cache, &mut sink)
            .unwrap(),
    );
    assert_eq!(report.frames, 20);
    assert_eq!(cache.stats().video_frame_decodes, 20);
    assert_eq!(sink.frames()[0].1.pixel(2, 1), Some([10, 10, 10, 255]));
    assert_eq!(sink.frames()[5].1.pixel(2, 1), Some([60, 60, 60, 255]));

    // Preview with the same tolerance keeps showing the first decoded frame.
    let preview = Renderer::new(Canvas::new(4, 2).unwrap(), FitMode::Contain, [0, 0, 0, 255]);
    let mut cache = AssetCache::with_video_decoder(10.0, Box::new(GreyRamp));
    for i in 0..20 {
        let t = f64::from(i) * 0.1;
        let out = preview
            .render_frame(&p.timeline, &p.library, &p.registry, &mut cache, t)
            .unwrap();
        assert_eq!(out.frame.pixel(2, 1), Some([10, 10, 10, 255]), "t={t}");
    }
    assert_eq!(cache.stats().video_frame_decodes, 1);
}

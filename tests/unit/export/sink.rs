use super::*;
use crate::foundation::core::Canvas;

fn cfg() -> SinkConfig {
    SinkConfig {
        width: 2,
        height: 2,
        fps: Fps::integer(30).unwrap(),
    }
}

fn frame() -> FrameRGBA {
    FrameRGBA::filled(Canvas::new(2, 2).unwrap(), [0, 0, 0, 255])
}

#[test]
fn in_memory_sink_collects_frames_in_order() {
    let mut sink = InMemorySink::new();
    sink.begin(cfg()).unwrap();
    sink.push_frame(FrameIndex(0), &frame()).unwrap();
    sink.push_frame(FrameIndex(1), &frame()).unwrap();
    assert!(sink.push_frame(FrameIndex(1), &frame()).is_err());

    let out = sink.end().unwrap();
    assert_eq!(out.frames, 2);
    assert_eq!(out.mime, InMemorySink::MIME);
    assert_eq!(out.bytes.len(), 2 * 2 * 2 * 4);
    assert_eq!(sink.config(), Some(cfg()));
}

#[test]
fn in_memory_sink_rejects_wrong_sizes_and_unstarted_use() {
    let mut sink = InMemorySink::new();
    assert!(sink.push_frame(FrameIndex(0), &frame()).is_err());
    assert!(sink.end().is_err());

    sink.begin(cfg()).unwrap();
    let big = FrameRGBA::filled(Canvas::new(4, 4).unwrap(), [0, 0, 0, 255]);
    assert!(sink.push_frame(FrameIndex(0), &big).is_err());
}

#[test]
fn abort_discards_frames() {
    let mut sink = InMemorySink::new();
    sink.begin(cfg()).unwrap();
    sink.push_frame(FrameIndex(0), &frame()).unwrap();
    sink.abort();
    assert!(sink.frames().is_empty());
    assert!(sink.end().is_err());
}

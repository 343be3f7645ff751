/// Timeline-to-sink frame stepping.
pub mod exporter;
/// MP4 sink piping raw frames into ffmpeg.
pub mod ffmpeg;
/// Frame sink contract and the in-memory sink.
pub mod sink;

pub use exporter::{
    CancelToken, ExportOpts, ExportOutcome, ExportReport, ExportSource, Exporter, frame_count,
};
pub use ffmpeg::{FfmpegSink, FfmpegSinkOpts, MP4_MIME};
pub use sink::{EncodedVideo, FrameSink, InMemorySink, SinkConfig};

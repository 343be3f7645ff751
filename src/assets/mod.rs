/// Per-session decode cache for images and video frames.
pub mod cache;
/// Still-image decoding into premultiplied RGBA.
pub mod decode;
/// ffprobe/ffmpeg plumbing for video sources.
pub mod media;

//! Encoding collaborators.
//!
//! The renderer only talks to [`sink::FrameSink`]; the ffmpeg-backed pieces turn the streamed
//! frames into an intermediate video and then a palette-optimized GIF.

/// Streaming `ffmpeg` sink producing the intermediate video.
pub mod ffmpeg;
/// Two-pass palette GIF encoding.
pub mod palette;
/// Frame sink trait and built-in sinks.
pub mod sink;

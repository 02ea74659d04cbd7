//! Encoding sinks.
//!
//! Sinks consume composited canvases in output order.

/// `ffmpeg`-based sink (system `ffmpeg` binary).
pub mod ffmpeg;
/// Generic frame sink trait and built-in sinks.
pub mod sink;

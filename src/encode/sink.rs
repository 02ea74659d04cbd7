use image::RgbImage;

use crate::foundation::core::{CanvasSize, Fourcc, Fps, FrameIndex};
use crate::foundation::error::CollageResult;

/// Configuration provided to a [`FrameSink`] before the first frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkConfig {
    /// Output frame size in pixels (the canvas size).
    pub size: CanvasSize,
    /// Output frames-per-second.
    pub fps: Fps,
    /// Requested output codec.
    pub codec: Fourcc,
}

/// Sink contract for consuming composited frames in output order.
///
/// Ordering contract: `push_frame` is called with strictly increasing [`FrameIndex`] values.
/// `begin` failing means the writer could not be opened.
pub trait FrameSink {
    /// Called once before any frames are pushed.
    fn begin(&mut self, cfg: SinkConfig) -> CollageResult<()>;
    /// Push one frame in strictly increasing order.
    fn push_frame(&mut self, idx: FrameIndex, frame: &RgbImage) -> CollageResult<()>;
    /// Called once after the last frame is pushed.
    fn end(&mut self) -> CollageResult<()>;
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<(FrameIndex, RgbImage)>,
    ended: bool,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<SinkConfig> {
        self.cfg
    }

    /// Captured frames in output order.
    pub fn frames(&self) -> &[(FrameIndex, RgbImage)] {
        &self.frames
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> CollageResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        self.ended = false;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &RgbImage) -> CollageResult<()> {
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> CollageResult<()> {
        self.ended = true;
        Ok(())
    }
}

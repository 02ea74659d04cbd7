use std::path::Path;

use image::RgbImage;

use crate::foundation::error::CollageResult;

/// Sequential decoder for one input video.
///
/// Frames are read strictly in order; there is no seeking.
pub trait FrameSource {
    /// Frame count reported by the container at open time.
    fn frame_count(&self) -> u64;

    /// Decode the next frame, or `Ok(None)` at end of stream.
    fn read_next_frame(&mut self) -> CollageResult<Option<RgbImage>>;

    /// Release decoder resources. Must be idempotent; implementations also release on drop.
    fn release(&mut self);
}

/// Opens [`FrameSource`]s by path.
pub trait SourceProvider {
    fn open(&self, path: &Path) -> CollageResult<Box<dyn FrameSource>>;
}

/// Stand-in for a source that could not be opened: zero frames, never painted.
#[derive(Debug, Default)]
pub struct UnavailableSource;

impl FrameSource for UnavailableSource {
    fn frame_count(&self) -> u64 {
        0
    }

    fn read_next_frame(&mut self) -> CollageResult<Option<RgbImage>> {
        Ok(None)
    }

    fn release(&mut self) {}
}

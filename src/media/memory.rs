//! In-memory sources for tests and debugging.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use image::RgbImage;

use crate::foundation::error::{CollageError, CollageResult};
use crate::media::source::{FrameSource, SourceProvider};

/// A source backed by pre-decoded frames.
///
/// `reported_frames` may differ from `frames.len()` to model containers whose frame count does
/// not match what is actually decodable.
#[derive(Clone, Debug)]
pub struct MemoryClip {
    pub frames: Vec<RgbImage>,
    pub reported_frames: u64,
    /// Zero-based read at which decoding fails with a source error.
    pub fail_at: Option<usize>,
}

impl MemoryClip {
    pub fn new(frames: Vec<RgbImage>) -> Self {
        let reported_frames = frames.len() as u64;
        Self {
            frames,
            reported_frames,
            fail_at: None,
        }
    }

    /// `count` frames of one solid color.
    pub fn solid(width: u32, height: u32, rgb: [u8; 3], count: usize) -> Self {
        Self::new(vec![RgbImage::from_pixel(width, height, image::Rgb(rgb)); count])
    }

    /// `count` frames where frame `i` is filled with `color_at(i)`.
    pub fn sequence(
        width: u32,
        height: u32,
        count: usize,
        color_at: impl Fn(usize) -> [u8; 3],
    ) -> Self {
        Self::new(
            (0..count)
                .map(|i| RgbImage::from_pixel(width, height, image::Rgb(color_at(i))))
                .collect(),
        )
    }

    pub fn with_reported_frames(mut self, reported: u64) -> Self {
        self.reported_frames = reported;
        self
    }

    /// Make read number `read` (zero-based) fail instead of returning a frame.
    pub fn failing_at(mut self, read: usize) -> Self {
        self.fail_at = Some(read);
        self
    }
}

/// Provider resolving paths to registered [`MemoryClip`]s. Unknown paths fail to open.
#[derive(Debug, Default)]
pub struct MemoryProvider {
    clips: HashMap<PathBuf, MemoryClip>,
    log: Arc<Mutex<SourceLog>>,
}

/// Open/release bookkeeping shared by a provider and its sources.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SourceLog {
    pub opened: Vec<PathBuf>,
    pub released: Vec<PathBuf>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, clip: MemoryClip) -> &mut Self {
        self.clips.insert(path.into(), clip);
        self
    }

    pub fn with(mut self, path: impl Into<PathBuf>, clip: MemoryClip) -> Self {
        self.insert(path, clip);
        self
    }

    /// Snapshot of which sources were opened and released so far.
    pub fn log(&self) -> SourceLog {
        self.log
            .lock()
            .map(|l| l.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

impl SourceProvider for MemoryProvider {
    fn open(&self, path: &Path) -> CollageResult<Box<dyn FrameSource>> {
        let clip = self
            .clips
            .get(path)
            .ok_or_else(|| CollageError::source(format!("no such clip '{}'", path.display())))?;
        if let Ok(mut log) = self.log.lock() {
            log.opened.push(path.to_path_buf());
        }
        Ok(Box::new(MemorySource {
            path: path.to_path_buf(),
            frames: clip.frames.clone().into_iter(),
            reported_frames: clip.reported_frames,
            fail_at: clip.fail_at,
            reads: 0,
            log: Arc::clone(&self.log),
            released: false,
        }))
    }
}

struct MemorySource {
    path: PathBuf,
    frames: std::vec::IntoIter<RgbImage>,
    reported_frames: u64,
    fail_at: Option<usize>,
    reads: usize,
    log: Arc<Mutex<SourceLog>>,
    released: bool,
}

impl FrameSource for MemorySource {
    fn frame_count(&self) -> u64 {
        self.reported_frames
    }

    fn read_next_frame(&mut self) -> CollageResult<Option<RgbImage>> {
        if self.released {
            return Err(CollageError::source(format!(
                "read from released source '{}'",
                self.path.display()
            )));
        }
        let read = self.reads;
        self.reads += 1;
        if self.fail_at == Some(read) {
            return Err(CollageError::source(format!(
                "decode failed at read {read} of '{}'",
                self.path.display()
            )));
        }
        Ok(self.frames.next())
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Ok(mut log) = self.log.lock() {
            log.released.push(self.path.clone());
        }
    }
}

impl Drop for MemorySource {
    fn drop(&mut self) {
        self.release();
    }
}

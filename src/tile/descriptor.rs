use std::path::Path;

use crate::foundation::core::TileRect;
use crate::tile::spec::TileSpec;

/// A tile after its source has been probed.
///
/// The frame count is fixed at construction; descriptors are read-only for the rest of a run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileDescriptor {
    spec: TileSpec,
    frame_count: u64,
}

impl TileDescriptor {
    pub fn probed(spec: TileSpec, frame_count: u64) -> Self {
        Self { spec, frame_count }
    }

    pub fn spec(&self) -> &TileSpec {
        &self.spec
    }

    pub fn source_path(&self) -> &Path {
        &self.spec.source_path
    }

    pub fn rect(&self) -> TileRect {
        self.spec.rect
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Whether this tile still has a frame to paint at output frame `frame`.
    pub fn is_active_at(&self, frame: u64) -> bool {
        frame < self.frame_count
    }
}

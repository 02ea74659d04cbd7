//! Output geometry derived from the probed tiles.

use crate::foundation::core::CanvasSize;
use crate::foundation::error::{CollageError, CollageResult};
use crate::tile::descriptor::TileDescriptor;

/// Canvas size and output length of a composite.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Layout {
    pub canvas: CanvasSize,
    pub total_frames: u64,
}

impl Layout {
    /// Fold one tile into the running extent.
    pub fn include(self, tile: &TileDescriptor) -> Self {
        Self {
            canvas: self.canvas.grow_to(tile.rect()),
            total_frames: self.total_frames.max(tile.frame_count()),
        }
    }
}

/// `canvas = (max(x + w), max(y + h))`, `total_frames = max(frame_count)` over all tiles.
///
/// Every tile lies inside the resulting canvas by construction. An empty tile set is rejected.
pub fn resolve_layout(tiles: &[TileDescriptor]) -> CollageResult<Layout> {
    if tiles.is_empty() {
        return Err(CollageError::usage("at least one tile spec is required"));
    }
    Ok(tiles.iter().fold(Layout::default(), Layout::include))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::spec::TileSpec;

    fn tile(spec: &str, frames: u64) -> TileDescriptor {
        TileDescriptor::probed(TileSpec::parse(spec).unwrap(), frames)
    }

    #[test]
    fn single_tile_canvas_matches_its_extent() {
        let layout = resolve_layout(&[tile("a.mp4@320x240+10+20", 7)]).unwrap();
        assert_eq!(layout.canvas, CanvasSize { width: 330, height: 260 });
        assert_eq!(layout.total_frames, 7);
    }

    #[test]
    fn side_by_side_tiles() {
        let layout = resolve_layout(&[
            tile("a.mp4@100x100+0+0", 10),
            tile("b.mp4@100x100+100+0", 25),
            tile("c.mp4@100x100+200+0", 5),
        ])
        .unwrap();
        assert_eq!(layout.canvas, CanvasSize { width: 300, height: 100 });
        assert_eq!(layout.total_frames, 25);
    }

    #[test]
    fn overlapping_tiles_use_max_extent() {
        let layout = resolve_layout(&[
            tile("a.mp4@200x100+0+0", 3),
            tile("b.mp4@50x150+20+10", 0),
        ])
        .unwrap();
        assert_eq!(layout.canvas, CanvasSize { width: 200, height: 160 });
        assert_eq!(layout.total_frames, 3);
    }

    #[test]
    fn every_tile_is_inside_the_canvas() {
        let tiles = [
            tile("a.mp4@17x3+5+90", 1),
            tile("b.mp4@64x64+0+0", 1),
            tile("c.mp4@1x1+120+1", 1),
        ];
        let layout = resolve_layout(&tiles).unwrap();
        for t in &tiles {
            assert!(t.rect().right() <= layout.canvas.width);
            assert!(t.rect().bottom() <= layout.canvas.height);
        }
    }

    #[test]
    fn empty_tile_set_is_rejected() {
        assert!(matches!(resolve_layout(&[]), Err(CollageError::Usage(_))));
    }
}

//! The frame loop: decode, resize and blit every active tile into one persistent canvas, then
//! hand the canvas to the sink.
//!
//! Paint order is input order: tile `i + 1` is drawn after tile `i`, so where rectangles overlap
//! the later tile wins. The canvas is not cleared between frames unless
//! [`CompositorOpts::clear_each_frame`] is set, so a tile whose source has ended keeps showing its
//! last painted frame.

use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};

use crate::encode::sink::FrameSink;
use crate::foundation::core::{FrameIndex, TileRect};
use crate::foundation::error::{CollageError, CollageResult};
use crate::layout::Layout;
use crate::probe::{ProbedTiles, SourcePolicy};
use crate::report::{DecadeProgress, Reporter};

/// Resampling filter used to fit source frames to their tile (cubic).
pub const RESIZE_FILTER: FilterType = FilterType::CatmullRom;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompositorOpts {
    /// Fill the canvas with `background` before painting each frame.
    pub clear_each_frame: bool,
    /// Initial canvas color (and per-frame fill when clearing).
    pub background: [u8; 3],
    /// Handling of sources that fail mid-run.
    pub source_policy: SourcePolicy,
}

impl Default for CompositorOpts {
    fn default() -> Self {
        Self {
            clear_each_frame: false,
            background: [0, 0, 0],
            source_policy: SourcePolicy::Lenient,
        }
    }
}

/// Counters from one compositing run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CompositeStats {
    pub frames_written: u64,
    /// Tile frames actually decoded and painted.
    pub tiles_painted: u64,
    /// Sources that ended (or failed) before their reported frame count.
    pub short_reads: u64,
}

pub struct Compositor {
    layout: Layout,
    opts: CompositorOpts,
    canvas: RgbImage,
    /// Per tile: source ended before its reported frame count.
    ended_early: Vec<bool>,
    stats: CompositeStats,
}

impl Compositor {
    pub fn new(layout: Layout, tile_count: usize, opts: CompositorOpts) -> Self {
        Self {
            canvas: RgbImage::from_pixel(
                layout.canvas.width,
                layout.canvas.height,
                Rgb(opts.background),
            ),
            layout,
            opts,
            ended_early: vec![false; tile_count],
            stats: CompositeStats::default(),
        }
    }

    pub fn canvas(&self) -> &RgbImage {
        &self.canvas
    }

    pub fn stats(&self) -> CompositeStats {
        self.stats
    }

    /// Paint every tile that still has a frame at `frame` into the canvas.
    pub fn paint_frame(&mut self, frame: u64, probed: &mut ProbedTiles) -> CollageResult<()> {
        if self.opts.clear_each_frame {
            let bg = Rgb(self.opts.background);
            self.canvas.pixels_mut().for_each(|px| *px = bg);
        }

        for (i, (tile, source)) in probed
            .tiles
            .iter()
            .zip(probed.sources.iter_mut())
            .enumerate()
        {
            if !tile.is_active_at(frame) || self.ended_early[i] {
                continue;
            }

            let decoded = match source.read_next_frame() {
                Ok(Some(decoded)) => decoded,
                Ok(None) => {
                    tracing::warn!(
                        tile = i,
                        path = %tile.source_path().display(),
                        frame,
                        reported = tile.frame_count(),
                        "source ended early, keeping its last frame"
                    );
                    self.mark_ended(i);
                    continue;
                }
                Err(e) => match self.opts.source_policy {
                    SourcePolicy::Strict => {
                        return Err(CollageError::source(format!(
                            "tile {i} ('{}') failed at frame {frame}: {e}",
                            tile.source_path().display()
                        )));
                    }
                    SourcePolicy::Lenient => {
                        tracing::warn!(
                            tile = i,
                            path = %tile.source_path().display(),
                            frame,
                            "source read failed, treating as ended: {e}"
                        );
                        self.mark_ended(i);
                        continue;
                    }
                },
            };

            blit_resized(&mut self.canvas, &decoded, tile.rect());
            self.stats.tiles_painted += 1;
        }
        Ok(())
    }

    /// Run all `layout.total_frames` iterations, pushing each finished canvas to `sink`.
    ///
    /// The sink must already be started; finalizing it is left to the caller.
    pub fn run(
        &mut self,
        probed: &mut ProbedTiles,
        sink: &mut dyn FrameSink,
        reporter: &mut dyn Reporter,
    ) -> CollageResult<CompositeStats> {
        let total = self.layout.total_frames;
        let mut progress = DecadeProgress::new(total);

        for frame in 0..total {
            self.paint_frame(frame, probed)?;
            for pct in progress.advance(frame) {
                reporter.percent(pct);
            }
            sink.push_frame(FrameIndex(frame), &self.canvas)?;
            self.stats.frames_written += 1;
            tracing::trace!(frame, "frame written");
        }
        reporter.finished();
        Ok(self.stats)
    }

    fn mark_ended(&mut self, tile: usize) {
        self.ended_early[tile] = true;
        self.stats.short_reads += 1;
    }
}

/// Resize `frame` to exactly `rect`'s size and copy it to `rect`'s position.
pub fn blit_resized(canvas: &mut RgbImage, frame: &RgbImage, rect: TileRect) {
    let (x, y) = (i64::from(rect.x), i64::from(rect.y));
    if frame.dimensions() == (rect.width, rect.height) {
        imageops::replace(canvas, frame, x, y);
    } else {
        let resized = imageops::resize(frame, rect.width, rect.height, RESIZE_FILTER);
        imageops::replace(canvas, &resized, x, y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::sink::{InMemorySink, SinkConfig};
    use crate::foundation::core::{Fourcc, Fps};
    use crate::layout::resolve_layout;
    use crate::media::memory::{MemoryClip, MemoryProvider};
    use crate::probe::probe_tiles;
    use crate::report::SilentReporter;
    use crate::tile::spec::parse_tile_specs;

    const RED: [u8; 3] = [255, 0, 0];
    const BLUE: [u8; 3] = [0, 0, 255];

    fn run(
        provider: &MemoryProvider,
        tokens: &[&str],
        opts: CompositorOpts,
    ) -> CollageResult<(InMemorySink, CompositeStats)> {
        let specs = parse_tile_specs(tokens)?;
        let mut probed = probe_tiles(specs, provider, opts.source_policy)?;
        let layout = resolve_layout(&probed.tiles)?;
        let mut sink = InMemorySink::new();
        sink.begin(SinkConfig {
            size: layout.canvas,
            fps: Fps::default(),
            codec: Fourcc::default(),
        })?;
        let mut compositor = Compositor::new(layout, probed.tiles.len(), opts);
        let stats = compositor.run(&mut probed, &mut sink, &mut SilentReporter)?;
        Ok((sink, stats))
    }

    fn px(sink: &InMemorySink, frame: usize, x: u32, y: u32) -> [u8; 3] {
        sink.frames()[frame].1.get_pixel(x, y).0
    }

    #[test]
    fn output_length_is_longest_input() {
        let provider = MemoryProvider::new()
            .with("a.mp4", MemoryClip::solid(4, 4, RED, 10))
            .with("b.mp4", MemoryClip::solid(4, 4, RED, 25))
            .with("c.mp4", MemoryClip::solid(4, 4, RED, 5));
        let (sink, stats) = run(
            &provider,
            &["a.mp4@4x4+0+0", "b.mp4@4x4+4+0", "c.mp4@4x4+8+0"],
            CompositorOpts::default(),
        )
        .unwrap();
        assert_eq!(sink.frames().len(), 25);
        assert_eq!(stats.frames_written, 25);
        assert_eq!(stats.tiles_painted, 40);
        assert_eq!(stats.short_reads, 0);
        let indices: Vec<u64> = sink.frames().iter().map(|(i, _)| i.0).collect();
        assert_eq!(indices, (0..25).collect::<Vec<_>>());
    }

    #[test]
    fn later_tile_paints_over_earlier_tile() {
        let provider = MemoryProvider::new()
            .with("under.mp4", MemoryClip::solid(8, 8, RED, 3))
            .with("over.mp4", MemoryClip::solid(8, 8, BLUE, 3));
        let (sink, _) = run(
            &provider,
            &["under.mp4@8x8+0+0", "over.mp4@8x8+0+0"],
            CompositorOpts::default(),
        )
        .unwrap();
        for (_, frame) in sink.frames() {
            assert!(frame.pixels().all(|p| p.0 == BLUE));
        }
    }

    #[test]
    fn exhausted_tile_keeps_its_last_frame() {
        let provider = MemoryProvider::new()
            .with("short.mp4", MemoryClip::sequence(4, 4, 5, |i| [i as u8 * 10, 0, 0]))
            .with("long.mp4", MemoryClip::solid(4, 4, BLUE, 10));
        let (sink, _) = run(
            &provider,
            &["short.mp4@4x4+0+0", "long.mp4@4x4+4+0"],
            CompositorOpts::default(),
        )
        .unwrap();
        assert_eq!(sink.frames().len(), 10);
        assert_eq!(px(&sink, 4, 0, 0), [40, 0, 0]);
        for f in 5..10 {
            assert_eq!(px(&sink, f, 0, 0), [40, 0, 0]);
            assert_eq!(px(&sink, f, 5, 1), BLUE);
        }
    }

    #[test]
    fn clear_each_frame_blanks_exhausted_tiles() {
        let provider = MemoryProvider::new()
            .with("short.mp4", MemoryClip::solid(4, 4, RED, 2))
            .with("long.mp4", MemoryClip::solid(4, 4, BLUE, 4));
        let opts = CompositorOpts {
            clear_each_frame: true,
            background: [7, 7, 7],
            ..CompositorOpts::default()
        };
        let (sink, _) = run(&provider, &["short.mp4@4x4+0+0", "long.mp4@4x4+4+0"], opts).unwrap();
        assert_eq!(px(&sink, 1, 0, 0), RED);
        assert_eq!(px(&sink, 2, 0, 0), [7, 7, 7]);
        assert_eq!(px(&sink, 3, 6, 2), BLUE);
    }

    #[test]
    fn uncovered_canvas_starts_at_background() {
        let provider = MemoryProvider::new()
            .with("a.mp4", MemoryClip::solid(2, 2, RED, 1))
            .with("b.mp4", MemoryClip::solid(2, 2, BLUE, 1));
        let (sink, _) = run(
            &provider,
            &["a.mp4@2x2+0+0", "b.mp4@2x2+4+4"],
            CompositorOpts::default(),
        )
        .unwrap();
        assert_eq!(px(&sink, 0, 3, 3), [0, 0, 0]);
        assert_eq!(px(&sink, 0, 1, 1), RED);
        assert_eq!(px(&sink, 0, 5, 5), BLUE);
    }

    #[test]
    fn frames_are_resized_to_the_tile() {
        let provider = MemoryProvider::new().with("big.mp4", MemoryClip::solid(40, 30, RED, 1));
        let (sink, _) = run(&provider, &["big.mp4@10x10+5+0"], CompositorOpts::default()).unwrap();
        let frame = &sink.frames()[0].1;
        assert_eq!(frame.dimensions(), (15, 10));
        assert_eq!(frame.get_pixel(5, 0).0, RED);
        assert_eq!(frame.get_pixel(14, 9).0, RED);
        assert_eq!(frame.get_pixel(4, 9).0, [0, 0, 0]);
    }

    #[test]
    fn short_source_is_treated_as_early_end() {
        let provider = MemoryProvider::new().with(
            "liar.mp4",
            MemoryClip::sequence(2, 2, 3, |i| [0, i as u8 + 1, 0]).with_reported_frames(6),
        );
        let (sink, stats) =
            run(&provider, &["liar.mp4@2x2+0+0"], CompositorOpts::default()).unwrap();
        assert_eq!(sink.frames().len(), 6);
        assert_eq!(stats.short_reads, 1);
        assert_eq!(stats.tiles_painted, 3);
        for f in 2..6 {
            assert_eq!(px(&sink, f, 0, 0), [0, 3, 0]);
        }
    }

    #[test]
    fn lenient_read_failure_ends_the_tile_and_keeps_its_last_frame() {
        let provider = MemoryProvider::new()
            .with(
                "flaky.mp4",
                MemoryClip::sequence(2, 2, 6, |i| [i as u8 + 1, 0, 0]).failing_at(2),
            )
            .with("steady.mp4", MemoryClip::solid(2, 2, BLUE, 6));
        let (sink, stats) = run(
            &provider,
            &["flaky.mp4@2x2+0+0", "steady.mp4@2x2+2+0"],
            CompositorOpts::default(),
        )
        .unwrap();
        assert_eq!(sink.frames().len(), 6);
        assert_eq!(stats.short_reads, 1);
        assert_eq!(stats.tiles_painted, 2 + 6);
        for f in 1..6 {
            assert_eq!(px(&sink, f, 0, 0), [2, 0, 0]);
            assert_eq!(px(&sink, f, 3, 1), BLUE);
        }
    }

    #[test]
    fn strict_read_failure_aborts_the_run() {
        let provider = MemoryProvider::new().with(
            "flaky.mp4",
            MemoryClip::sequence(2, 2, 6, |i| [i as u8 + 1, 0, 0]).failing_at(2),
        );
        let opts = CompositorOpts {
            source_policy: SourcePolicy::Strict,
            ..CompositorOpts::default()
        };
        let err = run(&provider, &["flaky.mp4@2x2+0+0"], opts).unwrap_err();
        assert!(matches!(err, CollageError::Source(_)));
        assert!(err.to_string().contains("frame 2"));
        assert_eq!(provider.log().released, provider.log().opened);
    }

    #[test]
    fn zero_frame_tile_is_never_painted() {
        let provider = MemoryProvider::new()
            .with("empty.mp4", MemoryClip::solid(2, 2, RED, 0))
            .with("b.mp4", MemoryClip::solid(2, 2, BLUE, 2));
        let (sink, stats) = run(
            &provider,
            &["empty.mp4@2x2+0+0", "b.mp4@2x2+2+0"],
            CompositorOpts::default(),
        )
        .unwrap();
        assert_eq!(stats.tiles_painted, 2);
        assert_eq!(px(&sink, 1, 0, 0), [0, 0, 0]);
    }
}

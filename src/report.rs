//! User-facing progress output (the `--verbose` echo), separate from `tracing` diagnostics.

use std::io::Write;

use crate::layout::Layout;
use crate::tile::spec::TileSpec;

/// Receives run milestones.
pub trait Reporter {
    fn tile_added(&mut self, index: usize, spec: &TileSpec);
    fn layout_resolved(&mut self, layout: &Layout);
    /// A 10% boundary was crossed; `percent` is a multiple of 10 below 100.
    fn percent(&mut self, percent: u32);
    fn finished(&mut self);
}

/// Discards everything.
#[derive(Debug, Default)]
pub struct SilentReporter;

impl Reporter for SilentReporter {
    fn tile_added(&mut self, _index: usize, _spec: &TileSpec) {}
    fn layout_resolved(&mut self, _layout: &Layout) {}
    fn percent(&mut self, _percent: u32) {}
    fn finished(&mut self) {}
}

/// Plain-text reporter, `...10%...20%` style.
///
/// Write errors are ignored; progress output never fails a run.
#[derive(Debug)]
pub struct ConsoleReporter<W: Write> {
    out: W,
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Reporter for ConsoleReporter<W> {
    fn tile_added(&mut self, index: usize, spec: &TileSpec) {
        let _ = writeln!(self.out, "Adding tile {index}: {spec}");
    }

    fn layout_resolved(&mut self, layout: &Layout) {
        let _ = writeln!(
            self.out,
            "Calculated final composite size {}, {} frames",
            layout.canvas, layout.total_frames
        );
    }

    fn percent(&mut self, percent: u32) {
        let _ = write!(self.out, "...{percent}%");
        let _ = self.out.flush();
    }

    fn finished(&mut self) {
        let _ = writeln!(self.out, "...100%");
        let _ = self.out.flush();
    }
}

/// Tracks which 10% boundaries of `total` frames have been crossed.
#[derive(Clone, Copy, Debug)]
pub struct DecadeProgress {
    total: u64,
    decade: u64,
}

impl DecadeProgress {
    pub fn new(total: u64) -> Self {
        Self { total, decade: 0 }
    }

    /// Percentages newly crossed at output frame `frame` (`frame * 10 / total`, floored).
    pub fn advance(&mut self, frame: u64) -> impl Iterator<Item = u32> + use<> {
        let reached = if self.total == 0 {
            0
        } else {
            frame.saturating_mul(10) / self.total
        };
        let first = self.decade + 1;
        self.decade = self.decade.max(reached.min(9));
        (first..=self.decade).map(|d| (d * 10) as u32)
    }
}

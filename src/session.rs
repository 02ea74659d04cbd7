//! End-to-end run: specs -> probe -> layout -> open writer -> frame loop -> release.

use std::path::PathBuf;

use crate::compositor::{Compositor, CompositorOpts};
use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts};
use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::{CanvasSize, Fourcc, Fps};
use crate::foundation::error::{CollageError, CollageResult};
use crate::layout::resolve_layout;
use crate::media::ffmpeg::FfmpegProvider;
use crate::media::source::SourceProvider;
use crate::probe::probe_tiles;
use crate::report::Reporter;
use crate::tile::spec::TileSpec;

/// Output file written when no path is given.
pub const DEFAULT_OUTPUT: &str = "composite.avi";

/// Settings for one composite run.
#[derive(Clone, Debug)]
pub struct CollageOpts {
    pub codec: Fourcc,
    pub fps: Fps,
    pub output: PathBuf,
    /// Replace an existing output file.
    pub overwrite: bool,
    pub compositor: CompositorOpts,
}

impl Default for CollageOpts {
    fn default() -> Self {
        Self {
            codec: Fourcc::default(),
            fps: Fps::default(),
            output: PathBuf::from(DEFAULT_OUTPUT),
            overwrite: true,
            compositor: CompositorOpts::default(),
        }
    }
}

/// Summary of a finished run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CollageStats {
    pub canvas: CanvasSize,
    pub total_frames: u64,
    pub frames_written: u64,
    pub tiles: usize,
    pub tiles_painted: u64,
    pub short_reads: u64,
}

/// Parse tile tokens in order, echoing each to `reporter`. No tokens is a usage error.
pub fn collect_specs<S: AsRef<str>>(
    tokens: &[S],
    reporter: &mut dyn Reporter,
) -> CollageResult<Vec<TileSpec>> {
    let mut specs = Vec::with_capacity(tokens.len());
    for (index, token) in tokens.iter().enumerate() {
        let spec = TileSpec::parse(token.as_ref())?;
        reporter.tile_added(index, &spec);
        specs.push(spec);
    }
    if specs.is_empty() {
        return Err(CollageError::usage("at least one tile spec is required"));
    }
    Ok(specs)
}

/// Composite `specs` into `opts.output` with ffmpeg decoding and encoding.
pub fn run_collage(
    specs: Vec<TileSpec>,
    opts: &CollageOpts,
    reporter: &mut dyn Reporter,
) -> CollageResult<CollageStats> {
    let mut sink = FfmpegSink::new(FfmpegSinkOpts {
        out_path: opts.output.clone(),
        overwrite: opts.overwrite,
    });
    run_with(specs, opts, &FfmpegProvider, &mut sink, reporter)
}

/// Composite `specs` using the given decode and encode collaborators.
///
/// Every source opened here is released before returning, on success and on every error path.
/// The sink is finalized only on success.
#[tracing::instrument(skip_all, fields(tiles = specs.len(), output = %opts.output.display()))]
pub fn run_with(
    specs: Vec<TileSpec>,
    opts: &CollageOpts,
    provider: &dyn SourceProvider,
    sink: &mut dyn FrameSink,
    reporter: &mut dyn Reporter,
) -> CollageResult<CollageStats> {
    if specs.is_empty() {
        return Err(CollageError::usage("at least one tile spec is required"));
    }

    let mut probed = probe_tiles(specs, provider, opts.compositor.source_policy)?;
    let layout = resolve_layout(&probed.tiles)?;
    tracing::info!(
        canvas = %layout.canvas,
        total_frames = layout.total_frames,
        "resolved layout"
    );
    reporter.layout_resolved(&layout);

    sink.begin(SinkConfig {
        size: layout.canvas,
        fps: opts.fps,
        codec: opts.codec,
    })?;

    let mut compositor = Compositor::new(layout, probed.tiles.len(), opts.compositor);
    let stats = compositor.run(&mut probed, sink, reporter)?;

    probed.release_all();
    sink.end()?;

    Ok(CollageStats {
        canvas: layout.canvas,
        total_frames: layout.total_frames,
        frames_written: stats.frames_written,
        tiles: probed.tiles.len(),
        tiles_painted: stats.tiles_painted,
        short_reads: stats.short_reads,
    })
}

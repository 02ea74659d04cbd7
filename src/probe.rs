//! Probe phase: open every tile's source in input order and record its frame count.

use crate::foundation::error::{CollageError, CollageResult};
use crate::media::source::{FrameSource, SourceProvider, UnavailableSource};
use crate::tile::descriptor::TileDescriptor;
use crate::tile::spec::TileSpec;

/// What to do with a source that cannot be opened or read.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SourcePolicy {
    /// Log a warning and treat the source as ended (zero frames if it never opened).
    #[default]
    Lenient,
    /// Fail the run.
    Strict,
}

/// Descriptors paired one-to-one (by index) with their open sources.
pub struct ProbedTiles {
    pub tiles: Vec<TileDescriptor>,
    pub sources: Vec<Box<dyn FrameSource>>,
}

impl ProbedTiles {
    /// Release every source. Idempotent.
    pub fn release_all(&mut self) {
        for source in &mut self.sources {
            source.release();
        }
    }
}

impl Drop for ProbedTiles {
    fn drop(&mut self) {
        self.release_all();
    }
}

/// Open each spec's source in order and build its [`TileDescriptor`].
///
/// On a strict-policy failure, sources opened so far are released when the partial set drops.
#[tracing::instrument(skip_all, fields(tiles = specs.len()))]
pub fn probe_tiles(
    specs: Vec<TileSpec>,
    provider: &dyn SourceProvider,
    policy: SourcePolicy,
) -> CollageResult<ProbedTiles> {
    let mut probed = ProbedTiles {
        tiles: Vec::with_capacity(specs.len()),
        sources: Vec::with_capacity(specs.len()),
    };

    for spec in specs {
        let source: Box<dyn FrameSource> = match provider.open(&spec.source_path) {
            Ok(source) => source,
            Err(e) => match policy {
                SourcePolicy::Strict => {
                    return Err(CollageError::source(format!(
                        "cannot open '{}': {e}",
                        spec.source_path.display()
                    )));
                }
                SourcePolicy::Lenient => {
                    tracing::warn!(
                        path = %spec.source_path.display(),
                        "cannot open source, tile will stay unpainted: {e}"
                    );
                    Box::new(UnavailableSource)
                }
            },
        };
        let frame_count = source.frame_count();
        tracing::debug!(tile = %spec, frame_count, "probed tile");
        probed.tiles.push(TileDescriptor::probed(spec, frame_count));
        probed.sources.push(source);
    }

    Ok(probed)
}

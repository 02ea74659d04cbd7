//! vidcollage composites several input videos into one output video.
//!
//! Each input is assigned a rectangle ("tile") of the output frame with a
//! `path@WIDTHxHEIGHT+X+Y` spec. The canvas is the smallest frame covering every tile, and the
//! output runs until the longest input ends:
//!
//! - Parse [`TileSpec`]s
//! - Probe each source into a [`TileDescriptor`] and resolve the [`Layout`]
//! - Run the [`Compositor`] frame loop into a [`FrameSink`]
#![forbid(unsafe_code)]

pub mod compositor;
pub mod encode;
mod foundation;
pub mod layout;
pub mod media;
pub mod probe;
pub mod report;
pub mod session;
pub mod tile;

pub use crate::foundation::core::{CanvasSize, Fourcc, Fps, FrameIndex, TileRect};
pub use crate::foundation::error::{CollageError, CollageResult};

pub use crate::compositor::{CompositeStats, Compositor, CompositorOpts};
pub use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts};
pub use crate::encode::sink::{FrameSink, InMemorySink, SinkConfig};
pub use crate::layout::{Layout, resolve_layout};
pub use crate::media::ffmpeg::{FfmpegProvider, is_ffmpeg_on_path};
pub use crate::media::memory::{MemoryClip, MemoryProvider, SourceLog};
pub use crate::media::source::{FrameSource, SourceProvider};
pub use crate::probe::{ProbedTiles, SourcePolicy, probe_tiles};
pub use crate::report::{ConsoleReporter, Reporter, SilentReporter};
pub use crate::session::{CollageOpts, CollageStats, collect_specs, run_collage, run_with};
pub use crate::tile::descriptor::TileDescriptor;
pub use crate::tile::spec::TileSpec;

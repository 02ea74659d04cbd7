use std::path::PathBuf;
use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use vidcollage::{
    CollageError, CollageOpts, CompositorOpts, ConsoleReporter, Fourcc, Fps, Reporter,
    SilentReporter, SourcePolicy,
};

#[derive(Parser, Debug)]
#[command(
    name = "vidcollage",
    version,
    about = "Composite several videos into one, each scaled into its own tile",
    override_usage = "vidcollage [-cfovh] tile_spec [tile_spec ...]",
    after_help = "tile_spec := video_filename@WxH+X+Y"
)]
struct Cli {
    /// Output video codec as a FOURCC identifier.
    #[arg(short, long, value_name = "FOURCC", default_value = "xvid")]
    codec: String,

    /// Output frames per second.
    #[arg(short, long, default_value_t = 30, allow_negative_numbers = true)]
    fps: i64,

    /// Output filename.
    #[arg(short, long, default_value = vidcollage::session::DEFAULT_OUTPUT)]
    output: PathBuf,

    /// Be verbose: echo tiles and print progress.
    #[arg(short, long)]
    verbose: bool,

    /// Fill the canvas with black before every frame instead of keeping stale pixels.
    #[arg(long)]
    clear_each_frame: bool,

    /// Fail when a source cannot be opened or read instead of leaving its tile unpainted.
    #[arg(long)]
    strict_sources: bool,

    /// Refuse to replace an existing output file.
    #[arg(long)]
    no_overwrite: bool,

    /// Tile specs, painted in order (later tiles cover earlier ones).
    #[arg(value_name = "TILE_SPEC")]
    tiles: Vec<String>,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return match err.kind() {
                ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
        }
    };

    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            if err.wants_usage() {
                eprintln!();
                eprintln!("{}", Cli::command().render_help());
            }
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<(), CollageError> {
    let mut reporter: Box<dyn Reporter> = if cli.verbose {
        Box::new(ConsoleReporter::new(std::io::stdout()))
    } else {
        Box::new(SilentReporter)
    };

    let specs = vidcollage::collect_specs(&cli.tiles, reporter.as_mut())?;
    let codec = Fourcc::parse(&cli.codec)?;
    let fps = Fps::new(cli.fps)?;

    let opts = CollageOpts {
        codec,
        fps,
        output: cli.output,
        overwrite: !cli.no_overwrite,
        compositor: CompositorOpts {
            clear_each_frame: cli.clear_each_frame,
            source_policy: if cli.strict_sources {
                SourcePolicy::Strict
            } else {
                SourcePolicy::Lenient
            },
            ..CompositorOpts::default()
        },
    };

    let stats = vidcollage::run_collage(specs, &opts, reporter.as_mut())?;
    tracing::info!(
        output = %opts.output.display(),
        canvas = %stats.canvas,
        frames = stats.frames_written,
        short_reads = stats.short_reads,
        "wrote composite"
    );
    Ok(())
}

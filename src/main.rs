use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::{ArgAction, Parser};
use tracing::error;

use v4l2capture::config::{
    DEFAULT_BUFFERS, DEFAULT_DEVICE, DEFAULT_FRAMES, DEFAULT_HEIGHT, DEFAULT_PREFIX,
    DEFAULT_WIDTH,
};
use v4l2capture::{session, Config, FieldOrder, FourCC};

#[derive(Parser)]
#[command(name = "v4l2capture")]
#[command(about = "Capture raw frames from a V4L2 device into files")]
#[command(version)]
struct Args {
    /// Capture device node
    #[arg(short, long, default_value = DEFAULT_DEVICE)]
    device: PathBuf,

    /// Requested frame width in pixels
    #[arg(long, default_value_t = DEFAULT_WIDTH)]
    width: u32,

    /// Requested frame height in pixels
    #[arg(long, default_value_t = DEFAULT_HEIGHT)]
    height: u32,

    /// Requested pixel format, e.g. YUYV or MJPG
    #[arg(short, long, default_value = "YUYV")]
    fourcc: FourCC,

    /// Requested field order (any, none, top, bottom, interlaced, ...)
    #[arg(long, default_value = "any")]
    field: FieldOrder,

    /// Number of buffers to request from the driver
    #[arg(short, long, default_value_t = DEFAULT_BUFFERS,
          value_parser = clap::value_parser!(u32).range(1..))]
    buffers: u32,

    /// Number of frames to capture
    #[arg(short = 'n', long, default_value_t = DEFAULT_FRAMES)]
    frames: u32,

    /// Directory to write the frames to
    #[arg(short, long = "output", default_value = ".")]
    output_dir: PathBuf,

    /// File name prefix of every frame
    #[arg(long, default_value = DEFAULT_PREFIX)]
    prefix: String,

    /// File extension (default: derived from the negotiated pixel format)
    #[arg(long)]
    extension: Option<String>,

    /// Give up if no frame arrives within this many milliseconds
    #[arg(long = "timeout-ms")]
    timeout_ms: Option<u64>,

    /// Increase log verbosity (-v: info, -vv: debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Config {
            device: args.device,
            width: args.width,
            height: args.height,
            fourcc: args.fourcc,
            field: args.field,
            buffers: args.buffers,
            frames: args.frames,
            output_dir: args.output_dir,
            prefix: args.prefix,
            extension: args.extension,
            timeout: args.timeout_ms.map(Duration::from_millis),
        }
    }
}

fn init_logging(verbose: u8) {
    let fallback = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };

    // Set RUST_LOG to override, e.g. RUST_LOG=v4l2capture=debug
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(fallback)),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .init();
}

fn run(args: Args) -> anyhow::Result<()> {
    let config = Config::from(args);
    let summary = session::run(&config).map_err(|err| {
        error!(stage = err.stage(), device = %config.device.display(), "capture failed");
        err
    })?;

    print!("{}", summary);
    Ok(())
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    if let Err(err) = run(args) {
        eprintln!("error: {:#}", err);
        process::exit(1);
    }
}

use std::path::PathBuf;
use std::time::Duration;

use crate::sink::FileSink;
use crate::{FieldOrder, Format, FourCC};

pub const DEFAULT_DEVICE: &str = "/dev/video0";
pub const DEFAULT_WIDTH: u32 = 640;
pub const DEFAULT_HEIGHT: u32 = 480;
pub const DEFAULT_FOURCC: FourCC = FourCC::YUYV;
/// Buffers in the mapped pool
pub const DEFAULT_BUFFERS: u32 = 4;
/// Iterations of the capture loop
pub const DEFAULT_FRAMES: u32 = 100;
pub const DEFAULT_PREFIX: &str = "frame";

/// Everything a capture session can be tuned with
///
/// # Example
///
/// ```
/// use v4l2capture::{Config, FourCC};
///
/// let config = Config {
///     fourcc: FourCC::MJPG,
///     frames: 30,
///     ..Config::default()
/// };
/// assert_eq!(config.format().fourcc, FourCC::MJPG);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Device node, e.g. /dev/video0
    pub device: PathBuf,
    pub width: u32,
    pub height: u32,
    pub fourcc: FourCC,
    pub field: FieldOrder,
    /// Number of buffers to request, the driver may grant a different count
    pub buffers: u32,
    /// Number of frames to capture
    pub frames: u32,
    /// Directory the frame files are written to
    pub output_dir: PathBuf,
    /// File name prefix, followed by the frame number
    pub prefix: String,
    /// File extension, derived from the negotiated pixel format if not set
    pub extension: Option<String>,
    /// Upper bound for waiting on a single frame, blocks forever if not set
    pub timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            device: PathBuf::from(DEFAULT_DEVICE),
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            fourcc: DEFAULT_FOURCC,
            field: FieldOrder::Any,
            buffers: DEFAULT_BUFFERS,
            frames: DEFAULT_FRAMES,
            output_dir: PathBuf::from("."),
            prefix: DEFAULT_PREFIX.to_string(),
            extension: None,
            timeout: None,
        }
    }
}

impl Config {
    /// The format to ask the driver for
    pub fn format(&self) -> Format {
        Format::new(self.width, self.height, self.fourcc).with_field_order(self.field)
    }

    /// Returns a sink writing frames as configured
    pub fn sink(&self) -> FileSink {
        FileSink::new(&self.output_dir, &self.prefix, self.extension.clone())
    }
}

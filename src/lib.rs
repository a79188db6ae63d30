//! Raw frame capture from video4linux2 devices.
//!
//! The crate drives a single memory-mapped capture session: open the device node, negotiate a
//! format, map a small pool of driver buffers, stream, and hand every completed frame to a
//! [`sink::Sink`] before giving the buffer back to the driver.
//!
//! ```no_run
//! use v4l2capture::{session, Config};
//!
//! let config = Config {
//!     frames: 10,
//!     ..Config::default()
//! };
//! let summary = session::run(&config)?;
//! println!("captured {} frames", summary.frames);
//! # Ok::<(), v4l2capture::Error>(())
//! ```

#[cfg(all(feature = "v4l-sys", feature = "v4l2-sys"))]
compile_error!("features `libv4l` and `v4l2` are mutually exclusive");

#[cfg(feature = "v4l-sys")]
pub use v4l_sys;

#[cfg(feature = "v4l2-sys")]
pub use v4l2_sys as v4l_sys;

pub mod v4l2;

pub mod buffer;
pub mod capability;
pub mod config;
pub mod device;
pub mod error;
pub mod format;
pub mod io;
pub mod memory;
pub mod session;
pub mod sink;
pub mod timestamp;

#[cfg(test)]
mod mock;

pub use capability::Capabilities;
pub use config::Config;
pub use device::{Device, Driver, Handle};
pub use error::{Error, Result};
pub use format::{FieldOrder, Format, FourCC};
pub use timestamp::Timestamp;

//! The capture sequence, from opening the device to closing it.

use std::fmt;

use tracing::{debug, info, warn};

use crate::io::Stream;
use crate::sink::Sink;
use crate::{Config, Device, Driver, Error, Format, Result};

/// Outcome of a successful capture session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    /// Format the driver actually delivered
    pub format: Format,
    /// Number of buffers the driver granted
    pub buffers: u32,
    /// Number of frames persisted
    pub frames: u32,
    /// Total payload written
    pub bytes: u64,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Active format:\n{}", self.format)?;
        writeln!(f, "buffers        : {}", self.buffers)?;
        writeln!(f, "frames         : {}", self.frames)?;
        writeln!(f, "bytes          : {}", self.bytes)?;
        Ok(())
    }
}

/// Runs a complete session against the configured device node, writing frames to files
pub fn run(config: &Config) -> Result<Summary> {
    let device = Device::with_path(&config.device).map_err(|source| Error::DeviceOpen {
        path: config.device.clone(),
        source,
    })?;
    info!(path = %device.path().display(), "opened device");

    let mut sink = config.sink();
    capture(device, config, &mut sink)
}

/// Captures `config.frames` frames from `driver` into `sink`
///
/// Takes ownership of the driver: whichever way this returns, streaming is stopped, every mapped
/// buffer is unmapped and the driver is dropped.
pub fn capture<D, S>(mut driver: D, config: &Config, sink: &mut S) -> Result<Summary>
where
    D: Driver,
    S: Sink + ?Sized,
{
    let caps = driver.query_caps().map_err(Error::Capabilities)?;
    debug!(
        driver = %caps.driver,
        card = %caps.card,
        capabilities = %caps.capabilities,
        "queried capabilities"
    );
    if let Some(capability) = caps.missing_for_capture() {
        return Err(Error::Unsupported { capability });
    }

    let format = negotiate(&mut driver, &config.format())?;
    sink.begin(&format);

    driver.set_timeout(config.timeout);
    if let Some(timeout) = config.timeout {
        debug!(timeout_ms = timeout.as_millis() as u64, "bounded frame wait");
    }

    let mut stream = Stream::with_buffers(driver, config.buffers)?;
    let buffers = stream.len() as u32;
    stream.queue_all()?;
    stream.start()?;

    let mut bytes = 0u64;
    for number in 0..config.frames {
        let frame = stream.dequeue()?;
        let index = frame.index();
        sink.persist(number, &frame)?;
        bytes += frame.len() as u64;

        stream.queue(index)?;
    }

    stream.stop()?;
    stream.release()?;

    info!(frames = config.frames, bytes, "capture finished");
    Ok(Summary {
        format,
        buffers,
        frames: config.frames,
        bytes,
    })
}

/// Applies `requested` and returns the format the driver settled on
///
/// Drivers adjust what they cannot deliver instead of failing. The adjusted format is accepted
/// and used for everything downstream.
pub fn negotiate<D: Driver + ?Sized>(driver: &mut D, requested: &Format) -> Result<Format> {
    let actual = driver
        .set_format(requested)
        .map_err(Error::FormatNegotiation)?;

    if !actual.satisfies(requested) {
        warn!(
            requested = %format_args!("{}x{} {}", requested.width, requested.height, requested.fourcc),
            actual = %format_args!("{}x{} {}", actual.width, actual.height, actual.fourcc),
            field = %actual.field_order,
            "driver adjusted the format"
        );
    }
    info!(
        width = actual.width,
        height = actual.height,
        fourcc = %actual.fourcc,
        size = actual.size,
        "negotiated format"
    );

    Ok(actual)
}

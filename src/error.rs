//! Failure taxonomy of a capture session.
//!
//! Every variant names the stage that failed and carries the underlying system error as its
//! source. None of them is recoverable: the session tears down whatever it acquired and the
//! error is handed to the caller.

use std::{io, path::PathBuf};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to open video device {}", .path.display())]
    DeviceOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to query device capabilities")]
    Capabilities(#[source] io::Error),

    #[error("device does not support {capability}")]
    Unsupported { capability: &'static str },

    #[error("failed to set video format")]
    FormatNegotiation(#[source] io::Error),

    #[error("failed to request video buffers")]
    BufferRequest(#[source] io::Error),

    #[error("failed to query video buffer {index}")]
    BufferQuery {
        index: u32,
        #[source]
        source: io::Error,
    },

    #[error("failed to map video buffer {index}")]
    BufferMap {
        index: u32,
        #[source]
        source: io::Error,
    },

    #[error("failed to enqueue video buffer {index}")]
    Enqueue {
        index: u32,
        #[source]
        source: io::Error,
    },

    #[error("failed to start video streaming")]
    StreamOn(#[source] io::Error),

    #[error("failed to dequeue video buffer")]
    Dequeue(#[source] io::Error),

    #[error("failed to write frame {frame} to {}", .path.display())]
    Persist {
        frame: u32,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to stop video streaming")]
    StreamOff(#[source] io::Error),
}

impl Error {
    /// Short name of the failing stage, used as a structured logging field
    pub fn stage(&self) -> &'static str {
        match self {
            Error::DeviceOpen { .. } => "open",
            Error::Capabilities(_) | Error::Unsupported { .. } => "capabilities",
            Error::FormatNegotiation(_) => "format",
            Error::BufferRequest(_) => "request",
            Error::BufferQuery { .. } => "query",
            Error::BufferMap { .. } => "map",
            Error::Enqueue { .. } => "enqueue",
            Error::StreamOn(_) => "stream-on",
            Error::Dequeue(_) => "dequeue",
            Error::Persist { .. } => "persist",
            Error::StreamOff(_) => "stream-off",
        }
    }

    /// The system error behind this failure, if any
    pub fn io_error(&self) -> Option<&io::Error> {
        match self {
            Error::DeviceOpen { source, .. }
            | Error::BufferQuery { source, .. }
            | Error::BufferMap { source, .. }
            | Error::Enqueue { source, .. }
            | Error::Persist { source, .. } => Some(source),
            Error::Capabilities(source)
            | Error::FormatNegotiation(source)
            | Error::BufferRequest(source)
            | Error::StreamOn(source)
            | Error::Dequeue(source)
            | Error::StreamOff(source) => Some(source),
            Error::Unsupported { .. } => None,
        }
    }
}

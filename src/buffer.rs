use bitflags::bitflags;
use std::{fmt, mem};

use crate::memory::Memory;
use crate::v4l_sys::*;
use crate::Timestamp;

/// Buffer type
///
/// Capture sessions only ever exchange single-planar video capture buffers, the other types are
/// listed so values reported by the driver can be displayed.
#[allow(clippy::unreadable_literal)]
#[rustfmt::skip]
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Type {
    VideoCapture        = 1,
    VideoOutput         = 2,
    VideoOverlay        = 3,
    VideoCaptureMplane  = 9,
    VideoOutputMplane   = 10,
}

bitflags! {
    /// Buffer flags as set by the driver
    #[allow(clippy::unreadable_literal)]
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
    pub struct Flags: u32 {
        /// Buffer is mapped
        const MAPPED                = 0x00000001;
        /// Buffer is queued for processing
        const QUEUED                = 0x00000002;
        /// Buffer is ready
        const DONE                  = 0x00000004;
        /// Image is a keyframe (I-frame)
        const KEYFRAME              = 0x00000008;
        /// Image is a P-frame
        const PFRAME                = 0x00000010;
        /// Image is a B-frame
        const BFRAME                = 0x00000020;
        /// Buffer is ready, but the data contained within is corrupted
        const ERROR                 = 0x00000040;
        /// Timecode field is valid
        const TIMECODE              = 0x00000100;
        /// Buffer is prepared for queuing
        const PREPARED              = 0x00000400;
        /// Timestamp type
        const TIMESTAMP_MONOTONIC   = 0x00002000;
        const TIMESTAMP_COPY        = 0x00004000;
        /// Timestamp taken at start of exposure rather than end of frame
        const TSTAMP_SRC_SOE        = 0x00010000;
        /// Last buffer produced by the hardware
        const LAST                  = 0x00100000;
    }
}

impl From<u32> for Flags {
    fn from(flags: u32) -> Self {
        Self::from_bits_truncate(flags)
    }
}

impl From<Flags> for u32 {
    fn from(flags: Flags) -> Self {
        flags.bits()
    }
}

impl fmt::Display for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Who may touch a mapped buffer right now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner {
    /// Dequeued (or never queued), readable by the application
    Application,
    /// Queued, the driver may fill it at any time
    Driver,
}

/// Kernel-side location of a buffer, as reported by VIDIOC_QUERYBUF
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Descriptor {
    /// Position in the pool
    pub index: u32,
    /// Offset cookie to pass to mmap
    pub offset: u32,
    /// Size of the buffer in bytes
    pub length: u32,
}

impl Descriptor {
    /// Returns a zeroed VIDIOC buffer argument for a capture buffer at `index`
    pub(crate) fn request(index: u32) -> v4l2_buffer {
        v4l2_buffer {
            index,
            type_: Type::VideoCapture as u32,
            memory: Memory::Mmap as u32,
            ..unsafe { mem::zeroed() }
        }
    }
}

impl From<v4l2_buffer> for Descriptor {
    fn from(buf: v4l2_buffer) -> Self {
        Descriptor {
            index: buf.index,
            offset: unsafe { buf.m.offset },
            length: buf.length,
        }
    }
}

/// Buffer metadata, filled in by the driver on every dequeue
#[derive(Debug, Default, Clone, Copy)]
pub struct Metadata {
    /// Position of the buffer in the pool
    pub index: u32,
    /// Number of bytes occupied by the data in the buffer
    pub bytesused: u32,
    /// Buffer flags
    pub flags: Flags,
    /// Field order of the image
    pub field: u32,
    /// Time of capture (usually set by the driver)
    pub timestamp: Timestamp,
    /// Sequence number, counting the frames
    pub sequence: u32,
}

impl From<v4l2_buffer> for Metadata {
    fn from(buf: v4l2_buffer) -> Self {
        Metadata {
            index: buf.index,
            bytesused: buf.bytesused,
            flags: buf.flags.into(),
            field: buf.field,
            timestamp: buf.timestamp.into(),
            sequence: buf.sequence,
        }
    }
}

/// A completed frame, borrowed from the mapped buffer that holds it
///
/// `data` covers exactly the `bytesused` bytes the driver reported, not the whole buffer. The
/// frame must be consumed before its buffer is queued again.
pub struct Frame<'a> {
    pub data: &'a [u8],
    pub meta: Metadata,
}

impl Frame<'_> {
    /// Index of the buffer this frame lives in
    pub fn index(&self) -> u32 {
        self.meta.index
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

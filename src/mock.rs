//! In-memory driver for exercising capture sequencing without a device node.
//!
//! [`MockDriver`] hands out heap regions instead of kernel buffers and records every call in a
//! shared [`Journal`], which stays readable after the driver itself was dropped. Calls the
//! kernel would reject, or that leak resources, are noted as violations.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;
use std::{io, ptr};

use crate::buffer::{self, Descriptor, Frame, Metadata};
use crate::capability::{Capabilities, Flags};
use crate::memory::Mapping;
use crate::sink::Sink;
use crate::{Driver, Error, Format, FourCC, Result, Timestamp};

/// A call that should fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    Caps,
    SetFormat,
    Request,
    /// Querying the buffer with this index
    Query(u32),
    /// Mapping the buffer with this index
    Map(u32),
    /// The n-th queue call, counting from zero
    Queue(usize),
    StreamOn,
    /// The n-th dequeue call, counting from zero
    Dequeue(usize),
    /// No buffer completes for the n-th dequeue call, counting from zero
    Stall(usize),
    /// Every stream-off call
    StreamOff,
}

#[derive(Debug, Default)]
pub struct Journal {
    /// Every requested buffer count, including the final zero
    pub requested: Vec<u32>,
    pub queried: Vec<u32>,
    /// Indices of successful mappings
    pub mapped: Vec<u32>,
    pub unmapped: Vec<u32>,
    /// Indices of successful queue calls
    pub queued: Vec<u32>,
    /// Indices of successful dequeue calls
    pub dequeued: Vec<u32>,
    /// Payload size of every successful dequeue
    pub bytesused: Vec<u32>,
    /// Call attempts, successful or not
    pub stream_on: usize,
    pub stream_off: usize,
    pub closed: usize,
    /// Last format an application asked for
    pub format: Option<Format>,
    /// Dequeue timeout in effect
    pub timeout: Option<Duration>,
    /// Names of the driver calls in order
    pub calls: Vec<&'static str>,
    pub violations: Vec<String>,
}

pub type SharedJournal = Rc<RefCell<Journal>>;

pub struct Builder {
    grant: Option<u32>,
    length: u32,
    caps: Flags,
    adjust: Option<Format>,
    faults: Vec<Fault>,
}

impl Builder {
    /// Grant this many buffers no matter how many are requested
    pub fn grant(mut self, count: u32) -> Self {
        self.grant = Some(count);
        self
    }

    /// Size of every buffer in bytes
    pub fn length(mut self, length: u32) -> Self {
        self.length = length;
        self
    }

    pub fn caps(mut self, caps: Flags) -> Self {
        self.caps = caps;
        self
    }

    /// Answer every format request with `format`
    pub fn adjust(mut self, format: Format) -> Self {
        self.adjust = Some(format);
        self
    }

    pub fn fault(mut self, fault: Fault) -> Self {
        self.faults.push(fault);
        self
    }

    pub fn build(self) -> (MockDriver, SharedJournal) {
        let journal = SharedJournal::default();
        let format = Format {
            stride: 640 * 2,
            size: 640 * 480 * 2,
            ..Format::new(640, 480, FourCC::YUYV)
        };

        let driver = MockDriver {
            journal: Rc::clone(&journal),
            grant: self.grant,
            length: self.length,
            caps: self.caps,
            adjust: self.adjust,
            faults: self.faults,
            format,
            regions: Vec::new(),
            pending: VecDeque::new(),
            streaming: false,
            queue_calls: 0,
            dequeue_calls: 0,
            sequence: 0,
        };
        (driver, journal)
    }
}

struct Region {
    ptr: *mut u8,
    len: usize,
    mapped: bool,
    queued: bool,
}

impl Region {
    fn alloc(len: usize) -> Self {
        let ptr = Box::into_raw(vec![0u8; len].into_boxed_slice()) as *mut u8;
        Region {
            ptr,
            len,
            mapped: false,
            queued: false,
        }
    }
}

impl Drop for Region {
    fn drop(&mut self) {
        unsafe { drop(Box::from_raw(ptr::slice_from_raw_parts_mut(self.ptr, self.len))) }
    }
}

pub struct MockDriver {
    journal: SharedJournal,
    grant: Option<u32>,
    length: u32,
    caps: Flags,
    adjust: Option<Format>,
    faults: Vec<Fault>,
    format: Format,
    regions: Vec<Region>,
    pending: VecDeque<u32>,
    streaming: bool,
    queue_calls: usize,
    dequeue_calls: usize,
    sequence: u32,
}

fn errno(code: i32) -> io::Error {
    io::Error::from_raw_os_error(code)
}

impl MockDriver {
    pub fn builder() -> Builder {
        Builder {
            grant: None,
            length: 1024,
            caps: Flags::VIDEO_CAPTURE | Flags::STREAMING,
            adjust: None,
            faults: Vec::new(),
        }
    }

    fn faulty(&self, fault: Fault) -> bool {
        self.faults.contains(&fault)
    }

    fn call(&self, name: &'static str) {
        self.journal.borrow_mut().calls.push(name);
    }

    fn violation(&self, what: String) -> io::Error {
        self.journal.borrow_mut().violations.push(what);
        errno(libc::EINVAL)
    }
}

impl Driver for MockDriver {
    fn query_caps(&self) -> io::Result<Capabilities> {
        self.call("querycap");
        if self.faulty(Fault::Caps) {
            return Err(errno(libc::ENOTTY));
        }

        Ok(Capabilities {
            driver: "mock".to_string(),
            card: "Mock camera".to_string(),
            bus: "platform:mock".to_string(),
            version: (1, 0, 0),
            capabilities: self.caps,
        })
    }

    fn format(&self) -> io::Result<Format> {
        self.call("g_fmt");
        Ok(self.format)
    }

    fn set_format(&mut self, fmt: &Format) -> io::Result<Format> {
        self.call("s_fmt");
        if self.faulty(Fault::SetFormat) {
            return Err(errno(libc::EINVAL));
        }
        if !self.regions.is_empty() {
            return Err(self.violation("format changed with buffers allocated".to_string()));
        }

        self.journal.borrow_mut().format = Some(*fmt);
        self.format = self.adjust.unwrap_or(Format {
            stride: fmt.width * 2,
            size: fmt.width * fmt.height * 2,
            ..*fmt
        });
        Ok(self.format)
    }

    fn request_buffers(&mut self, count: u32) -> io::Result<u32> {
        self.call("reqbufs");
        self.journal.borrow_mut().requested.push(count);
        if self.faulty(Fault::Request) {
            return Err(errno(libc::ENOMEM));
        }
        if self.streaming {
            return Err(self.violation("buffers requested while streaming".to_string()));
        }
        if let Some(index) = self.regions.iter().position(|r| r.mapped) {
            return Err(self.violation(format!("buffers requested while {} is mapped", index)));
        }

        self.regions.clear();
        if count == 0 {
            return Ok(0);
        }

        let granted = self.grant.unwrap_or(count);
        self.regions = (0..granted)
            .map(|_| Region::alloc(self.length as usize))
            .collect();
        Ok(granted)
    }

    fn query_buffer(&self, index: u32) -> io::Result<Descriptor> {
        self.call("querybuf");
        self.journal.borrow_mut().queried.push(index);
        if self.faulty(Fault::Query(index)) {
            return Err(errno(libc::EINVAL));
        }
        if index as usize >= self.regions.len() {
            return Err(self.violation(format!("query of unknown buffer {}", index)));
        }

        Ok(Descriptor {
            index,
            offset: index * 4096,
            length: self.length,
        })
    }

    fn map(&mut self, desc: &Descriptor) -> io::Result<Mapping> {
        self.call("mmap");
        if self.faulty(Fault::Map(desc.index)) {
            return Err(errno(libc::ENOMEM));
        }

        let index = desc.index as usize;
        if self.regions.get(index).map_or(true, |r| r.mapped) {
            return Err(self.violation(format!("bad mapping of buffer {}", desc.index)));
        }
        let region = &mut self.regions[index];
        region.mapped = true;
        let mapping = unsafe { Mapping::from_raw_parts(region.ptr.cast(), region.len) };

        self.journal.borrow_mut().mapped.push(desc.index);
        mapping.ok_or_else(|| errno(libc::EFAULT))
    }

    fn unmap(&mut self, mapping: Mapping) -> io::Result<()> {
        self.call("munmap");
        let ptr = mapping.as_ptr() as *mut u8;
        let index = match self.regions.iter().position(|r| r.ptr == ptr && r.mapped) {
            Some(index) => index,
            None => return Err(self.violation("unmap of unknown region".to_string())),
        };

        self.regions[index].mapped = false;
        self.journal.borrow_mut().unmapped.push(index as u32);
        Ok(())
    }

    fn queue(&mut self, index: u32) -> io::Result<()> {
        self.call("qbuf");
        let nth = self.queue_calls;
        self.queue_calls += 1;
        if self.faulty(Fault::Queue(nth)) {
            return Err(errno(libc::EINVAL));
        }

        let usable = self
            .regions
            .get(index as usize)
            .map_or(false, |r| r.mapped && !r.queued);
        if !usable {
            return Err(self.violation(format!("bad queue of buffer {}", index)));
        }
        self.regions[index as usize].queued = true;
        self.pending.push_back(index);

        self.journal.borrow_mut().queued.push(index);
        Ok(())
    }

    fn set_timeout(&mut self, timeout: Option<Duration>) {
        self.journal.borrow_mut().timeout = timeout;
    }

    fn dequeue(&mut self) -> io::Result<Metadata> {
        self.call("dqbuf");
        let nth = self.dequeue_calls;
        self.dequeue_calls += 1;
        if self.faulty(Fault::Dequeue(nth)) {
            return Err(errno(libc::EIO));
        }
        if self.faulty(Fault::Stall(nth)) {
            if self.journal.borrow().timeout.is_none() {
                return Err(self.violation("dequeue would block forever".to_string()));
            }
            return Err(io::Error::new(io::ErrorKind::TimedOut, "VIDIOC_DQBUF"));
        }
        if !self.streaming {
            return Err(self.violation("dequeue while stopped".to_string()));
        }
        let index = match self.pending.pop_front() {
            Some(index) => index,
            None => return Err(self.violation("dequeue with no buffer queued".to_string())),
        };

        let region = &mut self.regions[index as usize];
        region.queued = false;
        let bytesused = (region.len / 2 + index as usize).min(region.len);
        let sequence = self.sequence;
        for i in 0..bytesused {
            unsafe { *region.ptr.add(i) = pattern(sequence, i) };
        }
        self.sequence += 1;

        let mut journal = self.journal.borrow_mut();
        journal.dequeued.push(index);
        journal.bytesused.push(bytesused as u32);

        Ok(Metadata {
            index,
            bytesused: bytesused as u32,
            flags: buffer::Flags::MAPPED | buffer::Flags::DONE,
            field: 1,
            timestamp: Timestamp::new(sequence as libc::time_t, 0),
            sequence,
        })
    }

    fn stream_on(&mut self) -> io::Result<()> {
        self.call("streamon");
        self.journal.borrow_mut().stream_on += 1;
        if self.faulty(Fault::StreamOn) {
            return Err(errno(libc::EIO));
        }
        if self.streaming {
            return Err(self.violation("stream started twice".to_string()));
        }

        self.streaming = true;
        Ok(())
    }

    fn stream_off(&mut self) -> io::Result<()> {
        self.call("streamoff");
        self.journal.borrow_mut().stream_off += 1;
        if self.faulty(Fault::StreamOff) {
            return Err(errno(libc::EIO));
        }

        self.streaming = false;
        self.pending.clear();
        for region in &mut self.regions {
            region.queued = false;
        }
        Ok(())
    }
}

impl Drop for MockDriver {
    fn drop(&mut self) {
        let mut journal = self.journal.borrow_mut();
        journal.calls.push("close");
        journal.closed += 1;
        if self.streaming {
            journal.violations.push("closed while streaming".to_string());
        }
        for (index, region) in self.regions.iter().enumerate() {
            if region.mapped {
                journal
                    .violations
                    .push(format!("closed with buffer {} mapped", index));
            }
        }
    }
}

/// Byte `i` of the payload produced for frame `sequence`
pub fn pattern(sequence: u32, i: usize) -> u8 {
    (sequence as u8).wrapping_add(i as u8)
}

/// Sink keeping persisted frames in memory
#[derive(Debug, Default)]
pub struct RecordingSink {
    /// Format announced before the first frame
    pub format: Option<Format>,
    /// Frame number, buffer index and payload of every persisted frame
    pub frames: Vec<(u32, u32, Vec<u8>)>,
    /// Frame number to fail on
    pub fail_at: Option<u32>,
}

impl Sink for RecordingSink {
    fn begin(&mut self, format: &Format) {
        self.format = Some(*format);
    }

    fn persist(&mut self, number: u32, frame: &Frame<'_>) -> Result<()> {
        if self.fail_at == Some(number) {
            return Err(Error::Persist {
                frame: number,
                path: format!("memory/{}", number).into(),
                source: errno(libc::ENOSPC),
            });
        }

        self.frames.push((number, frame.index(), frame.data.to_vec()));
        Ok(())
    }
}

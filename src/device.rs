use std::convert::TryInto;
use std::path::{Path, PathBuf};
use std::{io, mem, ptr, time::Duration};

use tracing::warn;

use crate::buffer::{Descriptor, Metadata, Type};
use crate::memory::{Mapping, Memory};
use crate::v4l2;
use crate::v4l_sys::*;
use crate::{Capabilities, Format};

/// The driver half of a capture session
///
/// [`Device`] implements this on top of a real device node. Everything above this trait (buffer
/// pool, stream state, the capture loop) is written against it, so the sequencing rules can be
/// exercised without hardware.
///
/// Implementations own the device handle: dropping the driver closes it.
pub trait Driver {
    /// VIDIOC_QUERYCAP
    fn query_caps(&self) -> io::Result<Capabilities>;

    /// Returns the format currently in use (VIDIOC_G_FMT)
    fn format(&self) -> io::Result<Format>;

    /// Modifies the capture format and returns the actual format
    ///
    /// The driver tries to match the format parameters on a best effort basis.
    /// Thus, if the combination of format properties cannot be achieved, the closest possible
    /// settings are used and reported back.
    fn set_format(&mut self, fmt: &Format) -> io::Result<Format>;

    /// Asks for `count` memory-mapped capture buffers and returns how many the driver granted
    ///
    /// A count of zero frees all buffers.
    fn request_buffers(&mut self, count: u32) -> io::Result<u32>;

    /// Looks up length and mmap offset of the buffer at `index` (VIDIOC_QUERYBUF)
    fn query_buffer(&self, index: u32) -> io::Result<Descriptor>;

    /// Maps a buffer into the process, read/write and shared with the driver
    fn map(&mut self, desc: &Descriptor) -> io::Result<Mapping>;

    /// Releases a region returned by [`Driver::map`]
    fn unmap(&mut self, mapping: Mapping) -> io::Result<()>;

    /// Inserts a buffer into the drivers' incoming queue (VIDIOC_QBUF)
    fn queue(&mut self, index: u32) -> io::Result<()>;

    /// Bounds how long [`Driver::dequeue`] may wait for a filled buffer
    ///
    /// `None` blocks until the driver delivers. Expiry is reported as
    /// [`io::ErrorKind::TimedOut`].
    fn set_timeout(&mut self, timeout: Option<Duration>);

    /// Removes a buffer from the drivers' outgoing queue, blocking until one is filled
    fn dequeue(&mut self) -> io::Result<Metadata>;

    /// VIDIOC_STREAMON
    fn stream_on(&mut self) -> io::Result<()>;

    /// VIDIOC_STREAMOFF, returns all buffers to the application
    fn stream_off(&mut self) -> io::Result<()>;
}

/// Owned file descriptor of an opened device node
///
/// The descriptor is closed exactly once, when the handle is dropped.
#[derive(Debug)]
pub struct Handle {
    fd: std::os::raw::c_int,
}

impl Handle {
    /// Opens a device node in read/write mode
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let fd = v4l2::open(path, libc::O_RDWR)?;
        Ok(Handle { fd })
    }

    /// Returns the raw fd of the device
    pub fn fd(&self) -> std::os::raw::c_int {
        self.fd
    }

    /// Polls the device for `events`
    ///
    /// Returns the number of ready descriptors, so zero means the timeout expired.
    /// A negative timeout blocks indefinitely.
    pub fn poll(&self, events: i16, timeout: i32) -> io::Result<i32> {
        let mut pfd = libc::pollfd {
            fd: self.fd,
            events,
            revents: 0,
        };

        let ret = unsafe { libc::poll(&mut pfd, 1, timeout) };
        if ret == -1 {
            Err(io::Error::last_os_error())
        } else {
            Ok(ret)
        }
    }
}

impl Drop for Handle {
    fn drop(&mut self) {
        if let Err(e) = v4l2::close(self.fd) {
            warn!(fd = self.fd, error = %e, "failed to close device");
        }
    }
}

/// Linux capture device abstraction
#[derive(Debug)]
pub struct Device {
    handle: Handle,
    path: PathBuf,
    timeout: Option<i32>,
}

impl Device {
    /// Returns a capture device by path
    ///
    /// Linux device nodes are usually found in /dev/videoX.
    ///
    /// # Arguments
    ///
    /// * `path` - Path (e.g. "/dev/video0")
    ///
    /// # Example
    ///
    /// ```
    /// use v4l2capture::Device;
    /// let dev = Device::with_path("/dev/video0");
    /// ```
    pub fn with_path<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref();
        let handle = Handle::open(path)?;

        Ok(Device {
            handle,
            path: path.to_path_buf(),
            timeout: None,
        })
    }

    /// Returns the path the device was opened from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the raw device handle
    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    fn stream_ioctl(&self, request: v4l2::vidioc::_IOC_TYPE) -> io::Result<()> {
        unsafe {
            let mut typ = Type::VideoCapture as u32;
            v4l2::ioctl(
                self.handle.fd(),
                request,
                &mut typ as *mut _ as *mut std::os::raw::c_void,
            )
        }
    }
}

impl Driver for Device {
    fn query_caps(&self) -> io::Result<Capabilities> {
        unsafe {
            let mut v4l2_caps: v4l2_capability = mem::zeroed();
            v4l2::ioctl(
                self.handle.fd(),
                v4l2::vidioc::VIDIOC_QUERYCAP,
                &mut v4l2_caps as *mut _ as *mut std::os::raw::c_void,
            )?;

            Ok(Capabilities::from(v4l2_caps))
        }
    }

    fn format(&self) -> io::Result<Format> {
        unsafe {
            let mut v4l2_fmt = v4l2_format {
                type_: Type::VideoCapture as u32,
                ..mem::zeroed()
            };
            v4l2::ioctl(
                self.handle.fd(),
                v4l2::vidioc::VIDIOC_G_FMT,
                &mut v4l2_fmt as *mut _ as *mut std::os::raw::c_void,
            )?;

            Ok(Format::from(v4l2_fmt.fmt.pix))
        }
    }

    fn set_format(&mut self, fmt: &Format) -> io::Result<Format> {
        unsafe {
            let mut v4l2_fmt = v4l2_format {
                type_: Type::VideoCapture as u32,
                ..mem::zeroed()
            };
            v4l2_fmt.fmt.pix = (*fmt).into();
            v4l2::ioctl(
                self.handle.fd(),
                v4l2::vidioc::VIDIOC_S_FMT,
                &mut v4l2_fmt as *mut _ as *mut std::os::raw::c_void,
            )?;
        }

        // S_FMT already writes back the adjusted values, but some drivers only update part of
        // the struct. G_FMT is the authoritative answer.
        self.format()
    }

    fn request_buffers(&mut self, count: u32) -> io::Result<u32> {
        let mut v4l2_reqbufs = v4l2_requestbuffers {
            count,
            type_: Type::VideoCapture as u32,
            memory: Memory::Mmap as u32,
            ..unsafe { mem::zeroed() }
        };
        unsafe {
            v4l2::ioctl(
                self.handle.fd(),
                v4l2::vidioc::VIDIOC_REQBUFS,
                &mut v4l2_reqbufs as *mut _ as *mut std::os::raw::c_void,
            )?;
        }

        Ok(v4l2_reqbufs.count)
    }

    fn query_buffer(&self, index: u32) -> io::Result<Descriptor> {
        let mut v4l2_buf = Descriptor::request(index);
        unsafe {
            v4l2::ioctl(
                self.handle.fd(),
                v4l2::vidioc::VIDIOC_QUERYBUF,
                &mut v4l2_buf as *mut _ as *mut std::os::raw::c_void,
            )?;
        }

        Ok(Descriptor::from(v4l2_buf))
    }

    fn map(&mut self, desc: &Descriptor) -> io::Result<Mapping> {
        unsafe {
            let ptr = v4l2::mmap(
                ptr::null_mut(),
                desc.length as usize,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                self.handle.fd(),
                desc.offset as libc::off_t,
            )?;

            Mapping::from_raw_parts(ptr, desc.length as usize)
                .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "mmap returned NULL"))
        }
    }

    fn unmap(&mut self, mapping: Mapping) -> io::Result<()> {
        unsafe { v4l2::munmap(mapping.as_ptr(), mapping.len()) }
    }

    fn queue(&mut self, index: u32) -> io::Result<()> {
        let mut v4l2_buf = Descriptor::request(index);
        unsafe {
            v4l2::ioctl(
                self.handle.fd(),
                v4l2::vidioc::VIDIOC_QBUF,
                &mut v4l2_buf as *mut _ as *mut std::os::raw::c_void,
            )
        }
    }

    fn set_timeout(&mut self, timeout: Option<Duration>) {
        self.timeout = timeout.map(|d| d.as_millis().try_into().unwrap_or(i32::MAX));
    }

    fn dequeue(&mut self) -> io::Result<Metadata> {
        if let Some(timeout) = self.timeout {
            if self.handle.poll(libc::POLLIN, timeout)? == 0 {
                // This condition can only happen if there was a timeout.
                return Err(io::Error::new(io::ErrorKind::TimedOut, "VIDIOC_DQBUF"));
            }
        }

        let mut v4l2_buf = Descriptor::request(0);
        unsafe {
            v4l2::ioctl(
                self.handle.fd(),
                v4l2::vidioc::VIDIOC_DQBUF,
                &mut v4l2_buf as *mut _ as *mut std::os::raw::c_void,
            )?;
        }

        Ok(Metadata::from(v4l2_buf))
    }

    fn stream_on(&mut self) -> io::Result<()> {
        self.stream_ioctl(v4l2::vidioc::VIDIOC_STREAMON)
    }

    fn stream_off(&mut self) -> io::Result<()> {
        self.stream_ioctl(v4l2::vidioc::VIDIOC_STREAMOFF)
    }
}

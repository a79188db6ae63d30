use std::{fmt, ptr::NonNull, slice};

/// Memory used for buffer exchange
#[allow(clippy::unreadable_literal)]
#[rustfmt::skip]
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Memory {
    Mmap        = 1,
    UserPtr     = 2,
    Overlay     = 3,
    DmaBuf      = 4,
}

impl fmt::Display for Memory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Memory::Mmap => write!(f, "memory-mapped"),
            Memory::UserPtr => write!(f, "user pointer"),
            Memory::Overlay => write!(f, "overlay"),
            Memory::DmaBuf => write!(f, "DMA buffered"),
        }
    }
}

/// Memory-mapped region
///
/// The backing memory belongs to the driver and is shared with the process, so writes by the
/// hardware show up here and vice versa. A mapping is neither `Clone` nor `Copy`: the only way to
/// release it is to hand it back to [`crate::Driver::unmap`], which consumes it.
#[derive(Debug)]
pub struct Mapping {
    ptr: NonNull<u8>,
    len: usize,
}

impl Mapping {
    /// Wraps a region returned by mmap
    ///
    /// Returns `None` for a null pointer.
    ///
    /// # Safety
    ///
    /// `ptr` must be valid for reads of `len` bytes until the mapping is unmapped.
    pub unsafe fn from_raw_parts(ptr: *mut std::os::raw::c_void, len: usize) -> Option<Self> {
        NonNull::new(ptr as *mut u8).map(|ptr| Mapping { ptr, len })
    }

    /// Start address, as needed by munmap
    pub fn as_ptr(&self) -> *mut std::os::raw::c_void {
        self.ptr.as_ptr() as *mut std::os::raw::c_void
    }

    /// Size of the mapped region in bytes
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Read-only view of the whole region
    ///
    /// Only meaningful while the application owns the buffer.
    pub fn as_slice(&self) -> &[u8] {
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }
}

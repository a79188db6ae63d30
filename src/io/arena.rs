use std::io;

use tracing::{debug, warn};

use crate::buffer::{Frame, Metadata, Owner};
use crate::memory::Mapping;
use crate::{Driver, Error, Result};

struct Slot {
    mapping: Mapping,
    owner: Owner,
    /// Metadata of the last dequeue, `None` until the driver filled the buffer
    filled: Option<Metadata>,
}

/// Manage mapped buffers
///
/// The arena only ever contains buffers that were successfully mapped, in index order. The
/// kernel-confirmed count from VIDIOC_REQBUFS decides how many slots there are, not the count
/// that was asked for.
///
/// Releasing needs the driver, so the arena does not clean up after itself; [`crate::io::Stream`]
/// does that.
#[derive(Default)]
pub struct Arena {
    slots: Vec<Slot>,
    requested: bool,
}

impl Arena {
    /// Returns an empty arena
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of mapped buffers
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Whether the driver holds buffers for this arena, mapped or not
    pub fn is_allocated(&self) -> bool {
        self.requested
    }

    /// Allocate and map buffers
    ///
    /// Returns the number of buffers as reported by the driver.
    /// If querying or mapping buffer `k` fails, buffers `0..k` stay in the arena so they are
    /// unmapped by [`Arena::release`]; nothing is attempted for `k` and beyond.
    ///
    /// # Arguments
    ///
    /// * `driver` - Driver to request the buffers from
    /// * `count` - Desired number of buffers
    pub fn allocate<D: Driver>(&mut self, driver: &mut D, count: u32) -> Result<u32> {
        if self.requested {
            return Err(Error::BufferRequest(io::Error::from_raw_os_error(
                libc::EBUSY,
            )));
        }

        let granted = driver.request_buffers(count).map_err(Error::BufferRequest)?;
        self.requested = true;

        if granted == 0 {
            return Err(Error::BufferRequest(io::Error::from_raw_os_error(
                libc::ENOMEM,
            )));
        }
        if granted != count {
            warn!(requested = count, granted, "driver adjusted the buffer count");
        }

        for index in 0..granted {
            let desc = driver
                .query_buffer(index)
                .map_err(|source| Error::BufferQuery { index, source })?;
            let mapping = driver
                .map(&desc)
                .map_err(|source| Error::BufferMap { index, source })?;

            debug!(index, offset = desc.offset, length = desc.length, "mapped buffer");
            self.slots.push(Slot {
                mapping,
                owner: Owner::Application,
                filled: None,
            });
        }

        Ok(granted)
    }

    /// Returns who currently owns the buffer at `index`, `None` if there is no such buffer
    pub fn owner(&self, index: u32) -> Option<Owner> {
        self.slots.get(index as usize).map(|slot| slot.owner)
    }

    /// Access the mapping of a single buffer
    pub fn get(&self, index: u32) -> Option<&Mapping> {
        self.slots.get(index as usize).map(|slot| &slot.mapping)
    }

    /// Marks a buffer as handed to the driver, its previous contents become stale
    pub(crate) fn lend(&mut self, index: u32) {
        if let Some(slot) = self.slots.get_mut(index as usize) {
            slot.owner = Owner::Driver;
            slot.filled = None;
        }
    }

    /// Takes a buffer back from the driver after a dequeue
    pub(crate) fn fill(&mut self, meta: Metadata) -> io::Result<()> {
        let slot = self.slots.get_mut(meta.index as usize).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("driver returned unknown buffer {}", meta.index),
            )
        })?;

        if slot.owner != Owner::Driver {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("driver returned buffer {} which was never queued", meta.index),
            ));
        }
        if meta.bytesused as usize > slot.mapping.len() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "driver reports {} bytes in buffer {} of {} bytes",
                    meta.bytesused,
                    meta.index,
                    slot.mapping.len()
                ),
            ));
        }

        slot.owner = Owner::Application;
        slot.filled = Some(meta);
        Ok(())
    }

    /// All buffers belong to the application again, e.g. after streaming stopped
    pub(crate) fn reclaim(&mut self) {
        for slot in &mut self.slots {
            slot.owner = Owner::Application;
            slot.filled = None;
        }
    }

    /// Returns the frame held by a dequeued buffer
    ///
    /// `None` unless the driver filled the buffer and it has not been queued again since.
    pub fn frame(&self, index: u32) -> Option<Frame<'_>> {
        let slot = self.slots.get(index as usize)?;
        let meta = slot.filled?;

        Some(Frame {
            data: &slot.mapping.as_slice()[..meta.bytesused as usize],
            meta,
        })
    }

    /// Release any allocated buffers
    ///
    /// Every mapping is unmapped exactly once, then the kernel buffers are freed by requesting
    /// zero buffers. Failures are logged, not returned: there is nothing left to retry with.
    /// Returns the number of unmapped regions.
    pub fn release<D: Driver>(&mut self, driver: &mut D) -> usize {
        let mut unmapped = 0;
        for (index, slot) in self.slots.drain(..).enumerate() {
            match driver.unmap(slot.mapping) {
                Ok(()) => unmapped += 1,
                Err(e) => warn!(index, error = %e, "failed to unmap buffer"),
            }
        }

        if self.requested {
            self.requested = false;
            // free all buffers by requesting 0
            if let Err(e) = driver.request_buffers(0) {
                warn!(error = %e, "failed to free driver buffers");
            }
        }

        unmapped
    }
}

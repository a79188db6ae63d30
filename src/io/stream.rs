use std::io;

use tracing::{debug, info, warn};

use crate::buffer::{Frame, Owner};
use crate::io::Arena;
use crate::{Driver, Error, Result};

/// Whether the driver is filling buffers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Stopped,
    Streaming,
}

/// Stream of mapped buffers
///
/// The stream owns the driver and the buffer arena. Whatever happens, dropping it stops
/// streaming, unmaps every buffer that was mapped and then drops the driver, which closes the
/// device. [`Stream::release`] does the same but lets the caller observe failures.
pub struct Stream<D: Driver> {
    driver: D,
    arena: Arena,
    state: State,
}

impl<D: Driver> Stream<D> {
    /// Returns a stream without any buffers
    ///
    /// # Arguments
    ///
    /// * `driver` - Driver of an opened capture device
    pub fn new(driver: D) -> Self {
        Stream {
            driver,
            arena: Arena::new(),
            state: State::Stopped,
        }
    }

    /// Returns a stream with `count` buffers requested and mapped
    ///
    /// The driver may grant fewer (or more) buffers than asked for, see [`Stream::len`].
    /// On failure, whatever was mapped is released and the driver is dropped.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use v4l2capture::{io::Stream, Device};
    ///
    /// let dev = Device::with_path("/dev/video0")?;
    /// let mut stream = Stream::with_buffers(dev, 4)?;
    /// stream.queue_all()?;
    /// stream.start()?;
    /// let frame = stream.dequeue()?;
    /// println!("buffer {} holds {} bytes", frame.index(), frame.len());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn with_buffers(driver: D, count: u32) -> Result<Self> {
        let mut stream = Stream::new(driver);
        stream.allocate(count)?;
        Ok(stream)
    }

    /// Requests and maps buffers, returns the confirmed count
    pub fn allocate(&mut self, count: u32) -> Result<u32> {
        self.arena.allocate(&mut self.driver, count)
    }

    /// Returns the driver
    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Whether the stream is currently active
    pub fn is_active(&self) -> bool {
        self.state == State::Streaming
    }

    /// Number of mapped buffers
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Insert a buffer into the drivers' incoming queue
    ///
    /// Only buffers that are mapped and currently owned by the application can be queued.
    pub fn queue(&mut self, index: u32) -> Result<()> {
        match self.arena.owner(index) {
            None => Err(Error::Enqueue {
                index,
                source: io::Error::new(io::ErrorKind::InvalidInput, "buffer is not mapped"),
            }),
            Some(Owner::Driver) => Err(Error::Enqueue {
                index,
                source: io::Error::new(io::ErrorKind::InvalidInput, "buffer is already queued"),
            }),
            Some(Owner::Application) => {
                self.driver
                    .queue(index)
                    .map_err(|source| Error::Enqueue { index, source })?;
                self.arena.lend(index);
                Ok(())
            }
        }
    }

    /// Enqueue every buffer the application owns, usually once before streaming starts
    pub fn queue_all(&mut self) -> Result<()> {
        for index in 0..self.arena.len() as u32 {
            if self.arena.owner(index) == Some(Owner::Application) {
                self.queue(index)?;
            }
        }

        debug!(buffers = self.arena.len(), "queued all buffers");
        Ok(())
    }

    /// Start streaming
    pub fn start(&mut self) -> Result<()> {
        if self.state == State::Streaming {
            return Err(Error::StreamOn(io::Error::new(
                io::ErrorKind::Other,
                "stream is already active",
            )));
        }
        if self.arena.is_empty() {
            return Err(Error::StreamOn(io::Error::new(
                io::ErrorKind::Other,
                "no buffers allocated",
            )));
        }

        self.driver.stream_on().map_err(Error::StreamOn)?;
        self.state = State::Streaming;

        info!(buffers = self.arena.len(), "streaming started");
        Ok(())
    }

    /// Stop streaming
    ///
    /// The driver gives up all buffers, so they are owned by the application afterwards.
    pub fn stop(&mut self) -> Result<()> {
        if self.state == State::Stopped {
            return Err(Error::StreamOff(io::Error::new(
                io::ErrorKind::Other,
                "stream is not active",
            )));
        }

        self.driver.stream_off().map_err(Error::StreamOff)?;
        self.state = State::Stopped;
        self.arena.reclaim();

        info!("streaming stopped");
        Ok(())
    }

    /// Remove a filled buffer from the drivers' outgoing queue
    ///
    /// Blocks until the driver completes a buffer. The returned frame borrows the buffer, which
    /// has to be queued again with [`Stream::queue`] once the frame was consumed.
    pub fn dequeue(&mut self) -> Result<Frame<'_>> {
        if self.state != State::Streaming {
            return Err(Error::Dequeue(io::Error::new(
                io::ErrorKind::Other,
                "stream is not active",
            )));
        }

        let meta = self.driver.dequeue().map_err(Error::Dequeue)?;
        self.arena.fill(meta).map_err(Error::Dequeue)?;

        debug!(
            index = meta.index,
            bytesused = meta.bytesused,
            sequence = meta.sequence,
            timestamp = %meta.timestamp,
            "dequeued buffer"
        );

        self.arena.frame(meta.index).ok_or_else(|| {
            Error::Dequeue(io::Error::new(
                io::ErrorKind::InvalidData,
                "dequeued buffer holds no frame",
            ))
        })
    }

    /// Stops streaming if needed and releases all buffers
    ///
    /// Dropping the stream does the same, this only makes a failing stream-off visible.
    pub fn release(mut self) -> Result<()> {
        self.teardown()
    }

    fn teardown(&mut self) -> Result<()> {
        let mut result = Ok(());
        if self.state == State::Streaming {
            // unmapping proceeds even if the driver refuses
            self.state = State::Stopped;
            if let Err(e) = self.driver.stream_off() {
                warn!(error = %e, "failed to stop streaming during teardown");
                result = Err(Error::StreamOff(e));
            }
            self.arena.reclaim();
        }

        if self.arena.is_allocated() {
            let unmapped = self.arena.release(&mut self.driver);
            debug!(unmapped, "released buffers");
        }

        result
    }
}

impl<D: Driver> Drop for Stream<D> {
    fn drop(&mut self) {
        // errors were already logged by teardown
        let _ = self.teardown();
    }
}

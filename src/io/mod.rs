//! Memory-mapped streaming I/O.
//!
//! [`Arena`] owns the mapped buffer pool, [`Stream`] owns the driver together with the arena and
//! tracks whether the driver is streaming. Dropping a [`Stream`] stops streaming, unmaps every
//! buffer and finally drops the driver, which closes the device.

pub mod arena;
pub use arena::Arena;

pub mod stream;
pub use stream::{State, Stream};

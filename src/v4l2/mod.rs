//! Raw transport towards the kernel driver.
//!
//! Every driver interaction of this crate funnels through the handful of functions re-exported
//! here. They are thin wrappers that turn `-1` returns into [`std::io::Error`]s carrying errno.

mod api;
pub use api::*;

pub mod vidioc;

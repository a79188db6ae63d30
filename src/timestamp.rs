use std::{fmt, time};

use crate::v4l_sys::timeval;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
/// Timestamp consisting of a seconds and a microseconds component
pub struct Timestamp {
    pub sec: libc::time_t,
    pub usec: libc::time_t,
}

impl Timestamp {
    /// Returns a timestamp representation
    ///
    /// # Arguments
    ///
    /// * `sec` - Seconds
    /// * `usec` - Microseconds
    ///
    /// # Example
    ///
    /// ```
    /// use v4l2capture::Timestamp;
    /// let ts = Timestamp::new(5, 5);
    /// ```
    pub fn new(sec: libc::time_t, usec: libc::time_t) -> Self {
        Timestamp { sec, usec }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let floating: f64 = self.sec as f64 + self.usec as f64 / 1_000_000.0;
        write!(f, "{} [s]", floating)
    }
}

impl From<timeval> for Timestamp {
    fn from(tv: timeval) -> Self {
        Timestamp {
            sec: tv.tv_sec as libc::time_t,
            usec: tv.tv_usec as libc::time_t,
        }
    }
}

impl From<Timestamp> for time::Duration {
    fn from(ts: Timestamp) -> Self {
        // driver timestamps are CLOCK_MONOTONIC and never negative in practice
        time::Duration::from_secs(ts.sec.max(0) as u64)
            + time::Duration::from_micros(ts.usec.max(0) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_to_duration() {
        let ts = Timestamp::new(3, 250_000);
        assert_eq!(time::Duration::from(ts), time::Duration::from_millis(3250));
    }

    #[test]
    fn displays_seconds() {
        assert_eq!(Timestamp::new(1, 500_000).to_string(), "1.5 [s]");
    }
}

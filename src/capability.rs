use bitflags::bitflags;
use std::{fmt, str};

use crate::v4l_sys::*;

bitflags! {
    /// Device capability flags such as V4L2_CAP_VIDEO_CAPTURE
    #[allow(clippy::unreadable_literal)]
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
    pub struct Flags: u32 {
        const VIDEO_CAPTURE         = 0x00000001;
        const VIDEO_OUTPUT          = 0x00000002;
        const VIDEO_OVERLAY         = 0x00000004;
        const VBI_CAPTURE           = 0x00000010;
        const VBI_OUTPUT            = 0x00000020;
        const VIDEO_CAPTURE_MPLANE  = 0x00001000;
        const VIDEO_OUTPUT_MPLANE   = 0x00002000;
        const VIDEO_M2M_MPLANE      = 0x00004000;
        const VIDEO_M2M             = 0x00008000;
        const EXT_PIX_FORMAT        = 0x00200000;
        const META_CAPTURE          = 0x00800000;
        const READ_WRITE            = 0x01000000;
        const STREAMING             = 0x04000000;
        const DEVICE_CAPS           = 0x80000000;
    }
}

impl From<u32> for Flags {
    fn from(flags: u32) -> Self {
        Self::from_bits_truncate(flags)
    }
}

impl fmt::Display for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut prefix = "";
        for (name, _) in self.iter_names() {
            write!(f, "{}{}", prefix, name)?;
            prefix = ", ";
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
/// Device capabilities
pub struct Capabilities {
    /// Driver name, e.g. uvc for usb video class devices
    pub driver: String,
    /// Card name
    pub card: String,
    /// Bus name, e.g. USB or PCI
    pub bus: String,
    /// Version number MAJOR.MINOR.PATCH
    pub version: (u8, u8, u8),

    /// Capabilities of the opened device node
    ///
    /// When the driver fills in per-node capabilities those are used, otherwise this falls back
    /// to the capabilities of the physical device as a whole.
    pub capabilities: Flags,
}

impl Capabilities {
    /// Returns the first capability memory-mapped video capture needs but the node lacks
    pub fn missing_for_capture(&self) -> Option<&'static str> {
        if !self.capabilities.contains(Flags::VIDEO_CAPTURE) {
            Some("video capture")
        } else if !self.capabilities.contains(Flags::STREAMING) {
            Some("streaming I/O")
        } else {
            None
        }
    }
}

/// Decodes a fixed-size, NUL padded C string field
fn c_field(raw: &[u8]) -> String {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    String::from_utf8_lossy(&raw[..end]).into_owned()
}

impl From<v4l2_capability> for Capabilities {
    fn from(cap: v4l2_capability) -> Self {
        let physical = Flags::from(cap.capabilities);
        let capabilities = if physical.contains(Flags::DEVICE_CAPS) {
            Flags::from(cap.device_caps)
        } else {
            physical
        };

        Capabilities {
            driver: c_field(&cap.driver),
            card: c_field(&cap.card),
            bus: c_field(&cap.bus_info),
            version: (
                ((cap.version >> 16) & 0xff) as u8,
                ((cap.version >> 8) & 0xff) as u8,
                (cap.version & 0xff) as u8,
            ),
            capabilities,
        }
    }
}

impl fmt::Display for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Driver      : {}", self.driver)?;
        writeln!(f, "Card        : {}", self.card)?;
        writeln!(f, "Bus         : {}", self.bus)?;
        writeln!(
            f,
            "Version     : {}.{}.{}",
            self.version.0, self.version.1, self.version.2
        )?;
        writeln!(f, "Capabilites : {}", self.capabilities)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem;

    fn raw(capabilities: u32, device_caps: u32) -> v4l2_capability {
        let mut cap: v4l2_capability = unsafe { mem::zeroed() };
        cap.driver[..3].copy_from_slice(b"uvc");
        cap.card[..6].copy_from_slice(b"Webcam");
        cap.version = (6 << 16) | (8 << 8) | 1;
        cap.capabilities = capabilities;
        cap.device_caps = device_caps;
        cap
    }

    #[test]
    fn prefers_node_capabilities() {
        let caps = Capabilities::from(raw(
            0x8000_0000 | 0x0000_0001 | 0x0080_0000 | 0x0400_0000,
            0x0080_0000 | 0x0400_0000,
        ));
        assert_eq!(caps.driver, "uvc");
        assert_eq!(caps.card, "Webcam");
        assert_eq!(caps.version, (6, 8, 1));
        // the metadata node of a uvc camera streams, but cannot capture video
        assert_eq!(caps.missing_for_capture(), Some("video capture"));
    }

    #[test]
    fn falls_back_to_physical_capabilities() {
        let caps = Capabilities::from(raw(0x0000_0001 | 0x0400_0000, 0));
        assert_eq!(caps.missing_for_capture(), None);
    }

    #[test]
    fn capture_without_streaming_is_incomplete() {
        let caps = Capabilities::from(raw(0x0000_0001 | 0x0100_0000, 0));
        assert_eq!(caps.missing_for_capture(), Some("streaming I/O"));
    }

    #[test]
    fn displays_flag_names() {
        let flags = Flags::VIDEO_CAPTURE | Flags::STREAMING;
        assert_eq!(flags.to_string(), "VIDEO_CAPTURE, STREAMING");
    }
}

use std::{fmt, str};

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
/// Four character code representing a pixelformat
pub struct FourCC {
    pub repr: [u8; 4],
}

impl FourCC {
    /// Packed YUV 4:2:2
    pub const YUYV: FourCC = FourCC { repr: *b"YUYV" };
    /// Motion JPEG, every buffer holds a complete JPEG image
    pub const MJPG: FourCC = FourCC { repr: *b"MJPG" };

    #[allow(clippy::trivially_copy_pass_by_ref)]
    /// Returns a pixelformat as four character code
    ///
    /// # Arguments
    ///
    /// * `repr` - Four characters as raw bytes
    ///
    /// # Example
    ///
    /// ```
    /// use v4l2capture::FourCC;
    /// let fourcc = FourCC::new(b"YUYV");
    /// ```
    pub const fn new(repr: &[u8; 4]) -> FourCC {
        FourCC { repr: *repr }
    }

    /// Returns the string representation of a four character code
    ///
    /// # Example
    ///
    /// ```
    /// use v4l2capture::FourCC;
    /// let fourcc = FourCC::new(b"YUYV");
    /// let str = fourcc.str().unwrap();
    /// ```
    pub fn str(&self) -> Result<&str, str::Utf8Error> {
        str::from_utf8(&self.repr)
    }

    /// Whether buffers of this format carry a compressed JPEG bitstream
    pub fn is_jpeg(&self) -> bool {
        matches!(&self.repr, b"MJPG" | b"JPEG")
    }
}

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let string = str::from_utf8(&self.repr);
        if let Ok(string) = string {
            write!(f, "{}", string)?;
        }
        Ok(())
    }
}

impl str::FromStr for FourCC {
    type Err = String;

    /// Parses a code such as `YUYV`; shorter codes are padded with spaces as V4L2 does
    /// (`Y8` becomes `"Y8  "`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || s.len() > 4 || !s.is_ascii() {
            return Err(format!(
                "invalid pixel format {:?}: expected 1 to 4 ASCII characters",
                s
            ));
        }

        let mut repr = [b' '; 4];
        repr[..s.len()].copy_from_slice(s.as_bytes());
        Ok(FourCC { repr })
    }
}

impl From<u32> for FourCC {
    fn from(code: u32) -> Self {
        FourCC::new(&code.to_le_bytes())
    }
}

impl From<FourCC> for u32 {
    fn from(fourcc: FourCC) -> Self {
        Self::from_le_bytes(fourcc.repr)
    }
}

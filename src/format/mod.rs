use std::convert::TryFrom;
use std::{fmt, mem};

use crate::v4l_sys::*;

pub mod field;
pub use field::FieldOrder;

pub mod fourcc;
pub use fourcc::FourCC;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
/// Streaming format (single-planar)
pub struct Format {
    /// width in pixels
    pub width: u32,
    /// height in pixels
    pub height: u32,
    /// pixelformat code
    pub fourcc: FourCC,
    /// field order for interlacing
    pub field_order: FieldOrder,

    /// bytes per line
    pub stride: u32,
    /// maximum number of bytes required to store an image
    pub size: u32,
}

impl Format {
    /// Returns a capture format
    ///
    /// Stride and size are left at zero for the driver to fill in.
    ///
    /// # Arguments
    ///
    /// * `width` - Width in pixels
    /// * `height` - Height in pixels
    /// * `fourcc` - Four character code (pixelformat)
    ///
    /// # Example
    ///
    /// ```
    /// use v4l2capture::{Format, FourCC};
    /// let fmt = Format::new(640, 480, FourCC::new(b"YUYV"));
    /// ```
    pub const fn new(width: u32, height: u32, fourcc: FourCC) -> Self {
        Format {
            width,
            height,
            fourcc,
            field_order: FieldOrder::Any,
            stride: 0,
            size: 0,
        }
    }

    /// Requests a specific field order
    pub const fn with_field_order(mut self, field_order: FieldOrder) -> Self {
        self.field_order = field_order;
        self
    }

    /// Whether the driver honored the parts of `requested` an application asks for
    ///
    /// Stride and size are driver outputs and take no part in the comparison. A requested field
    /// order of [`FieldOrder::Any`] accepts whatever the driver picked.
    pub fn satisfies(&self, requested: &Format) -> bool {
        self.width == requested.width
            && self.height == requested.height
            && self.fourcc == requested.fourcc
            && (requested.field_order == FieldOrder::Any
                || self.field_order == requested.field_order)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "width          : {}", self.width)?;
        writeln!(f, "height         : {}", self.height)?;
        writeln!(f, "fourcc         : {}", self.fourcc)?;
        writeln!(f, "field          : {}", self.field_order)?;
        writeln!(f, "stride         : {}", self.stride)?;
        writeln!(f, "size           : {}", self.size)?;
        Ok(())
    }
}

impl From<v4l2_pix_format> for Format {
    fn from(fmt: v4l2_pix_format) -> Self {
        Self {
            width: fmt.width,
            height: fmt.height,
            fourcc: FourCC::from(fmt.pixelformat),
            // drivers newer than this table may report field orders we do not know about
            field_order: FieldOrder::try_from(fmt.field).unwrap_or(FieldOrder::Any),
            stride: fmt.bytesperline,
            size: fmt.sizeimage,
        }
    }
}

impl From<Format> for v4l2_pix_format {
    fn from(format: Format) -> Self {
        Self {
            width: format.width,
            height: format.height,
            pixelformat: format.fourcc.into(),
            field: format.field_order as u32,
            bytesperline: format.stride,
            sizeimage: format.size,
            ..unsafe { mem::zeroed() }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adjusted_resolution_is_not_satisfying() {
        let requested = Format::new(10, 10, FourCC::MJPG);
        let mut actual = requested;
        actual.width = 160;
        actual.height = 120;
        actual.size = 38_400;
        assert!(!actual.satisfies(&requested));
    }

    #[test]
    fn driver_outputs_and_any_field_are_ignored() {
        let requested = Format::new(640, 480, FourCC::YUYV);
        let mut actual = requested.with_field_order(FieldOrder::Progressive);
        actual.stride = 1280;
        actual.size = 614_400;
        assert!(actual.satisfies(&requested));

        let strict = requested.with_field_order(FieldOrder::Interlaced);
        assert!(!actual.satisfies(&strict));
    }

    #[test]
    fn pix_format_round_trip_keeps_field() {
        let fmt = Format::new(640, 480, FourCC::YUYV).with_field_order(FieldOrder::Progressive);
        let raw: v4l2_pix_format = fmt.into();
        assert_eq!(raw.field, 1);
        assert_eq!(Format::from(raw), fmt);
    }
}

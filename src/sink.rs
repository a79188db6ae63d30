//! Destinations for captured frames.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::buffer::Frame;
use crate::{Error, Format, FourCC, Result};

/// Consumer of captured frames
///
/// A sink sees every frame exactly once, while its buffer is owned by the application. It must
/// copy what it wants to keep: the buffer is handed back to the driver right after
/// [`Sink::persist`] returns.
pub trait Sink {
    /// Called once with the negotiated format, before the first frame
    fn begin(&mut self, _format: &Format) {}

    /// Stores a single frame
    ///
    /// # Arguments
    ///
    /// * `number` - Position of the frame in the capture loop, counting from zero
    /// * `frame` - The payload, exactly as many bytes as the driver filled in
    fn persist(&mut self, number: u32, frame: &Frame<'_>) -> Result<()>;
}

/// Writes every frame verbatim into its own file
///
/// Files are named `<prefix><number>.<extension>` and placed in a single directory. Without an
/// explicit extension one is derived from the negotiated pixel format.
#[derive(Debug, Clone)]
pub struct FileSink {
    dir: PathBuf,
    prefix: String,
    extension: Option<String>,
}

impl FileSink {
    /// Returns a sink writing into `dir`
    ///
    /// # Example
    ///
    /// ```
    /// use v4l2capture::sink::FileSink;
    ///
    /// let sink = FileSink::new("/tmp", "frame", Some("yuv".to_string()));
    /// assert_eq!(sink.path(7), std::path::Path::new("/tmp/frame7.yuv"));
    /// ```
    pub fn new<P: AsRef<Path>>(dir: P, prefix: &str, extension: Option<String>) -> Self {
        FileSink {
            dir: dir.as_ref().to_path_buf(),
            prefix: prefix.to_string(),
            extension,
        }
    }

    /// Returns the extension used for raw frames of `fourcc`
    ///
    /// Motion JPEG frames are complete JPEG images, anything else is named after the
    /// alphanumeric characters of its pixel format, or `raw` if there are none.
    pub fn extension_for(fourcc: FourCC) -> String {
        if fourcc.is_jpeg() {
            return "jpg".to_string();
        }

        let ext: String = fourcc
            .repr
            .iter()
            .filter(|b| b.is_ascii_alphanumeric())
            .map(|b| b.to_ascii_lowercase() as char)
            .collect();
        if ext.is_empty() {
            "raw".to_string()
        } else {
            ext
        }
    }

    /// Path of the file holding frame `number`
    pub fn path(&self, number: u32) -> PathBuf {
        let mut name = format!("{}{}", self.prefix, number);
        if let Some(ext) = self.extension.as_deref().filter(|ext| !ext.is_empty()) {
            name.push('.');
            name.push_str(ext);
        }
        self.dir.join(name)
    }
}

impl Sink for FileSink {
    fn begin(&mut self, format: &Format) {
        if self.extension.is_none() {
            self.extension = Some(Self::extension_for(format.fourcc));
        }
    }

    fn persist(&mut self, number: u32, frame: &Frame<'_>) -> Result<()> {
        let path = self.path(number);
        fs::write(&path, frame.data).map_err(|source| Error::Persist {
            frame: number,
            path: path.clone(),
            source,
        })?;

        debug!(frame = number, bytes = frame.len(), path = %path.display(), "wrote frame");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_follows_fourcc() {
        assert_eq!(FileSink::extension_for(FourCC::MJPG), "jpg");
        assert_eq!(FileSink::extension_for(FourCC::new(b"JPEG")), "jpg");
        assert_eq!(FileSink::extension_for(FourCC::YUYV), "yuyv");
        assert_eq!(FileSink::extension_for("Y8".parse().unwrap()), "y8");
    }

    #[test]
    fn extension_keeps_only_alphanumerics() {
        assert_eq!(FileSink::extension_for(FourCC::new(b"a/\0B")), "ab");
        assert_eq!(FileSink::extension_for(FourCC::new(b"../\0")), "raw");

        let mut sink = FileSink::new("out", "frame", None);
        sink.begin(&Format::new(640, 480, FourCC::new(b"Y/..")));
        assert_eq!(sink.path(0), Path::new("out/frame0.y"));
    }

    #[test]
    fn explicit_extension_wins() {
        let mut sink = FileSink::new("out", "img", Some("raw".to_string()));
        sink.begin(&Format::new(640, 480, FourCC::MJPG));
        assert_eq!(sink.path(0), Path::new("out/img0.raw"));
    }

    #[test]
    fn empty_extension_is_omitted() {
        let sink = FileSink::new("out", "img", Some(String::new()));
        assert_eq!(sink.path(12), Path::new("out/img12"));
    }
}

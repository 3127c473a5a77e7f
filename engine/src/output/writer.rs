use std::path::PathBuf;

use slide_sift_common::frame::Frame;
use tracing::debug;

use crate::error::EngineResult;

use super::naming::TimestampNamer;

/// Persistence capability invoked once per detected boundary frame.
///
/// Implementations must not influence detection control flow; a writer
/// failure aborts the pass but never changes what counts as a boundary.
pub trait SlideWriter {
    fn write(&mut self, frame: &Frame, position: u64) -> EngineResult<()>;
}

/// Discards every frame.
pub struct NullWriter;

impl SlideWriter for NullWriter {
    fn write(&mut self, _frame: &Frame, _position: u64) -> EngineResult<()> {
        Ok(())
    }
}

/// Saves each boundary frame as an image named by its derived timestamp,
/// e.g. `slides/00-04-37_500.png`.
pub struct TimestampImageWriter {
    namer: TimestampNamer,
    dir: PathBuf,
    extension: String,
}

impl TimestampImageWriter {
    /// Creates the output directory if needed. `extension` may be given
    /// with or without the leading dot.
    pub fn new(fps: f64, dir: impl Into<PathBuf>, extension: &str) -> EngineResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            namer: TimestampNamer::new(fps),
            dir,
            extension: extension.trim_start_matches('.').to_string(),
        })
    }

    pub fn path_for(&self, position: u64) -> PathBuf {
        self.dir
            .join(format!("{}.{}", self.namer.file_stem_at(position), self.extension))
    }
}

impl SlideWriter for TimestampImageWriter {
    fn write(&mut self, frame: &Frame, position: u64) -> EngineResult<()> {
        let path = self.path_for(position);
        frame.as_rgb().save(&path)?;
        debug!(path = %path.display(), position, "wrote slide image");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_is_built_from_timestamp_and_extension() {
        let dir = std::env::temp_dir().join("slide_sift_writer_path_test");
        let writer = TimestampImageWriter::new(1.0, &dir, "png").unwrap();
        let path = writer.path_for(3661);
        assert_eq!(path.file_name().unwrap(), "01-01-01_000.png");
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn leading_dot_in_extension_is_tolerated() {
        let dir = std::env::temp_dir().join("slide_sift_writer_dot_test");
        let writer = TimestampImageWriter::new(1.0, &dir, ".jpg").unwrap();
        assert_eq!(writer.path_for(0).file_name().unwrap(), "00-00-00_000.jpg");
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn writes_an_image_file() {
        let dir = std::env::temp_dir().join("slide_sift_writer_save_test");
        let mut writer = TimestampImageWriter::new(1.0, &dir, "png").unwrap();
        let frame = Frame::solid(4, 4, [1, 2, 3]);
        writer.write(&frame, 5).unwrap();
        assert!(writer.path_for(5).exists());
        std::fs::remove_dir_all(&dir).ok();
    }
}

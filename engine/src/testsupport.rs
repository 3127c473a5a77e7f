//! Synthetic in-memory stream for unit tests.

use slide_sift_common::frame::Frame;

use crate::error::EngineResult;
use crate::timeline::FrameSource;

/// In-memory stream of pre-built frames with exact cursor semantics:
/// `read` returns the frame at the cursor and advances by one, `seek` moves
/// the cursor anywhere (reads past the end simply return `None`).
pub(crate) struct MemoryStream {
    frames: Vec<Frame>,
    fps: f64,
    cursor: u64,
}

impl MemoryStream {
    /// One solid-color 8x8 frame per entry in `colors`.
    pub(crate) fn new(colors: &[[u8; 3]], fps: f64) -> Self {
        let frames = colors.iter().map(|c| Frame::solid(8, 8, *c)).collect();
        Self {
            frames,
            fps,
            cursor: 0,
        }
    }
}

impl FrameSource for MemoryStream {
    fn frame_count(&self) -> u64 {
        self.frames.len() as u64
    }

    fn frame_rate(&self) -> f64 {
        self.fps
    }

    fn position(&self) -> u64 {
        self.cursor
    }

    fn seek(&mut self, pos: u64) -> EngineResult<()> {
        self.cursor = pos;
        Ok(())
    }

    fn read(&mut self) -> Option<Frame> {
        let frame = self.frames.get(self.cursor as usize).cloned()?;
        self.cursor += 1;
        Some(frame)
    }
}

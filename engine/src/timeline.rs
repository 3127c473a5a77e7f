use slide_sift_common::frame::Frame;
use tracing::debug;

use crate::error::EngineResult;

/// A seekable, frame-counted stream of decoded video frames.
///
/// The [`Timeline`] is the only component that seeks or reads a source; all
/// higher layers reason in logical frame positions. A `None` from [`read`]
/// means the stream is exhausted — failed reads are treated the same way and
/// never retried.
///
/// [`read`]: FrameSource::read
pub trait FrameSource {
    /// Total number of frames the stream reports.
    fn frame_count(&self) -> u64;

    /// Native frame rate; non-positive when the container does not report
    /// one.
    fn frame_rate(&self) -> f64;

    /// Index of the frame the next sequential [`read`](FrameSource::read)
    /// will return.
    fn position(&self) -> u64;

    /// Position the cursor so the next read returns the frame at `pos`.
    fn seek(&mut self, pos: u64) -> EngineResult<()>;

    /// Decode the frame at the cursor and advance the cursor by one.
    fn read(&mut self) -> Option<Frame>;
}

/// Derive the downsample step from the native frame rate and the rate at
/// which frames should be analyzed. Falls back to 1 when either rate is
/// unusable.
pub fn step_from_rate(fps: f64, analysis_rate: f64) -> u64 {
    if fps <= 0.0 || analysis_rate <= 0.0 {
        return 1;
    }
    ((fps / analysis_rate) as u64).max(1)
}

/// Logical sequence of frames, rendered lazily from the stream.
///
/// The reader head mirrors the stream's own cursor exactly — it is never
/// allowed to drift. After each successful read the head lands `step` past
/// the frame's position, so sequential and random access sample the same
/// step-aligned grid. The timeline owns the stream exclusively; dropping the
/// timeline releases it, on every exit path including early abandonment.
pub struct Timeline<S: FrameSource> {
    stream: S,
    step: u64,
    len: u64,
    fps: f64,
}

impl<S: FrameSource> Timeline<S> {
    /// Wrap a stream, sampling every `step`-th frame. `step` is clamped to
    /// at least 1, and forced to 1 when the stream reports a non-positive
    /// rate (permissive fallback, not an error).
    pub fn new(stream: S, step: u64) -> Self {
        let len = stream.frame_count();
        let fps = stream.frame_rate();
        let step = if fps <= 0.0 { 1 } else { step.max(1) };
        debug!(len, fps, step, "timeline created");
        Self {
            stream,
            step,
            len,
            fps,
        }
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn step(&self) -> u64 {
        self.step
    }

    /// Current position of the reader head: the frame a sequential read
    /// would return next. Always equal to the stream's own cursor.
    pub fn reader_head(&self) -> u64 {
        self.stream.position()
    }

    /// Move the reader head to `pos`.
    pub fn seek(&mut self, pos: u64) -> EngineResult<()> {
        self.stream.seek(pos)
    }

    /// Read the frame at the reader head.
    ///
    /// Returns the position the head had before the read together with the
    /// frame, or `(position, None)` once the stream is exhausted. On success
    /// the head is advanced so that consecutive calls land exactly `step`
    /// apart.
    pub fn next_frame(&mut self) -> EngineResult<(u64, Option<Frame>)> {
        let pos = self.stream.position();
        let Some(frame) = self.stream.read() else {
            debug!(pos, "end of stream");
            return Ok((pos, None));
        };
        // The read itself advanced the cursor by one; make up the rest.
        if self.step > 1 {
            self.stream.seek(pos + self.step)?;
        }
        Ok((pos, Some(frame)))
    }

    /// Read the frame at an arbitrary position.
    ///
    /// Out-of-bounds positions return `None` without touching the reader
    /// head. Otherwise the head ends up at `pos + step`, the same
    /// compensating advance [`next_frame`](Timeline::next_frame) applies.
    pub fn get_frame(&mut self, pos: u64) -> EngineResult<Option<Frame>> {
        if pos >= self.len {
            return Ok(None);
        }
        self.stream.seek(pos)?;
        let Some(frame) = self.stream.read() else {
            return Ok(None);
        };
        if self.step > 1 {
            self.stream.seek(pos + self.step)?;
        }
        Ok(Some(frame))
    }

    /// Frames at `start, start+step, …` while `< end`. `end >= start` is a
    /// precondition.
    pub fn get_frames(&mut self, start: u64, end: u64) -> EngineResult<Vec<Option<Frame>>> {
        debug_assert!(end >= start);
        let mut frames = Vec::new();
        let mut pos = start;
        while pos < end {
            frames.push(self.get_frame(pos)?);
            pos += self.step;
        }
        Ok(frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testsupport::MemoryStream;

    fn solid_stream(count: usize, fps: f64) -> MemoryStream {
        MemoryStream::new(&vec![[0, 0, 0]; count], fps)
    }

    #[test]
    fn step_one_positions_increase_by_one() {
        let mut timeline = Timeline::new(solid_stream(5, 30.0), 1);
        for expected in 0..5 {
            let (pos, frame) = timeline.next_frame().unwrap();
            assert_eq!(pos, expected);
            assert!(frame.is_some());
        }
        let (_, frame) = timeline.next_frame().unwrap();
        assert!(frame.is_none());
    }

    #[test]
    fn step_k_positions_are_k_apart() {
        let mut timeline = Timeline::new(solid_stream(10, 30.0), 3);
        for (calls, expected) in [(1u64, 0u64), (2, 3), (3, 6), (4, 9)] {
            let (pos, frame) = timeline.next_frame().unwrap();
            assert_eq!(pos, expected);
            assert!(frame.is_some());
            assert_eq!(timeline.reader_head(), calls * 3);
        }
        let (_, frame) = timeline.next_frame().unwrap();
        assert!(frame.is_none());
    }

    #[test]
    fn get_frame_out_of_bounds_leaves_head_alone() {
        let mut timeline = Timeline::new(solid_stream(4, 30.0), 1);
        timeline.seek(2).unwrap();
        assert!(timeline.get_frame(4).unwrap().is_none());
        assert!(timeline.get_frame(100).unwrap().is_none());
        assert_eq!(timeline.reader_head(), 2);
    }

    #[test]
    fn get_frame_applies_step_advance() {
        let mut timeline = Timeline::new(solid_stream(10, 30.0), 2);
        assert!(timeline.get_frame(4).unwrap().is_some());
        assert_eq!(timeline.reader_head(), 6);
    }

    #[test]
    fn get_frames_samples_the_step_grid() {
        let mut timeline = Timeline::new(solid_stream(10, 30.0), 2);
        let frames = timeline.get_frames(0, 7).unwrap();
        // Positions 0, 2, 4, 6.
        assert_eq!(frames.len(), 4);
        assert!(frames.iter().all(|f| f.is_some()));
    }

    #[test]
    fn non_positive_rate_forces_step_one() {
        let timeline = Timeline::new(solid_stream(5, 0.0), 7);
        assert_eq!(timeline.step(), 1);
    }

    #[test]
    fn step_from_rate_derivation() {
        assert_eq!(step_from_rate(30.0, 1.0), 30);
        assert_eq!(step_from_rate(30.0, 0.1), 300);
        assert_eq!(step_from_rate(29.97, 1.0), 29);
        // Analysis rate above the native rate clamps to 1.
        assert_eq!(step_from_rate(10.0, 40.0), 1);
        // Unreported rates fall back to 1.
        assert_eq!(step_from_rate(0.0, 1.0), 1);
        assert_eq!(step_from_rate(30.0, 0.0), 1);
    }
}

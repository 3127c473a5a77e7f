use slide_sift_common::frame::Frame;
use tracing::{debug, info};

use crate::compare::FrameComparator;
use crate::error::{EngineError, EngineResult};
use crate::timeline::{FrameSource, Timeline};

/// What the detector saw at a position.
#[derive(Debug, Clone)]
pub enum EventKind {
    /// The content did not change; nothing to keep here.
    NoTransition,
    /// A new stable visual state begins here; the frame is its
    /// representative.
    Transition(Frame),
}

/// One entry of the detector's ordered event stream.
#[derive(Debug, Clone)]
pub struct TransitionEvent {
    pub position: u64,
    pub kind: EventKind,
}

impl TransitionEvent {
    fn none(position: u64) -> Self {
        Self {
            position,
            kind: EventKind::NoTransition,
        }
    }

    fn boundary(position: u64, frame: Frame) -> Self {
        Self {
            position,
            kind: EventKind::Transition(frame),
        }
    }

    pub fn is_transition(&self) -> bool {
        matches!(self.kind, EventKind::Transition(_))
    }
}

enum DetectorState {
    /// Position 0 has not been read yet.
    Seed,
    /// Walking the step grid, comparing each frame to the previous one.
    CoarseScan,
    /// Terminal; reached at end-of-stream or after a fatal error.
    Done,
}

/// Drives a [`Timeline`] and a [`FrameComparator`] to find content
/// transitions.
///
/// The detector is an iterator over [`TransitionEvent`]s. Position 0 is
/// always emitted first — as a boundary when the stream has a first frame.
/// Afterwards every consumed frame produces exactly one event, and a
/// detected boundary is immediately followed by a trailing no-transition
/// event at the same position, so downstream bookkeeping advances uniformly
/// whether or not a boundary occurred.
///
/// Refinement — walking forward one frame at a time until the transition has
/// visually settled — only runs when `step == 1`. With a larger step the
/// first differing frame is accepted as the boundary immediately; the
/// skipped frames are not backtracked. That restriction is deliberate.
///
/// A comparator failure is fatal: the iterator yields the error once and
/// then ends. End-of-stream is the normal terminal state, not a failure.
pub struct TransitionDetector<'a, S: FrameSource> {
    timeline: &'a mut Timeline<S>,
    comparator: &'a dyn FrameComparator,
    prev: Option<Frame>,
    state: DetectorState,
    /// Trailing no-transition event queued behind a boundary.
    queued: Option<TransitionEvent>,
}

impl<'a, S: FrameSource> TransitionDetector<'a, S> {
    pub fn new(timeline: &'a mut Timeline<S>, comparator: &'a dyn FrameComparator) -> Self {
        Self {
            timeline,
            comparator,
            prev: None,
            state: DetectorState::Seed,
            queued: None,
        }
    }

    /// Read position 0 unconditionally and emit it as the first boundary.
    fn seed(&mut self) -> EngineResult<TransitionEvent> {
        self.state = DetectorState::CoarseScan;
        match self.timeline.get_frame(0)? {
            Some(frame) => {
                debug!("seeded at position 0");
                self.prev = Some(frame.clone());
                Ok(TransitionEvent::boundary(0, frame))
            }
            None => {
                debug!("stream empty at seed");
                Ok(TransitionEvent::none(0))
            }
        }
    }

    fn scan(&mut self) -> EngineResult<Option<TransitionEvent>> {
        let (pos, frame) = self.timeline.next_frame()?;
        let Some(frame) = frame else {
            self.state = DetectorState::Done;
            return Ok(None);
        };

        let prev = self.prev.as_ref().ok_or(EngineError::ComparatorInput)?;
        if self.comparator.are_same(prev, &frame)? {
            self.prev = Some(frame);
            return Ok(Some(TransitionEvent::none(pos)));
        }

        // Content changed; settle on the boundary frame.
        let (pos, frame) = if self.timeline.step() == 1 {
            self.refine(pos, frame)?
        } else {
            self.prev = Some(frame.clone());
            (pos, frame)
        };

        info!(position = pos, "transition detected");
        self.queued = Some(TransitionEvent::none(pos));
        Ok(Some(TransitionEvent::boundary(pos, frame)))
    }

    /// Walk forward one frame at a time while consecutive frames keep
    /// differing; the transition has settled once a pair compares the same.
    /// Returns the first frame of the settled pair — or, if the stream ends
    /// while the content is still in motion, the last frame it produced.
    fn refine(&mut self, first_pos: u64, first: Frame) -> EngineResult<(u64, Frame)> {
        let mut prev_pos = first_pos;
        let mut prev = first;
        loop {
            let (pos, next) = self.timeline.next_frame()?;
            let Some(next) = next else {
                debug!(position = prev_pos, "stream ended during refinement");
                self.prev = Some(prev.clone());
                return Ok((prev_pos, prev));
            };
            if self.comparator.are_same(&prev, &next)? {
                self.prev = Some(next);
                return Ok((prev_pos, prev));
            }
            prev_pos = pos;
            prev = next;
        }
    }

    fn fail(&mut self, error: EngineError) -> EngineError {
        self.state = DetectorState::Done;
        error
    }
}

impl<'a, S: FrameSource> Iterator for TransitionDetector<'a, S> {
    type Item = EngineResult<TransitionEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(event) = self.queued.take() {
            return Some(Ok(event));
        }
        match self.state {
            DetectorState::Seed => Some(self.seed().map_err(|e| self.fail(e))),
            DetectorState::CoarseScan => match self.scan() {
                Ok(Some(event)) => Some(Ok(event)),
                Ok(None) => None,
                Err(e) => Some(Err(self.fail(e))),
            },
            DetectorState::Done => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::AbsDiffComparator;
    use crate::testsupport::MemoryStream;

    const A: [u8; 3] = [0, 0, 0];
    const B: [u8; 3] = [255, 255, 255];
    const C: [u8; 3] = [128, 0, 0];

    /// Comparator that only matches identical solid colors.
    fn exact() -> AbsDiffComparator {
        AbsDiffComparator::new(1.0)
    }

    fn events(colors: &[[u8; 3]], step: u64) -> Vec<TransitionEvent> {
        let mut timeline = Timeline::new(MemoryStream::new(colors, 30.0), step);
        let comparator = exact();
        TransitionDetector::new(&mut timeline, &comparator)
            .collect::<EngineResult<Vec<_>>>()
            .unwrap()
    }

    fn boundary_positions(events: &[TransitionEvent]) -> Vec<u64> {
        events
            .iter()
            .filter(|e| e.is_transition())
            .map(|e| e.position)
            .collect()
    }

    #[test]
    fn first_event_is_always_position_zero() {
        for colors in [vec![A], vec![A, B], vec![]] {
            let events = events(&colors, 1);
            assert_eq!(events[0].position, 0);
        }
    }

    #[test]
    fn empty_stream_emits_single_no_transition() {
        let events = events(&[], 1);
        assert_eq!(events.len(), 1);
        assert!(!events[0].is_transition());
    }

    #[test]
    fn boundaries_settle_on_the_first_stable_frame() {
        // A A A B B with step 1: the change is seen at 3, and frames 3/4
        // compare the same, so the boundary is 3.
        let events = events(&[A, A, A, B, B], 1);
        assert_eq!(boundary_positions(&events), vec![0, 3]);
    }

    #[test]
    fn refinement_walks_through_a_moving_transition() {
        // A, then two in-between states, then stable B: the boundary is the
        // first of the settled pair.
        let events = events(&[A, C, B, B, B], 1);
        assert_eq!(boundary_positions(&events), vec![0, 2]);
    }

    #[test]
    fn stream_end_during_refinement_keeps_the_last_frame() {
        // Every frame differs from the one before and the stream ends while
        // the content is still changing; the last frame read is kept.
        let events = events(&[A, B, C], 1);
        assert_eq!(boundary_positions(&events), vec![0, 2]);
        let last = events.last().unwrap();
        assert!(!last.is_transition());
        assert_eq!(last.position, 2);
    }

    #[test]
    fn large_step_accepts_the_first_differing_frame() {
        // Sampled positions with step 2 are [0, 2, 4] = [A, A, B]; the
        // refinement pass is skipped and 4 is the boundary.
        let events = events(&[A, A, A, B, B], 2);
        assert_eq!(boundary_positions(&events), vec![0, 4]);
    }

    #[test]
    fn boundary_is_followed_by_trailing_event_at_same_position() {
        let events = events(&[A, A, A, B, B], 1);
        for (i, event) in events.iter().enumerate() {
            if event.is_transition() && event.position != 0 {
                let trailing = &events[i + 1];
                assert!(!trailing.is_transition());
                assert_eq!(trailing.position, event.position);
            }
        }
        // One event per scanned position, plus the trailing one.
        assert_eq!(events.len(), 5);
    }

    #[test]
    fn unchanged_stream_has_single_boundary() {
        let events = events(&[A, A, A, A], 1);
        assert_eq!(boundary_positions(&events), vec![0]);
        assert_eq!(events.len(), 4);
    }
}

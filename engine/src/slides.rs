use slide_sift_common::frame::Frame;
use tracing::info;

use crate::compare::FrameComparator;
use crate::detector::{EventKind, TransitionDetector, TransitionEvent};
use crate::error::EngineResult;
use crate::output::naming::TimestampNamer;
use crate::output::writer::SlideWriter;
use crate::progress::ProgressSink;
use crate::timeline::{FrameSource, Timeline};

/// A named, timestamped image produced from a detected transition.
///
/// Slides come out in detection order, strictly increasing by position.
#[derive(Debug, Clone)]
pub struct Slide {
    /// Timestamp label derived from the position and the video rate.
    pub label: String,
    /// Frame index at which the slide begins.
    pub position: u64,
    pub frame: Frame,
}

/// Produces [`Slide`]s from detector events.
///
/// Owns the timeline and the comparator/writer capabilities. The writer is
/// invoked once per boundary frame and never influences detection; every
/// event — boundary or not — advances the progress sink.
pub struct SlideExtractor<S: FrameSource> {
    timeline: Timeline<S>,
    comparator: Box<dyn FrameComparator>,
    writer: Box<dyn SlideWriter>,
}

impl<S: FrameSource> SlideExtractor<S> {
    pub fn new(
        timeline: Timeline<S>,
        comparator: Box<dyn FrameComparator>,
        writer: Box<dyn SlideWriter>,
    ) -> Self {
        Self {
            timeline,
            comparator,
            writer,
        }
    }

    pub fn timeline(&self) -> &Timeline<S> {
        &self.timeline
    }

    /// Run a full detection pass and collect the slides.
    ///
    /// After the pass the reader head is reset to 0, so running the same
    /// extractor again yields identical output at the cost of a full
    /// re-decode.
    pub fn detect_slides(&mut self, progress: &mut dyn ProgressSink) -> EngineResult<Vec<Slide>> {
        let Self {
            timeline,
            comparator,
            writer,
        } = self;
        let namer = TimestampNamer::new(timeline.fps());
        progress.begin(timeline.len());

        let mut slides = Vec::new();
        let detector = TransitionDetector::new(timeline, comparator.as_ref());
        for event in detector {
            let TransitionEvent { position, kind } = event?;
            progress.update(position);
            if let EventKind::Transition(frame) = kind {
                writer.write(&frame, position)?;
                slides.push(Slide {
                    label: namer.label_at(position),
                    position,
                    frame,
                });
            }
        }

        progress.finish();
        info!(slides = slides.len(), "detection pass complete");
        timeline.seek(0)?;
        Ok(slides)
    }

    /// Lazy variant of [`detect_slides`](SlideExtractor::detect_slides):
    /// slides come out one at a time as the detection pass advances.
    ///
    /// The returned iterator is non-restartable and does not reset the
    /// reader head when it ends.
    pub fn slides(&mut self) -> SlideIter<'_, S> {
        let Self {
            timeline,
            comparator,
            writer,
        } = self;
        SlideIter {
            namer: TimestampNamer::new(timeline.fps()),
            detector: TransitionDetector::new(timeline, comparator.as_ref()),
            writer: writer.as_mut(),
        }
    }
}

/// Lazy stream of slides over a running detection pass.
pub struct SlideIter<'a, S: FrameSource> {
    detector: TransitionDetector<'a, S>,
    writer: &'a mut dyn SlideWriter,
    namer: TimestampNamer,
}

impl<'a, S: FrameSource> Iterator for SlideIter<'a, S> {
    type Item = EngineResult<Slide>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let event = match self.detector.next()? {
                Ok(event) => event,
                Err(e) => return Some(Err(e)),
            };
            if let EventKind::Transition(frame) = event.kind {
                if let Err(e) = self.writer.write(&frame, event.position) {
                    return Some(Err(e));
                }
                return Some(Ok(Slide {
                    label: self.namer.label_at(event.position),
                    position: event.position,
                    frame,
                }));
            }
        }
    }
}

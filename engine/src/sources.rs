use crate::error::EngineResult;
use crate::slides::{Slide, SlideExtractor};
use crate::timeline::FrameSource;

/// Length reported by live sources, whose true size is unknowable before
/// the pass completes. Used only for progress estimation.
pub const LIVE_LEN_SENTINEL: u64 = 10_000_000_000;

/// Polymorphic provider of slide content for downstream stages.
///
/// `contents` yields a lazy, finite, non-restartable sequence — calling it
/// a second time produces nothing. `len` is only ever used for progress
/// estimation and may be a sentinel.
pub trait SlideSource {
    fn len(&self) -> u64;
    fn contents(&mut self) -> Box<dyn Iterator<Item = EngineResult<Slide>> + '_>;
}

/// Pre-materialized slide list.
pub struct ListSource {
    len: u64,
    slides: Option<Vec<Slide>>,
}

impl ListSource {
    pub fn new(slides: Vec<Slide>) -> Self {
        Self {
            len: slides.len() as u64,
            slides: Some(slides),
        }
    }
}

impl SlideSource for ListSource {
    fn len(&self) -> u64 {
        self.len
    }

    fn contents(&mut self) -> Box<dyn Iterator<Item = EngineResult<Slide>> + '_> {
        match self.slides.take() {
            Some(slides) => Box::new(slides.into_iter().map(Ok)),
            None => Box::new(std::iter::empty()),
        }
    }
}

/// Live wrapper around a running extraction pass.
pub struct ExtractorSource<S: FrameSource> {
    extractor: SlideExtractor<S>,
    started: bool,
}

impl<S: FrameSource> ExtractorSource<S> {
    pub fn new(extractor: SlideExtractor<S>) -> Self {
        Self {
            extractor,
            started: false,
        }
    }
}

impl<S: FrameSource> SlideSource for ExtractorSource<S> {
    fn len(&self) -> u64 {
        LIVE_LEN_SENTINEL
    }

    fn contents(&mut self) -> Box<dyn Iterator<Item = EngineResult<Slide>> + '_> {
        if self.started {
            return Box::new(std::iter::empty());
        }
        self.started = true;
        Box::new(self.extractor.slides())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::AbsDiffComparator;
    use crate::output::writer::NullWriter;
    use crate::testsupport::MemoryStream;
    use crate::timeline::Timeline;
    use slide_sift_common::frame::Frame;

    fn slide(position: u64) -> Slide {
        Slide {
            label: format!("{position}"),
            position,
            frame: Frame::solid(2, 2, [0, 0, 0]),
        }
    }

    #[test]
    fn list_source_reports_its_size() {
        let source = ListSource::new(vec![slide(0), slide(3)]);
        assert_eq!(source.len(), 2);
    }

    #[test]
    fn list_source_is_not_restartable() {
        let mut source = ListSource::new(vec![slide(0), slide(3)]);
        let first: Vec<_> = source.contents().collect();
        assert_eq!(first.len(), 2);
        assert_eq!(source.contents().count(), 0);
        // The length keeps reporting the original size for progress use.
        assert_eq!(source.len(), 2);
    }

    #[test]
    fn extractor_source_reports_the_sentinel() {
        let extractor = SlideExtractor::new(
            Timeline::new(MemoryStream::new(&[[0, 0, 0]; 3], 30.0), 1),
            Box::new(AbsDiffComparator::new(1.0)),
            Box::new(NullWriter),
        );
        let source = ExtractorSource::new(extractor);
        assert_eq!(source.len(), LIVE_LEN_SENTINEL);
    }

    #[test]
    fn extractor_source_yields_detected_slides_once() {
        let extractor = SlideExtractor::new(
            Timeline::new(
                MemoryStream::new(&[[0, 0, 0], [0, 0, 0], [255, 255, 255], [255, 255, 255]], 30.0),
                1,
            ),
            Box::new(AbsDiffComparator::new(1.0)),
            Box::new(NullWriter),
        );
        let mut source = ExtractorSource::new(extractor);
        let slides: Vec<Slide> = source.contents().collect::<EngineResult<_>>().unwrap();
        assert_eq!(slides.len(), 2);
        assert_eq!(slides[0].position, 0);
        assert_eq!(slides[1].position, 2);
        assert_eq!(source.contents().count(), 0);
    }
}

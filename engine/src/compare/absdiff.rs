use image::imageops::FilterType;
use slide_sift_common::frame::Frame;
use tracing::debug;

use crate::error::{EngineError, EngineResult};

use super::traits::FrameComparator;

const DOWNSAMPLE_SIZE: u32 = 64;

/// Mean-absolute-difference comparator.
///
/// Downsamples both frames to a common 64x64 grayscale grid and scores
/// similarity as `1 - mean(|a - b|) / 255`, so identical frames score 1.0
/// and full black against full white scores 0.0.
pub struct AbsDiffComparator {
    threshold: f64,
}

impl AbsDiffComparator {
    /// `threshold` in (0, 1].
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    fn downsample(frame: &Frame) -> image::GrayImage {
        image::imageops::resize(
            &frame.to_luma(),
            DOWNSAMPLE_SIZE,
            DOWNSAMPLE_SIZE,
            FilterType::Nearest,
        )
    }
}

impl FrameComparator for AbsDiffComparator {
    fn are_same(&self, a: &Frame, b: &Frame) -> EngineResult<bool> {
        if a.is_empty() || b.is_empty() {
            return Err(EngineError::ComparatorInput);
        }

        let ga = Self::downsample(a);
        let gb = Self::downsample(b);
        let total = ga.pixels().len() as f64;
        let sum: u64 = ga
            .pixels()
            .zip(gb.pixels())
            .map(|(pa, pb)| (pa.0[0] as i32 - pb.0[0] as i32).unsigned_abs() as u64)
            .sum();

        let score = 1.0 - (sum as f64 / total) / 255.0;
        let same = score >= self.threshold;
        debug!(
            score = format!("{:.4}", score),
            threshold = format!("{:.4}", self.threshold),
            same,
            "absdiff comparison"
        );
        Ok(same)
    }

    fn name(&self) -> &str {
        "absdiff"
    }
}

use image::imageops::FilterType;
use slide_sift_common::frame::Frame;
use tracing::debug;

use crate::error::{EngineError, EngineResult};

use super::traits::FrameComparator;

const NUM_BINS: usize = 64;
const DOWNSAMPLE_SIZE: u32 = 64;

/// Histogram-correlation comparator — the reference similarity strategy.
///
/// Downsamples each frame to 64x64 grayscale, computes a 64-bin normalized
/// histogram, then scores similarity as the Pearson correlation between the
/// two histograms. Identical frames score 1.0; the frames count as the same
/// content iff the score reaches the threshold.
pub struct HistogramComparator {
    threshold: f64,
}

impl HistogramComparator {
    /// `threshold` in (0, 1].
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    fn compute_histogram(frame: &Frame) -> [f64; NUM_BINS] {
        let gray = image::imageops::resize(
            &frame.to_luma(),
            DOWNSAMPLE_SIZE,
            DOWNSAMPLE_SIZE,
            FilterType::Nearest,
        );

        let mut bins = [0u64; NUM_BINS];
        let total_pixels = gray.pixels().len() as f64;
        for pixel in gray.pixels() {
            let bin = (pixel.0[0] as usize * NUM_BINS) / 256;
            bins[bin.min(NUM_BINS - 1)] += 1;
        }

        // Normalize
        let mut hist = [0.0f64; NUM_BINS];
        for (i, &count) in bins.iter().enumerate() {
            hist[i] = count as f64 / total_pixels;
        }
        hist
    }

    /// Pearson correlation between two normalized histograms. Equal
    /// histograms score exactly 1.0, untouched by rounding.
    fn correlation(a: &[f64; NUM_BINS], b: &[f64; NUM_BINS]) -> f64 {
        if a == b {
            return 1.0;
        }
        let n = NUM_BINS as f64;
        let mean_a = a.iter().sum::<f64>() / n;
        let mean_b = b.iter().sum::<f64>() / n;

        let mut cov = 0.0;
        let mut var_a = 0.0;
        let mut var_b = 0.0;
        for i in 0..NUM_BINS {
            let da = a[i] - mean_a;
            let db = b[i] - mean_b;
            cov += da * db;
            var_a += da * da;
            var_b += db * db;
        }

        let denom = (var_a * var_b).sqrt();
        if denom <= f64::EPSILON {
            // A histogram with no variance is perfectly even; equal inputs
            // were already handled, so by shape these are unrelated.
            return 0.0;
        }
        cov / denom
    }
}

impl FrameComparator for HistogramComparator {
    fn are_same(&self, a: &Frame, b: &Frame) -> EngineResult<bool> {
        if a.is_empty() || b.is_empty() {
            return Err(EngineError::ComparatorInput);
        }

        let score = Self::correlation(&Self::compute_histogram(a), &Self::compute_histogram(b));
        let same = score >= self.threshold;
        debug!(
            score = format!("{:.4}", score),
            threshold = format!("{:.4}", self.threshold),
            same,
            "histogram comparison"
        );
        Ok(same)
    }

    fn name(&self) -> &str {
        "histogram"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_frames_match_any_threshold_up_to_one() {
        let frame = Frame::solid(16, 16, [120, 80, 40]);
        for threshold in [0.1, 0.5, 0.95, 1.0] {
            let comparator = HistogramComparator::new(threshold);
            assert!(comparator.are_same(&frame, &frame).unwrap());
        }
    }

    #[test]
    fn opposite_extremes_differ() {
        let comparator = HistogramComparator::new(0.95);
        let black = Frame::solid(16, 16, [0, 0, 0]);
        let white = Frame::solid(16, 16, [255, 255, 255]);
        assert!(!comparator.are_same(&black, &white).unwrap());
    }

    #[test]
    fn different_sizes_still_compare() {
        let comparator = HistogramComparator::new(0.95);
        let small = Frame::solid(8, 8, [50, 50, 50]);
        let large = Frame::solid(64, 32, [50, 50, 50]);
        assert!(comparator.are_same(&small, &large).unwrap());
    }

    #[test]
    fn empty_frame_is_rejected() {
        let comparator = HistogramComparator::new(0.95);
        let empty = Frame::new(image::RgbImage::new(0, 0));
        let real = Frame::solid(8, 8, [0, 0, 0]);
        assert!(matches!(
            comparator.are_same(&empty, &real),
            Err(EngineError::ComparatorInput)
        ));
        assert!(matches!(
            comparator.are_same(&real, &empty),
            Err(EngineError::ComparatorInput)
        ));
    }
}

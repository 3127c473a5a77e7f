use slide_sift_common::frame::Frame;

use crate::error::EngineResult;

/// Capability deciding whether two frames show the same visual content.
///
/// Implementations fix their threshold at construction and hold no state
/// between calls, so the decision is identical whether the inputs are one
/// frame or a full downsample step apart. An empty frame is a caller error
/// and must fail loudly — it must never be silently reported as same or
/// different.
pub trait FrameComparator {
    /// Returns `true` if the two frames represent the same visual content.
    fn are_same(&self, a: &Frame, b: &Frame) -> EngineResult<bool>;

    /// Human-readable name for logging.
    fn name(&self) -> &str {
        "unnamed"
    }
}

use thiserror::Error;

/// Errors produced by the detection engine.
///
/// Two conditions are deliberately *not* errors: an out-of-bounds random
/// access returns an empty result, and end-of-stream ends the event stream
/// normally. Failed mid-stream reads are folded into end-of-stream and never
/// retried.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The video source could not be opened or queried. Fatal; surfaced at
    /// construction only.
    #[error("cannot open or query video source: {0}")]
    StreamUnavailable(String),

    /// Seeking the underlying stream failed.
    #[error("seek to frame {position} failed: {reason}")]
    Seek { position: u64, reason: String },

    /// An empty frame reached a comparator. This is a bug in the driving
    /// loop, not a runtime condition to recover from.
    #[error("frame comparison requires two non-empty frames")]
    ComparatorInput,

    /// Encoding or saving a slide image failed.
    #[error("failed to write slide image: {0}")]
    Image(#[from] image::ImageError),

    /// Filesystem error while preparing or writing output.
    #[error("output path error: {0}")]
    Io(#[from] std::io::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;

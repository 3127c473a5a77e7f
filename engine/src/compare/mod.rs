//! Frame similarity capabilities.

pub mod absdiff;
pub mod histogram;
pub mod traits;

pub use absdiff::AbsDiffComparator;
pub use histogram::HistogramComparator;
pub use traits::FrameComparator;

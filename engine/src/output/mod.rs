//! Slide naming and persistence.

pub mod naming;
pub mod writer;

pub use naming::TimestampNamer;
pub use writer::{NullWriter, SlideWriter, TimestampImageWriter};

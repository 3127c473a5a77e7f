use chrono::TimeDelta;

/// Derives timestamp names for slide positions from the video frame rate.
#[derive(Debug, Clone)]
pub struct TimestampNamer {
    fps: f64,
}

impl TimestampNamer {
    /// Non-positive rates fall back to 1 fps so naming stays total,
    /// consistent with the timeline's own fallback.
    pub fn new(fps: f64) -> Self {
        Self {
            fps: if fps <= 0.0 { 1.0 } else { fps },
        }
    }

    fn offset(&self, position: u64) -> TimeDelta {
        let millis = (position as f64 / self.fps * 1000.0).round() as i64;
        TimeDelta::milliseconds(millis)
    }

    /// Human-readable timestamp label, e.g. "00:04:37.500".
    pub fn label_at(&self, position: u64) -> String {
        let off = self.offset(position);
        format!(
            "{:02}:{:02}:{:02}.{:03}",
            off.num_hours(),
            off.num_minutes() % 60,
            off.num_seconds() % 60,
            off.num_milliseconds() % 1000,
        )
    }

    /// Filesystem-safe stem for image files, e.g. "00-04-37_500".
    pub fn file_stem_at(&self, position: u64) -> String {
        let off = self.offset(position);
        format!(
            "{:02}-{:02}-{:02}_{:03}",
            off.num_hours(),
            off.num_minutes() % 60,
            off.num_seconds() % 60,
            off.num_milliseconds() % 1000,
        )
    }
}

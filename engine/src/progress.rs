/// Progress-reporting capability for a detection pass.
///
/// `begin` receives the total frame count (or a live source's sentinel
/// length, which is only ever an estimate), `update` the position of each
/// detector event.
pub trait ProgressSink {
    fn begin(&mut self, total: u64);
    fn update(&mut self, position: u64);
    fn finish(&mut self);
}

/// Ignores all notifications.
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn begin(&mut self, _total: u64) {}
    fn update(&mut self, _position: u64) {}
    fn finish(&mut self) {}
}

/// Receives incremental progress from a pipeline run.
///
/// The core never renders anything itself; the CLI supplies a terminal sink.
pub trait ProgressSink: Send + Sync {
    /// Fraction of candidates finished, in `0.0..=1.0`.
    fn on_progress(&self, fraction: f64);

    /// Human-readable status line (quota notices, ETA, per-candidate outcome).
    fn on_status(&self, text: &str);
}

/// Sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn on_progress(&self, _fraction: f64) {}

    fn on_status(&self, _text: &str) {}
}

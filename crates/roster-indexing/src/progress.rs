//! Build progress reporting.

use tracing::info;

/// Progress of a running build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildProgress {
    /// Records in the build.
    pub total: usize,
    /// Records embedded so far.
    pub embedded: usize,
}

impl BuildProgress {
    pub fn new(total: usize) -> Self {
        Self { total, embedded: 0 }
    }

    /// Record one finished embedding.
    pub fn record_embedded(&mut self) {
        self.embedded += 1;
    }

    pub fn is_complete(&self) -> bool {
        self.embedded == self.total
    }
}

/// Receives progress updates during a build.
pub trait ProgressCallback: Send + Sync {
    /// Called after each record is embedded.
    fn on_progress(&self, progress: &BuildProgress);
}

/// A no-op progress callback for when progress reporting isn't needed.
pub struct NoOpProgressCallback;

impl ProgressCallback for NoOpProgressCallback {
    fn on_progress(&self, _progress: &BuildProgress) {}
}

/// Logs progress at info level every `interval` records and on completion.
pub struct LoggingProgressCallback {
    interval: usize,
}

impl LoggingProgressCallback {
    pub fn new(interval: usize) -> Self {
        Self {
            interval: interval.max(1),
        }
    }
}

impl ProgressCallback for LoggingProgressCallback {
    fn on_progress(&self, progress: &BuildProgress) {
        if progress.embedded % self.interval == 0 || progress.is_complete() {
            info!(
                embedded = progress.embedded,
                total = progress.total,
                "Build progress"
            );
        }
    }
}

use tracing::info;

/// Per-run tally returned by every batch job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl BatchReport {
    pub fn log(&self, job: &str) {
        info!(
            "{job} finished: {} processed, {} skipped, {} failed",
            self.processed, self.skipped, self.failed
        );
    }
}

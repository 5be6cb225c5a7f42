use crate::session::file_job::JobId;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cooperative cancellation flag, checked between jobs only.
///
/// Clones share the flag, so it can be raised from another thread or from an observer callback.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub(crate) fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Aggregate progress of a running batch.
#[derive(Clone, Debug, PartialEq)]
pub struct BatchProgress {
    pub processed: usize,
    pub total: usize,
    pub current_file: Option<String>,
    /// `processed / total`, in `[0, 1]` and never decreasing within a batch.
    pub fraction: f32,
}

/// End-of-batch report.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub completed: usize,
    pub failed: usize,
    /// Jobs that actually ran; jobs skipped by cancellation are not counted.
    pub processed: usize,
    pub total: usize,
    pub cancelled: bool,
}

/// Transient bookkeeping of one queue pass.
#[derive(Debug)]
pub(crate) struct BatchRun {
    processed: usize,
    total: usize,
    current: Option<JobId>,
    pub(crate) cancel_requested: bool,
}

impl BatchRun {
    pub(crate) fn new(total: usize) -> Self {
        Self {
            processed: 0,
            total,
            current: None,
            cancel_requested: false,
        }
    }

    pub(crate) fn start(&mut self, id: JobId) {
        self.current = Some(id);
    }

    pub(crate) fn finish(&mut self) {
        self.current = None;
        self.processed = (self.processed + 1).min(self.total);
    }

    pub(crate) fn current(&self) -> Option<JobId> {
        self.current
    }

    pub(crate) fn processed(&self) -> usize {
        self.processed
    }

    pub(crate) fn total(&self) -> usize {
        self.total
    }

    pub(crate) fn progress(&self, current_file: Option<String>) -> BatchProgress {
        let fraction = if self.total == 0 {
            0.0
        } else {
            self.processed as f32 / self.total as f32
        };
        BatchProgress {
            processed: self.processed,
            total: self.total,
            current_file,
            fraction,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/progress.rs"]
mod tests;

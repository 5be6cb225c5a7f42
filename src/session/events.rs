use crate::session::file_job::{JobId, JobStatus};
use crate::session::progress::{BatchProgress, BatchSummary};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, mpsc};

/// State changes published by the orchestrator, always from the thread that drives it.
#[derive(Clone, Debug, PartialEq)]
pub enum BatchEvent {
    JobStateChanged { id: JobId, status: JobStatus },
    Progress(BatchProgress),
    /// Immediate, user-facing failure report of a single-file render.
    Alert {
        id: JobId,
        file_name: String,
        message: String,
    },
    /// Export of a completed job failed; the job stays completed.
    ExportFailed {
        id: JobId,
        path: PathBuf,
        message: String,
    },
    BatchFinished(BatchSummary),
}

pub trait BatchObserver {
    fn on_event(&mut self, event: &BatchEvent);
}

/// Discards every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl BatchObserver for NoopObserver {
    fn on_event(&mut self, _event: &BatchEvent) {}
}

/// Keeps events in a shared buffer; clones observe the same buffer.
#[derive(Clone, Debug, Default)]
pub struct RecordingObserver {
    events: Arc<Mutex<Vec<BatchEvent>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<BatchEvent> {
        match self.events.lock() {
            Ok(v) => v.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Status sequence reported for one job.
    pub fn statuses(&self, id: JobId) -> Vec<JobStatus> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                BatchEvent::JobStateChanged { id: j, status } if j == id => Some(status),
                _ => None,
            })
            .collect()
    }

    /// Progress fractions in publication order.
    pub fn fractions(&self) -> Vec<f32> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                BatchEvent::Progress(p) => Some(p.fraction),
                _ => None,
            })
            .collect()
    }
}

impl BatchObserver for RecordingObserver {
    fn on_event(&mut self, event: &BatchEvent) {
        match self.events.lock() {
            Ok(mut v) => v.push(event.clone()),
            Err(poisoned) => poisoned.into_inner().push(event.clone()),
        }
    }
}

/// Forwards events into a channel, for front-ends that consume them elsewhere.
#[derive(Clone, Debug)]
pub struct ChannelObserver {
    tx: mpsc::Sender<BatchEvent>,
}

impl ChannelObserver {
    pub fn new(tx: mpsc::Sender<BatchEvent>) -> Self {
        Self { tx }
    }
}

impl BatchObserver for ChannelObserver {
    fn on_event(&mut self, event: &BatchEvent) {
        // A closed receiver only means nobody is listening any more.
        let _ = self.tx.send(event.clone());
    }
}

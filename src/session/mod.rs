//! Per-file jobs and the batch orchestrator that drives them.

pub mod events;
pub mod file_job;
pub mod orchestrator;
pub mod progress;
pub mod render_job;
pub mod worker;

pub use events::{BatchEvent, BatchObserver, ChannelObserver, NoopObserver, RecordingObserver};
pub use file_job::{FileJob, JobId, JobState, JobStatus};
pub use orchestrator::{BatchOpts, BatchOrchestrator};
pub use progress::{BatchProgress, BatchSummary, CancelToken};
pub use render_job::RenderJob;
pub use worker::{TaskHandle, spawn_task};

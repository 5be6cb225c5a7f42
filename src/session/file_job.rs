use crate::foundation::error::{ScenepixError, ScenepixResult};
use crate::render::RenderedImage;
use crate::scene::load::AssetRef;
use std::sync::Arc;

/// Stable identity of a queued file, independent of its path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobId(pub(crate) u64);

impl JobId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle of a queued file. The image exists only when completed, the error only when failed.
#[derive(Clone, Debug, PartialEq)]
pub enum JobState {
    Pending,
    Processing,
    Completed(Arc<RenderedImage>),
    Failed(String),
}

/// Payload-free view of [`JobState`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobState {
    pub fn status(&self) -> JobStatus {
        match self {
            Self::Pending => JobStatus::Pending,
            Self::Processing => JobStatus::Processing,
            Self::Completed(_) => JobStatus::Completed,
            Self::Failed(_) => JobStatus::Failed,
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        })
    }
}

/// One entry of the batch queue. Only the orchestrator mutates it.
#[derive(Clone, Debug)]
pub struct FileJob {
    id: JobId,
    asset: AssetRef,
    state: JobState,
}

impl FileJob {
    pub(crate) fn new(id: JobId, asset: AssetRef) -> Self {
        Self {
            id,
            asset,
            state: JobState::Pending,
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn asset(&self) -> &AssetRef {
        &self.asset
    }

    /// File name for display, including the extension.
    pub fn file_name(&self) -> String {
        self.asset
            .path()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.asset.to_string())
    }

    pub fn state(&self) -> &JobState {
        &self.state
    }

    pub fn status(&self) -> JobStatus {
        self.state.status()
    }

    pub fn image(&self) -> Option<&Arc<RenderedImage>> {
        match &self.state {
            JobState::Completed(img) => Some(img),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            JobState::Failed(msg) => Some(msg),
            _ => None,
        }
    }

    /// Enter `Processing`. Terminal jobs re-enter directly, without passing through `Pending`.
    pub(crate) fn begin(&mut self) -> ScenepixResult<()> {
        if self.state == JobState::Processing {
            return Err(ScenepixError::validation(format!(
                "job {} is already processing",
                self.id
            )));
        }
        self.state = JobState::Processing;
        Ok(())
    }

    pub(crate) fn complete(&mut self, image: Arc<RenderedImage>) -> ScenepixResult<()> {
        self.expect_processing("complete")?;
        self.state = JobState::Completed(image);
        Ok(())
    }

    pub(crate) fn fail(&mut self, message: impl Into<String>) -> ScenepixResult<()> {
        self.expect_processing("fail")?;
        self.state = JobState::Failed(message.into());
        Ok(())
    }

    /// Return a processing job to `Pending`. Cancellation is a deferral, not a failure.
    /// Returns whether the state changed.
    pub(crate) fn defer(&mut self) -> bool {
        if self.state == JobState::Processing {
            self.state = JobState::Pending;
            true
        } else {
            false
        }
    }

    fn expect_processing(&self, op: &str) -> ScenepixResult<()> {
        if self.state != JobState::Processing {
            return Err(ScenepixError::validation(format!(
                "cannot {op} job {} in state {}",
                self.id,
                self.status()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/file_job.rs"]
mod tests;

use crate::config::{ExportConfig, RenderConfig};
use crate::encode::{FileExporter, ImageExporter};
use crate::foundation::error::{ScenepixError, ScenepixResult};
use crate::render::{BackendKind, RenderedImage};
use crate::scene::load::{AssetRef, FileSceneLoader, SceneLoader, is_supported_asset};
use crate::session::events::{BatchEvent, BatchObserver, NoopObserver};
use crate::session::file_job::{FileJob, JobId, JobState, JobStatus};
use crate::session::progress::{BatchRun, BatchSummary, CancelToken};
use crate::session::render_job::RenderJob;
use crate::session::worker::{TaskHandle, spawn_task};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Options fixed for the lifetime of an orchestrator.
#[derive(Clone, Debug, Default)]
pub struct BatchOpts {
    /// Seed of the per-job seed stream. `None` seeds from OS entropy.
    pub seed: Option<u64>,
    /// Give up on a render (and on an export) after this long. `None` waits indefinitely.
    pub job_timeout: Option<Duration>,
    pub backend: BackendKind,
}

/// Worker a running batch is waiting on.
#[derive(Debug)]
enum InFlight {
    Render {
        id: JobId,
        handle: TaskHandle<RenderedImage>,
    },
    Export {
        id: JobId,
        path: PathBuf,
        handle: TaskHandle<()>,
    },
}

#[derive(Debug)]
struct ActiveBatch {
    destination: PathBuf,
    queue: VecDeque<JobId>,
    run: BatchRun,
    completed: usize,
    failed: usize,
    in_flight: Option<InFlight>,
}

/// Owns the file queue and every job's state.
///
/// All mutation happens on the thread that calls into the orchestrator; rendering and exporting
/// run on background workers. A batch can be driven to completion with
/// [`BatchOrchestrator::run_batch`], or stepped with [`BatchOrchestrator::start_batch`] and
/// [`BatchOrchestrator::poll`] so the owning thread stays free while a worker runs.
/// Jobs run strictly one at a time, in insertion order.
pub struct BatchOrchestrator {
    jobs: Vec<FileJob>,
    next_id: u64,
    current: Option<JobId>,
    render_config: RenderConfig,
    export_config: ExportConfig,
    opts: BatchOpts,
    rng: StdRng,
    loader: Arc<dyn SceneLoader>,
    exporter: Arc<dyn ImageExporter>,
    observer: Box<dyn BatchObserver>,
    cancel: CancelToken,
    active: Option<ActiveBatch>,
}

impl std::fmt::Debug for BatchOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchOrchestrator")
            .field("jobs", &self.jobs.len())
            .field("current", &self.current)
            .field("render_config", &self.render_config)
            .field("export_config", &self.export_config)
            .field("opts", &self.opts)
            .field("batch_running", &self.active.is_some())
            .finish_non_exhaustive()
    }
}

impl BatchOrchestrator {
    pub fn new(
        render_config: RenderConfig,
        export_config: ExportConfig,
        opts: BatchOpts,
    ) -> ScenepixResult<Self> {
        render_config.validate()?;
        export_config.validate()?;
        let rng = match opts.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            jobs: Vec::new(),
            next_id: 1,
            current: None,
            render_config,
            export_config,
            opts,
            rng,
            loader: Arc::new(FileSceneLoader),
            exporter: Arc::new(FileExporter),
            observer: Box::new(NoopObserver),
            cancel: CancelToken::new(),
            active: None,
        })
    }

    pub fn with_loader(mut self, loader: Arc<dyn SceneLoader>) -> Self {
        self.loader = loader;
        self
    }

    pub fn with_exporter(mut self, exporter: Arc<dyn ImageExporter>) -> Self {
        self.exporter = exporter;
        self
    }

    pub fn with_observer(mut self, observer: impl BatchObserver + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    // ---- queue ----

    /// Queue every supported file, in order. Returns the ids of the new jobs.
    pub fn add_files<I, P>(&mut self, paths: I) -> Vec<JobId>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut added = Vec::new();
        for path in paths {
            let path = path.into();
            if !is_supported_asset(&path) {
                tracing::debug!(path = %path.display(), "skipping unsupported file");
                continue;
            }
            let id = JobId(self.next_id);
            self.next_id += 1;
            self.jobs.push(FileJob::new(id, AssetRef::new(path)));
            added.push(id);
        }
        if self.current.is_none() {
            self.current = self.jobs.first().map(FileJob::id);
        }
        added
    }

    /// [`BatchOrchestrator::add_files`], then render right away when exactly one file was added.
    /// The render's outcome lands in the job's state, as with [`BatchOrchestrator::process_single`].
    pub fn import_files<I, P>(&mut self, paths: I) -> ScenepixResult<Vec<JobId>>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.ensure_idle()?;
        let added = self.add_files(paths);
        if let [only] = added.as_slice() {
            self.current = Some(*only);
            self.process_single(*only)?;
        }
        Ok(added)
    }

    pub fn jobs(&self) -> &[FileJob] {
        &self.jobs
    }

    pub fn job(&self, id: JobId) -> Option<&FileJob> {
        self.jobs.iter().find(|j| j.id() == id)
    }

    pub fn current(&self) -> Option<JobId> {
        self.current
    }

    pub fn current_job(&self) -> Option<&FileJob> {
        self.current.and_then(|id| self.job(id))
    }

    pub fn select(&mut self, id: JobId) -> ScenepixResult<()> {
        self.index_of(id)?;
        self.current = Some(id);
        Ok(())
    }

    /// Drop a job. Removing the selected job selects the first remaining one.
    pub fn remove(&mut self, id: JobId) -> ScenepixResult<FileJob> {
        self.ensure_idle()?;
        let idx = self.index_of(id)?;
        let job = self.jobs.remove(idx);
        if self.current == Some(id) {
            self.current = self.jobs.first().map(FileJob::id);
        }
        Ok(job)
    }

    pub fn clear(&mut self) -> ScenepixResult<()> {
        self.ensure_idle()?;
        self.jobs.clear();
        self.current = None;
        Ok(())
    }

    /// `(completed, total)`.
    pub fn processing_stats(&self) -> (usize, usize) {
        let completed = self
            .jobs
            .iter()
            .filter(|j| j.status() == JobStatus::Completed)
            .count();
        (completed, self.jobs.len())
    }

    // ---- configuration ----

    pub fn render_config(&self) -> &RenderConfig {
        &self.render_config
    }

    pub fn export_config(&self) -> &ExportConfig {
        &self.export_config
    }

    /// Replace the render configuration. A completed current job is re-rendered with it, and its
    /// new status is returned. While a batch runs the new configuration only applies to jobs
    /// that have not started yet.
    pub fn update_config(&mut self, config: RenderConfig) -> ScenepixResult<Option<JobStatus>> {
        config.validate()?;
        self.render_config = config;
        if self.active.is_some() {
            return Ok(None);
        }
        let rerender = self
            .current_job()
            .filter(|j| j.status() == JobStatus::Completed)
            .map(FileJob::id);
        match rerender {
            Some(id) => self.process_single(id).map(Some),
            None => Ok(None),
        }
    }

    pub fn set_export_config(&mut self, config: ExportConfig) -> ScenepixResult<()> {
        config.validate()?;
        self.export_config = config;
        Ok(())
    }

    // ---- rendering ----

    /// Render one job now. Failures end up in the job's state and raise an alert; only an
    /// unknown id is an error.
    pub fn process_single(&mut self, id: JobId) -> ScenepixResult<JobStatus> {
        self.ensure_idle()?;
        let status = self.execute(id)?;
        if status == JobStatus::Failed {
            let idx = self.index_of(id)?;
            let job = &self.jobs[idx];
            let event = BatchEvent::Alert {
                id,
                file_name: job.file_name(),
                message: job.error().unwrap_or_default().to_string(),
            };
            self.emit(event);
        }
        Ok(status)
    }

    /// Encode and write a completed job's image to `path`.
    pub fn export_single(&mut self, id: JobId, path: impl AsRef<Path>) -> ScenepixResult<()> {
        let idx = self.index_of(id)?;
        let image = self.jobs[idx].image().cloned().ok_or_else(|| {
            ScenepixError::validation(format!(
                "job {id} has no image to export (state {})",
                self.jobs[idx].status()
            ))
        })?;
        self.export_image(image, path.as_ref().to_path_buf())
    }

    /// Token whose cancellation stops the running batch before its next job.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Stop the running batch before its next job. The job in flight still finishes. A batch
    /// started afterwards is unaffected.
    pub fn cancel_batch(&self) {
        self.cancel.cancel();
    }

    /// Stop the running batch now. The job in flight is returned to `Pending` and its worker is
    /// detached; its result is discarded. Returns `None` when no batch is running.
    pub fn abort_batch(&mut self) -> Option<BatchSummary> {
        let batch = self.active.as_mut()?;
        batch.in_flight = None;
        batch.run.cancel_requested = true;
        let deferred: Vec<JobId> = self
            .jobs
            .iter_mut()
            .filter_map(|j| j.defer().then_some(j.id()))
            .collect();
        for id in deferred {
            tracing::info!(job = %id, "job returned to pending");
            self.emit_status(id, JobStatus::Pending);
        }
        Some(self.finish_batch())
    }

    pub fn is_batch_running(&self) -> bool {
        self.active.is_some()
    }

    /// Render every queued job in insertion order, exporting each success into `destination`.
    ///
    /// Cancellation is honored only between jobs. Export failures are reported but never change
    /// a job's state or stop the batch.
    #[tracing::instrument(skip(self), fields(destination = %destination.display()))]
    pub fn run_batch(&mut self, destination: &Path) -> ScenepixResult<BatchSummary> {
        self.start_batch(destination)?;
        loop {
            if let Some(summary) = self.advance(true)? {
                return Ok(summary);
            }
        }
    }

    /// Queue a batch over the current jobs without waiting on any worker. Drive it with
    /// [`BatchOrchestrator::poll`].
    pub fn start_batch(&mut self, destination: &Path) -> ScenepixResult<()> {
        self.ensure_idle()?;
        if self.jobs.is_empty() {
            return Err(ScenepixError::validation("batch queue is empty"));
        }
        if destination.is_file() {
            return Err(ScenepixError::validation(format!(
                "batch destination '{}' is a file, expected a directory",
                destination.display()
            )));
        }

        self.cancel.reset();
        let queue: VecDeque<JobId> = self.jobs.iter().map(FileJob::id).collect();
        let run = BatchRun::new(queue.len());
        tracing::info!(jobs = queue.len(), destination = %destination.display(), "batch started");
        let progress = run.progress(None);
        self.active = Some(ActiveBatch {
            destination: destination.to_path_buf(),
            queue,
            run,
            completed: 0,
            failed: 0,
            in_flight: None,
        });
        self.emit(BatchEvent::Progress(progress));
        Ok(())
    }

    /// Advance the running batch as far as possible without blocking. Returns the summary once
    /// the batch has finished, `None` while a render or export is still in flight.
    pub fn poll(&mut self) -> ScenepixResult<Option<BatchSummary>> {
        self.advance(false)
    }

    // ---- internals ----

    fn ensure_idle(&self) -> ScenepixResult<()> {
        if self.active.is_some() {
            return Err(ScenepixError::validation("a batch is running"));
        }
        Ok(())
    }

    fn advance(&mut self, block: bool) -> ScenepixResult<Option<BatchSummary>> {
        let timeout = self.opts.job_timeout;
        loop {
            let Some(batch) = self.active.as_mut() else {
                return Err(ScenepixError::validation("no batch is running"));
            };
            match batch.in_flight.take() {
                Some(InFlight::Render { id, handle }) => match handle.poll(timeout, block) {
                    Ok(outcome) => self.finish_render(id, outcome)?,
                    Err(handle) => {
                        batch.in_flight = Some(InFlight::Render { id, handle });
                        return Ok(None);
                    }
                },
                Some(InFlight::Export { id, path, handle }) => match handle.poll(timeout, block) {
                    Ok(outcome) => {
                        if let Err(e) = outcome {
                            self.report_export_failure(id, path, &e);
                        }
                        self.finish_job();
                    }
                    Err(handle) => {
                        batch.in_flight = Some(InFlight::Export { id, path, handle });
                        return Ok(None);
                    }
                },
                None => {
                    if self.cancel.is_cancelled() {
                        batch.run.cancel_requested = true;
                        return Ok(Some(self.finish_batch()));
                    }
                    let Some(id) = batch.queue.pop_front() else {
                        return Ok(Some(self.finish_batch()));
                    };
                    self.start_job(id)?;
                }
            }
        }
    }

    /// Begin the next batch job and put its render in flight.
    fn start_job(&mut self, id: JobId) -> ScenepixResult<()> {
        let job = self.begin_job(id)?;
        let name = self.job(id).map(FileJob::file_name).unwrap_or_default();
        if let Some(batch) = self.active.as_mut() {
            batch.run.start(id);
            let progress = batch.run.progress(Some(name));
            self.emit(BatchEvent::Progress(progress));
        }
        match job.spawn() {
            Ok(handle) => {
                if let Some(batch) = self.active.as_mut() {
                    batch.in_flight = Some(InFlight::Render { id, handle });
                }
                Ok(())
            }
            Err(e) => self.finish_render(id, Err(e)),
        }
    }

    fn finish_render(
        &mut self,
        id: JobId,
        outcome: ScenepixResult<RenderedImage>,
    ) -> ScenepixResult<()> {
        let status = self.settle(id, outcome)?;
        if let Some(batch) = self.active.as_mut() {
            match status {
                JobStatus::Completed => batch.completed += 1,
                JobStatus::Failed => batch.failed += 1,
                _ => {}
            }
        }
        if status == JobStatus::Completed
            && let Some((path, handle)) = self.spawn_batch_export(id)
        {
            if let Some(batch) = self.active.as_mut() {
                batch.in_flight = Some(InFlight::Export { id, path, handle });
            }
            return Ok(());
        }
        self.finish_job();
        Ok(())
    }

    fn finish_job(&mut self) {
        if let Some(batch) = self.active.as_mut() {
            debug_assert!(batch.run.current().is_some());
            batch.run.finish();
            let progress = batch.run.progress(None);
            self.emit(BatchEvent::Progress(progress));
        }
    }

    fn finish_batch(&mut self) -> BatchSummary {
        let Some(batch) = self.active.take() else {
            return BatchSummary::default();
        };
        let summary = BatchSummary {
            completed: batch.completed,
            failed: batch.failed,
            processed: batch.run.processed(),
            total: batch.run.total(),
            cancelled: batch.run.cancel_requested,
        };
        tracing::info!(
            completed = summary.completed,
            failed = summary.failed,
            total = summary.total,
            cancelled = summary.cancelled,
            "batch finished"
        );
        self.emit(BatchEvent::BatchFinished(summary));
        summary
    }

    fn index_of(&self, id: JobId) -> ScenepixResult<usize> {
        self.jobs
            .iter()
            .position(|j| j.id() == id)
            .ok_or_else(|| ScenepixError::validation(format!("unknown job {id}")))
    }

    fn emit(&mut self, event: BatchEvent) {
        self.observer.on_event(&event);
    }

    fn emit_status(&mut self, id: JobId, status: JobStatus) {
        self.emit(BatchEvent::JobStateChanged { id, status });
    }

    /// Pending/terminal -> Processing -> Completed | Failed, awaiting the worker in between.
    fn execute(&mut self, id: JobId) -> ScenepixResult<JobStatus> {
        let job = self.begin_job(id)?;
        let outcome = job
            .spawn()
            .and_then(|handle| handle.wait_timeout(self.opts.job_timeout));
        self.settle(id, outcome)
    }

    fn begin_job(&mut self, id: JobId) -> ScenepixResult<RenderJob> {
        let idx = self.index_of(id)?;
        self.jobs[idx].begin()?;
        self.emit_status(id, JobStatus::Processing);
        Ok(RenderJob::new(
            self.jobs[idx].asset().clone(),
            self.render_config.clone(),
            self.rng.next_u64(),
        )
        .with_loader(Arc::clone(&self.loader))
        .with_backend(self.opts.backend))
    }

    fn settle(
        &mut self,
        id: JobId,
        outcome: ScenepixResult<RenderedImage>,
    ) -> ScenepixResult<JobStatus> {
        let idx = self.index_of(id)?;
        let job = &mut self.jobs[idx];
        match outcome {
            Ok(image) => job.complete(Arc::new(image))?,
            Err(e) => {
                tracing::warn!(job = %id, asset = %job.asset(), error = %e, "render failed");
                job.fail(e.to_string())?;
            }
        }
        let status = job.status();
        self.emit_status(id, status);
        Ok(status)
    }

    /// Put the export of a completed batch job in flight. A worker that cannot be spawned is
    /// reported like any other export failure.
    fn spawn_batch_export(&mut self, id: JobId) -> Option<(PathBuf, TaskHandle<()>)> {
        let destination = self.active.as_ref()?.destination.clone();
        let idx = self.index_of(id).ok()?;
        let job = &self.jobs[idx];
        let image = job.image().cloned()?;
        let path = self
            .export_config
            .output_path(&destination, &job.asset().base_name());
        match self.spawn_export(image, path.clone()) {
            Ok(handle) => Some((path, handle)),
            Err(e) => {
                self.report_export_failure(id, path, &e);
                None
            }
        }
    }

    fn report_export_failure(&mut self, id: JobId, path: PathBuf, e: &ScenepixError) {
        tracing::warn!(job = %id, path = %path.display(), error = %e, "export failed");
        self.emit(BatchEvent::ExportFailed {
            id,
            path,
            message: e.to_string(),
        });
    }

    fn spawn_export(
        &self,
        image: Arc<RenderedImage>,
        path: PathBuf,
    ) -> ScenepixResult<TaskHandle<()>> {
        let exporter = Arc::clone(&self.exporter);
        let cfg = self.export_config.clone();
        spawn_task("scenepix-export", move || exporter.export(&image, &path, &cfg))
    }

    fn export_image(&self, image: Arc<RenderedImage>, path: PathBuf) -> ScenepixResult<()> {
        self.spawn_export(image, path)?.wait_timeout(self.opts.job_timeout)
    }

    /// State of a job, for front-ends that only hold an id.
    pub fn state(&self, id: JobId) -> Option<&JobState> {
        self.job(id).map(FileJob::state)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/orchestrator.rs"]
mod tests;

use super::*;
use crate::config::{Antialiasing, ExportFormat};
use crate::encode::InMemoryExporter;
use crate::scene::graph::SceneGraph;
use crate::session::events::RecordingObserver;
use std::time::Instant;

fn small_config() -> RenderConfig {
    RenderConfig {
        image_width: 40,
        image_height: 30,
        antialiasing: Antialiasing::None,
        ..RenderConfig::default()
    }
}

fn seeded() -> BatchOpts {
    BatchOpts {
        seed: Some(11),
        ..BatchOpts::default()
    }
}

fn orchestrator() -> (BatchOrchestrator, Arc<InMemoryExporter>, RecordingObserver) {
    let sink = Arc::new(InMemoryExporter::new());
    let rec = RecordingObserver::new();
    let orch = BatchOrchestrator::new(small_config(), ExportConfig::default(), seeded())
        .unwrap()
        .with_exporter(sink.clone())
        .with_observer(rec.clone());
    (orch, sink, rec)
}

fn data(name: &str) -> PathBuf {
    Path::new("tests/data").join(name)
}

#[test]
fn add_files_filters_and_selects_the_first_job() {
    let (mut orch, _, _) = orchestrator();
    assert_eq!(orch.current(), None);
    let ids = orch.add_files([
        data("cube.obj"),
        PathBuf::from("notes.txt"),
        data("triangle.gltf"),
        PathBuf::from("other/cube.obj"),
    ]);
    assert_eq!(ids.len(), 3);
    assert_eq!(orch.jobs().len(), 3);
    assert_eq!(orch.current(), Some(ids[0]));
    assert_ne!(ids[0], ids[2]);
    assert!(orch.jobs().iter().all(|j| j.status() == JobStatus::Pending));

    let more = orch.add_files([data("two_parts.obj")]);
    assert_eq!(orch.current(), Some(ids[0]));
    assert!(more[0] > ids[2]);
}

#[test]
fn selection_follows_removal_and_clear() {
    let (mut orch, _, _) = orchestrator();
    let ids = orch.add_files([data("cube.obj"), data("two_parts.obj"), data("triangle.gltf")]);
    orch.select(ids[1]).unwrap();
    assert_eq!(orch.current_job().unwrap().file_name(), "two_parts.obj");

    orch.remove(ids[1]).unwrap();
    assert_eq!(orch.current(), Some(ids[0]));
    assert!(orch.remove(ids[1]).is_err());
    assert!(orch.select(ids[1]).is_err());

    orch.remove(ids[2]).unwrap();
    assert_eq!(orch.current(), Some(ids[0]));
    orch.clear().unwrap();
    assert!(orch.jobs().is_empty());
    assert_eq!(orch.current(), None);
}

#[test]
fn process_single_transitions_and_resubmits() {
    let (mut orch, _, rec) = orchestrator();
    let id = orch.add_files([data("cube.obj")])[0];
    assert_eq!(orch.process_single(id).unwrap(), JobStatus::Completed);
    let img = orch.job(id).unwrap().image().unwrap();
    assert_eq!((img.width, img.height), (40, 30));

    assert_eq!(orch.process_single(id).unwrap(), JobStatus::Completed);
    assert_eq!(
        rec.statuses(id),
        vec![
            JobStatus::Processing,
            JobStatus::Completed,
            JobStatus::Processing,
            JobStatus::Completed
        ]
    );
    assert_eq!(orch.processing_stats(), (1, 1));
}

#[test]
fn importing_a_single_file_renders_it_right_away() {
    let (mut orch, _, rec) = orchestrator();
    let ids = orch
        .import_files([data("cube.obj"), PathBuf::from("readme.md")])
        .unwrap();
    assert_eq!(ids.len(), 1);
    assert_eq!(orch.job(ids[0]).unwrap().status(), JobStatus::Completed);
    assert_eq!(orch.current(), Some(ids[0]));

    let several = orch
        .import_files([data("corrupt.obj"), data("two_parts.obj")])
        .unwrap();
    assert!(
        several
            .iter()
            .all(|&id| orch.job(id).unwrap().status() == JobStatus::Pending)
    );
    assert_eq!(orch.current(), Some(ids[0]));

    let broken = orch.import_files([data("corrupt.obj")]).unwrap();
    assert_eq!(orch.job(broken[0]).unwrap().status(), JobStatus::Failed);
    assert_eq!(orch.current(), Some(broken[0]));
    assert!(
        rec.events()
            .iter()
            .any(|e| matches!(e, BatchEvent::Alert { id, .. } if *id == broken[0]))
    );
    assert!(orch.import_files(Vec::<PathBuf>::new()).unwrap().is_empty());
}

#[test]
fn single_file_failure_raises_an_alert() {
    let (mut orch, _, rec) = orchestrator();
    let id = orch.add_files([data("corrupt.obj")])[0];
    assert_eq!(orch.process_single(id).unwrap(), JobStatus::Failed);
    let err = orch.job(id).unwrap().error().unwrap().to_string();
    assert!(err.starts_with("load error:"), "{err}");

    let alerts: Vec<_> = rec
        .events()
        .into_iter()
        .filter_map(|e| match e {
            BatchEvent::Alert {
                id: j,
                file_name,
                message,
            } => Some((j, file_name, message)),
            _ => None,
        })
        .collect();
    assert_eq!(alerts, vec![(id, "corrupt.obj".to_string(), err)]);
    assert!(orch.process_single(JobId(999)).is_err());
}

#[test]
fn config_update_rerenders_the_completed_current_job() {
    let (mut orch, _, _) = orchestrator();
    let id = orch.add_files([data("cube.obj")])[0];
    assert_eq!(orch.update_config(small_config()).unwrap(), None);

    orch.process_single(id).unwrap();
    let bigger = RenderConfig {
        image_width: 64,
        ..small_config()
    };
    assert_eq!(
        orch.update_config(bigger).unwrap(),
        Some(JobStatus::Completed)
    );
    assert_eq!(orch.job(id).unwrap().image().unwrap().width, 64);

    let invalid = RenderConfig {
        rotation_x: 400.0,
        ..small_config()
    };
    assert!(orch.update_config(invalid).is_err());
    assert_eq!(orch.render_config().image_width, 64);
}

#[test]
fn export_single_requires_a_completed_job() {
    let (mut orch, sink, _) = orchestrator();
    let id = orch.add_files([data("cube.obj")])[0];
    let err = orch.export_single(id, "out/cube.png").unwrap_err();
    assert!(err.to_string().starts_with("validation error:"), "{err}");

    orch.process_single(id).unwrap();
    orch.export_single(id, "out/cube.png").unwrap();
    assert_eq!(sink.paths(), vec![PathBuf::from("out/cube.png")]);
}

#[test]
fn batch_exports_every_success_and_reports_progress() {
    let (mut orch, sink, rec) = orchestrator();
    orch.set_export_config(ExportConfig {
        format: ExportFormat::Jpeg,
        quality: 0.8,
        ..ExportConfig::default()
    })
    .unwrap();
    let ids = orch.add_files([data("cube.obj"), data("corrupt.obj"), data("two_parts.obj")]);
    let summary = orch.run_batch(Path::new("renders")).unwrap();

    assert_eq!(
        summary,
        BatchSummary {
            completed: 2,
            failed: 1,
            processed: 3,
            total: 3,
            cancelled: false,
        }
    );
    let statuses: Vec<_> = ids.iter().map(|&id| orch.job(id).unwrap().status()).collect();
    assert_eq!(
        statuses,
        vec![JobStatus::Completed, JobStatus::Failed, JobStatus::Completed]
    );
    assert_eq!(
        sink.paths(),
        vec![
            PathBuf::from("renders/cube.jpg"),
            PathBuf::from("renders/two_parts.jpg")
        ]
    );

    let fractions = rec.fractions();
    assert!(fractions.windows(2).all(|w| w[0] <= w[1]), "{fractions:?}");
    assert_eq!(fractions.first(), Some(&0.0));
    assert_eq!(fractions.last(), Some(&1.0));
    assert!(matches!(
        rec.events().last(),
        Some(BatchEvent::BatchFinished(s)) if *s == summary
    ));
    // Batch failures accumulate silently.
    assert!(
        !rec.events()
            .iter()
            .any(|e| matches!(e, BatchEvent::Alert { .. }))
    );
    for &id in &ids {
        let s = rec.statuses(id);
        assert_eq!(s[0], JobStatus::Processing);
        assert_eq!(s.len(), 2);
    }
}

struct CancelOn {
    token: CancelToken,
    trigger: (JobId, JobStatus),
    inner: RecordingObserver,
}

impl BatchObserver for CancelOn {
    fn on_event(&mut self, event: &BatchEvent) {
        self.inner.on_event(event);
        if let BatchEvent::JobStateChanged { id, status } = event
            && (*id, *status) == self.trigger
        {
            self.token.cancel();
        }
    }
}

fn cancelling(trigger_index: usize, status: JobStatus) -> (Vec<JobId>, BatchSummary, BatchOrchestrator) {
    let sink = Arc::new(InMemoryExporter::new());
    let mut orch = BatchOrchestrator::new(small_config(), ExportConfig::default(), seeded())
        .unwrap()
        .with_exporter(sink);
    let ids = orch.add_files([data("cube.obj"), data("two_parts.obj"), data("octahedron_r10.obj")]);
    let observer = CancelOn {
        token: orch.cancel_token(),
        trigger: (ids[trigger_index], status),
        inner: RecordingObserver::new(),
    };
    let mut orch = orch.with_observer(observer);
    let summary = orch.run_batch(Path::new("renders")).unwrap();
    (ids, summary, orch)
}

#[test]
fn cancel_after_first_job_leaves_the_rest_pending() {
    let (ids, summary, orch) = cancelling(0, JobStatus::Completed);
    let statuses: Vec<_> = ids.iter().map(|&id| orch.job(id).unwrap().status()).collect();
    assert_eq!(
        statuses,
        vec![JobStatus::Completed, JobStatus::Pending, JobStatus::Pending]
    );
    assert_eq!(summary.processed, 1);
    assert_eq!(summary.completed, 1);
    assert!(summary.cancelled);
}

#[test]
fn cancel_during_a_render_lets_it_finish() {
    let (ids, summary, orch) = cancelling(1, JobStatus::Processing);
    let statuses: Vec<_> = ids.iter().map(|&id| orch.job(id).unwrap().status()).collect();
    assert_eq!(
        statuses,
        vec![JobStatus::Completed, JobStatus::Completed, JobStatus::Pending]
    );
    assert_eq!(summary.processed, 2);
    assert!(summary.cancelled);
}

#[test]
fn new_batch_clears_an_earlier_cancellation() {
    let (mut orch, _, _) = orchestrator();
    orch.add_files([data("cube.obj")]);
    orch.cancel_batch();
    assert!(orch.cancel_token().is_cancelled());
    assert!(orch.jobs().iter().all(|j| j.status() == JobStatus::Pending));
    let summary = orch.run_batch(Path::new("renders")).unwrap();
    assert_eq!(summary.processed, 1);
    assert!(!summary.cancelled);
}

#[test]
fn nul_bytes_in_a_file_name_fail_only_that_job() {
    let (mut orch, sink, _) = orchestrator();
    let ids = orch.add_files([PathBuf::from("tests/data/bad\0name.obj"), data("cube.obj")]);
    assert_eq!(ids.len(), 2);
    let summary = orch.run_batch(Path::new("renders")).unwrap();

    assert_eq!(summary.processed, 2);
    assert_eq!(summary.failed, 1);
    let err = orch.job(ids[0]).unwrap().error().unwrap().to_string();
    assert!(err.starts_with("load error:"), "{err}");
    assert_eq!(orch.job(ids[1]).unwrap().status(), JobStatus::Completed);
    assert_eq!(sink.paths(), vec![PathBuf::from("renders/cube.png")]);
}

struct FailingExporter;

impl ImageExporter for FailingExporter {
    fn export(&self, _: &RenderedImage, path: &Path, _: &ExportConfig) -> ScenepixResult<()> {
        Err(ScenepixError::export(format!("disk full writing {}", path.display())))
    }
}

#[test]
fn export_failures_do_not_fail_jobs_or_stop_the_batch() {
    let rec = RecordingObserver::new();
    let mut orch = BatchOrchestrator::new(small_config(), ExportConfig::default(), seeded())
        .unwrap()
        .with_exporter(Arc::new(FailingExporter))
        .with_observer(rec.clone());
    let ids = orch.add_files([data("cube.obj"), data("two_parts.obj")]);
    let summary = orch.run_batch(Path::new("renders")).unwrap();
    assert_eq!(summary.completed, 2);
    assert!(ids
        .iter()
        .all(|&id| orch.job(id).unwrap().status() == JobStatus::Completed));
    let failures = rec
        .events()
        .iter()
        .filter(|e| matches!(e, BatchEvent::ExportFailed { .. }))
        .count();
    assert_eq!(failures, 2);
}

#[test]
fn batch_preconditions() {
    let (mut orch, _, _) = orchestrator();
    let err = orch.run_batch(Path::new("renders")).unwrap_err();
    assert!(err.to_string().contains("empty"), "{err}");

    orch.add_files([data("cube.obj")]);
    let err = orch.run_batch(&data("cube.obj")).unwrap_err();
    assert!(err.to_string().contains("is a file"), "{err}");
}

struct SlowLoader;

impl SceneLoader for SlowLoader {
    fn load(&self, _: &AssetRef) -> ScenepixResult<SceneGraph> {
        std::thread::sleep(Duration::from_millis(400));
        Ok(SceneGraph::new())
    }
}

/// Loads from disk after a fixed delay.
struct DelayedLoader(Duration);

impl SceneLoader for DelayedLoader {
    fn load(&self, asset: &AssetRef) -> ScenepixResult<SceneGraph> {
        std::thread::sleep(self.0);
        FileSceneLoader.load(asset)
    }
}

fn delayed(delay_ms: u64) -> (BatchOrchestrator, Arc<InMemoryExporter>, RecordingObserver) {
    let (orch, sink, rec) = orchestrator();
    let orch = orch.with_loader(Arc::new(DelayedLoader(Duration::from_millis(delay_ms))));
    (orch, sink, rec)
}

fn poll_to_end(orch: &mut BatchOrchestrator) -> BatchSummary {
    let deadline = Instant::now() + Duration::from_secs(30);
    loop {
        if let Some(summary) = orch.poll().unwrap() {
            return summary;
        }
        assert!(Instant::now() < deadline, "batch did not finish");
        std::thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn poll_returns_while_a_render_is_in_flight() {
    let (mut orch, sink, rec) = delayed(300);
    let ids = orch.add_files([data("cube.obj"), data("two_parts.obj")]);
    orch.start_batch(Path::new("renders")).unwrap();

    assert_eq!(orch.poll().unwrap(), None);
    assert!(orch.is_batch_running());
    assert_eq!(orch.job(ids[0]).unwrap().status(), JobStatus::Processing);
    assert_eq!(orch.job(ids[1]).unwrap().status(), JobStatus::Pending);

    // The queue is locked while the batch owns it.
    assert!(orch.start_batch(Path::new("renders")).is_err());
    assert!(orch.process_single(ids[1]).is_err());
    assert!(orch.remove(ids[1]).is_err());
    assert!(orch.clear().is_err());
    assert_eq!(orch.update_config(small_config()).unwrap(), None);

    let summary = poll_to_end(&mut orch);
    assert_eq!(summary.completed, 2);
    assert_eq!(summary.processed, 2);
    assert!(!summary.cancelled);
    assert!(!orch.is_batch_running());
    assert!(orch.poll().is_err());
    assert_eq!(
        sink.paths(),
        vec![
            PathBuf::from("renders/cube.png"),
            PathBuf::from("renders/two_parts.png")
        ]
    );
    assert!(matches!(
        rec.events().last(),
        Some(BatchEvent::BatchFinished(s)) if *s == summary
    ));
}

#[test]
fn cancel_batch_stops_a_polled_batch_after_the_job_in_flight() {
    let (mut orch, _, _) = delayed(100);
    let ids = orch.add_files([data("cube.obj"), data("two_parts.obj"), data("octahedron_r10.obj")]);
    orch.start_batch(Path::new("renders")).unwrap();
    assert_eq!(orch.poll().unwrap(), None);
    orch.cancel_batch();

    let summary = poll_to_end(&mut orch);
    let statuses: Vec<_> = ids.iter().map(|&id| orch.job(id).unwrap().status()).collect();
    assert_eq!(
        statuses,
        vec![JobStatus::Completed, JobStatus::Pending, JobStatus::Pending]
    );
    assert!(summary.cancelled);
    assert_eq!(summary.processed, 1);
}

#[test]
fn abort_batch_returns_the_job_in_flight_to_pending() {
    let (mut orch, sink, rec) = delayed(300);
    let ids = orch.add_files([data("cube.obj"), data("two_parts.obj")]);
    assert!(orch.abort_batch().is_none());
    orch.start_batch(Path::new("renders")).unwrap();
    assert_eq!(orch.poll().unwrap(), None);

    let summary = orch.abort_batch().unwrap();
    assert_eq!(
        summary,
        BatchSummary {
            completed: 0,
            failed: 0,
            processed: 0,
            total: 2,
            cancelled: true,
        }
    );
    assert!(!orch.is_batch_running());
    assert_eq!(
        rec.statuses(ids[0]),
        vec![JobStatus::Processing, JobStatus::Pending]
    );

    // The detached render's result is dropped.
    std::thread::sleep(Duration::from_millis(400));
    assert!(
        ids.iter()
            .all(|&id| orch.job(id).unwrap().status() == JobStatus::Pending)
    );
    assert!(sink.paths().is_empty());
    assert_eq!(orch.process_single(ids[0]).unwrap(), JobStatus::Completed);
}

#[test]
fn job_timeout_fails_the_job_and_moves_on() {
    let opts = BatchOpts {
        job_timeout: Some(Duration::from_millis(25)),
        ..seeded()
    };
    let mut orch = BatchOrchestrator::new(small_config(), ExportConfig::default(), opts)
        .unwrap()
        .with_loader(Arc::new(SlowLoader))
        .with_exporter(Arc::new(InMemoryExporter::new()));
    let ids = orch.add_files([data("cube.obj"), data("two_parts.obj")]);
    let summary = orch.run_batch(Path::new("renders")).unwrap();
    assert_eq!(summary.failed, 2);
    assert_eq!(summary.processed, 2);
    for id in ids {
        let err = orch.job(id).unwrap().error().unwrap().to_string();
        assert!(err.contains("timed out"), "{err}");
    }
}

#[test]
fn polled_batches_honor_the_job_timeout() {
    let opts = BatchOpts {
        job_timeout: Some(Duration::from_millis(25)),
        ..seeded()
    };
    let mut orch = BatchOrchestrator::new(small_config(), ExportConfig::default(), opts)
        .unwrap()
        .with_loader(Arc::new(SlowLoader))
        .with_exporter(Arc::new(InMemoryExporter::new()));
    let ids = orch.add_files([data("cube.obj"), data("two_parts.obj")]);
    orch.start_batch(Path::new("renders")).unwrap();
    let summary = poll_to_end(&mut orch);
    assert_eq!(summary.failed, 2);
    for id in ids {
        let err = orch.job(id).unwrap().error().unwrap().to_string();
        assert!(err.contains("timed out"), "{err}");
    }
}

#[test]
fn equal_seeds_reproduce_random_orientations() {
    let cfg = RenderConfig {
        enable_random_x: true,
        enable_random_y: true,
        enable_random_z: true,
        ..small_config()
    };
    let render = || {
        let mut orch = BatchOrchestrator::new(cfg.clone(), ExportConfig::default(), seeded()).unwrap();
        let id = orch.add_files([data("two_parts.obj")])[0];
        orch.process_single(id).unwrap();
        orch.job(id).unwrap().image().unwrap().clone()
    };
    assert_eq!(render(), render());
}

#[test]
fn invalid_configs_are_rejected_at_construction() {
    let bad_export = ExportConfig {
        quality: -0.5,
        ..ExportConfig::default()
    };
    assert!(BatchOrchestrator::new(small_config(), bad_export, BatchOpts::default()).is_err());
    let bad_render = RenderConfig {
        image_height: 0,
        ..small_config()
    };
    assert!(
        BatchOrchestrator::new(bad_render, ExportConfig::default(), BatchOpts::default()).is_err()
    );
}

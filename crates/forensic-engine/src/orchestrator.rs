//! Report orchestration.
//!
//! Given a content hash and a source image, decides cache-hit vs.
//! recompute, fans the configured task set out through the runner under
//! one shared deadline, merges outcomes into the report as they land, and
//! persists the result. Partial failure is a first-class outcome: a
//! detector failing or timing out fills its slot, it never fails the call.

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{info, warn};

use forensic_ml_client::PredictorClient;
use forensic_models::{AnalysisOutcome, ContentHash, DetectorKind, ForensicReport, ReportStatus};
use forensic_store::ReportStore;

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::presenter::present;
use crate::runner::TaskRunner;
use crate::task::AnalysisTask;
use crate::tasks::{GhostTask, ManipulatedScoreTask, ThumbnailTask};

/// Tracks hashes with a report run currently under way in this process,
/// so concurrent requests for the same not-yet-complete hash never launch
/// a duplicate task set.
#[derive(Default)]
struct InFlightSet {
    hashes: Mutex<HashSet<ContentHash>>,
}

impl InFlightSet {
    /// Claim `hash`; `None` when another request already holds it.
    fn begin(set: &Arc<Self>, hash: &ContentHash) -> Option<InFlightGuard> {
        let mut hashes = set.hashes.lock().unwrap_or_else(PoisonError::into_inner);
        if hashes.insert(hash.clone()) {
            Some(InFlightGuard {
                set: Arc::clone(set),
                hash: hash.clone(),
            })
        } else {
            None
        }
    }
}

/// Releases the in-flight claim on every exit path.
struct InFlightGuard {
    set: Arc<InFlightSet>,
    hash: ContentHash,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.set
            .hashes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.hash);
    }
}

/// The report orchestration engine.
pub struct ReportOrchestrator<S: ReportStore> {
    store: Arc<S>,
    runner: TaskRunner,
    config: EngineConfig,
    tasks: Vec<Arc<dyn AnalysisTask>>,
    in_flight: Arc<InFlightSet>,
}

impl<S: ReportStore> ReportOrchestrator<S> {
    /// Build an orchestrator over an explicit task set.
    pub fn new(
        store: Arc<S>,
        config: EngineConfig,
        tasks: Vec<Arc<dyn AnalysisTask>>,
        runner: TaskRunner,
    ) -> Self {
        Self {
            store,
            runner,
            config,
            tasks,
            in_flight: Arc::new(InFlightSet::default()),
        }
    }

    /// Build an orchestrator with the standard shipped task set: thumbnail
    /// extraction, the ghost sweep on the inner pool, and the remote
    /// manipulation score.
    pub fn with_standard_tasks(store: Arc<S>, config: EngineConfig) -> EngineResult<Self> {
        let ghost_pool = Arc::new(Semaphore::new(config.num_ghost_threads));
        let runner = TaskRunner::new(config.num_total_threads, Arc::clone(&ghost_pool));
        let tasks: Vec<Arc<dyn AnalysisTask>> = vec![
            Arc::new(ThumbnailTask),
            Arc::new(GhostTask::new(
                ghost_pool,
                config.max_ghost_image_small_dimension,
            )),
            Arc::new(ManipulatedScoreTask::new(PredictorClient::new(
                &config.predictor_url,
            )?)),
        ];
        Ok(Self::new(store, config, tasks, runner))
    }

    /// The detector slots this orchestrator fills.
    pub fn configured_kinds(&self) -> Vec<DetectorKind> {
        self.tasks.iter().map(|t| t.kind()).collect()
    }

    /// Create (or resume) the report for `hash`.
    ///
    /// Returns `Cached` without recomputation when a complete report
    /// exists, `InProgress` when another request is already computing this
    /// hash, and otherwise runs the task set to a `Completed` or `Partial`
    /// status. Only unreadable input and store failures are errors.
    pub async fn create_report(
        &self,
        hash: &ContentHash,
        source_path: &Path,
    ) -> EngineResult<ReportStatus> {
        let configured = self.configured_kinds();

        let existing = self.store.get(hash).await?;
        if let Some(report) = &existing {
            if report.is_complete(&configured) {
                info!(hash = %hash, "serving cached report");
                return Ok(ReportStatus::Cached);
            }
        }

        let Some(_guard) = InFlightSet::begin(&self.in_flight, hash) else {
            info!(hash = %hash, "report already in progress");
            return Ok(ReportStatus::InProgress);
        };

        if !source_path.is_file() {
            return Err(EngineError::SourceUnreadable(source_path.to_path_buf()));
        }

        // Resume an incomplete record rather than discarding slots a
        // previous run already persisted.
        let mut report = existing.unwrap_or_else(|| {
            let filename = source_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let mut fresh = ForensicReport::new(hash.clone(), filename);
            fresh.display_image = Some(source_path.to_string_lossy().into_owned());
            fresh
        });

        // Hash-scoped output directory keeps concurrent images from
        // colliding.
        let out_dir = self.config.report_root.join(hash.as_str());
        std::fs::create_dir_all(&out_dir)?;

        // Make the in-progress record observable before any task reports.
        self.store.upsert(&report).await?;

        let deadline = Instant::now() + self.config.forensic_process_timeout;
        let mut running = JoinSet::new();
        for task in &self.tasks {
            if report.outcomes.contains_key(&task.kind()) {
                continue;
            }
            let kind = task.kind();
            let runner = self.runner.clone();
            let task = Arc::clone(task);
            let source = source_path.to_path_buf();
            let out_dir = out_dir.clone();
            running.spawn(async move { (kind, runner.run(task, source, out_dir, deadline).await) });
        }

        // Merge outcomes as they land; each merge is durable immediately
        // so a crash mid-run keeps the finished detectors.
        loop {
            match tokio::time::timeout_at(deadline, running.join_next()).await {
                Ok(Some(Ok((kind, outcome)))) => {
                    info!(hash = %hash, detector = %kind, completed = outcome.completed,
                        "detector reported");
                    report.merge_outcome(kind, outcome);
                    self.store.upsert(&report).await?;
                }
                Ok(Some(Err(join_err))) => {
                    // The runner catches task panics; this is a runner-level
                    // join failure.
                    warn!(hash = %hash, "runner task join failed: {join_err}");
                }
                Ok(None) => break,
                Err(_) => {
                    warn!(hash = %hash, "report deadline elapsed with tasks outstanding");
                    running.abort_all();
                    break;
                }
            }
        }

        // Any slot still empty at the deadline is a recorded timeout.
        for kind in &configured {
            if !report.outcomes.contains_key(kind) {
                report.merge_outcome(*kind, AnalysisOutcome::timed_out());
            }
        }
        self.store.upsert(&report).await?;

        let failed = report.failed_count();
        let status = if failed == 0 {
            ReportStatus::Completed
        } else {
            ReportStatus::Partial { failed }
        };
        info!(hash = %hash, status = %status, "report run finished");
        Ok(status)
    }

    /// Fetch the report in presented form: artifact paths under the report
    /// root rewritten to public URLs. The stored record is never mutated.
    pub async fn get_report(&self, hash: &ContentHash) -> EngineResult<Option<ForensicReport>> {
        let report = self.store.get(hash).await?;
        Ok(report.map(|r| present(&r, &self.config.report_root, &self.config.public_host)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use forensic_store::MemoryReportStore;

    /// Counting fake detector with configurable delay and result.
    struct FakeTask {
        kind: DetectorKind,
        delay: Duration,
        fail: bool,
        calls: Arc<AtomicUsize>,
    }

    impl FakeTask {
        fn new(kind: DetectorKind, delay: Duration, fail: bool) -> (Arc<Self>, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let task = Arc::new(Self {
                kind,
                delay,
                fail,
                calls: Arc::clone(&calls),
            });
            (task, calls)
        }
    }

    #[async_trait]
    impl AnalysisTask for FakeTask {
        fn kind(&self) -> DetectorKind {
            self.kind
        }

        async fn execute(&self, _source: &Path, _out_dir: &Path) -> AnalysisOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            if self.fail {
                AnalysisOutcome::failed("fake detector error")
            } else {
                AnalysisOutcome::success(vec![], Default::default())
            }
        }
    }

    fn test_config(root: &Path, timeout: Duration) -> EngineConfig {
        EngineConfig {
            forensic_process_timeout: timeout,
            report_root: root.to_path_buf(),
            ..EngineConfig::default()
        }
    }

    fn orchestrator(
        store: Arc<MemoryReportStore>,
        config: EngineConfig,
        tasks: Vec<Arc<dyn AnalysisTask>>,
    ) -> ReportOrchestrator<MemoryReportStore> {
        let ghost = Arc::new(Semaphore::new(config.num_ghost_threads));
        let runner = TaskRunner::new(config.num_total_threads, ghost);
        ReportOrchestrator::new(store, config, tasks, runner)
    }

    fn test_hash(n: u8) -> ContentHash {
        ContentHash::parse(&format!("{:032x}", n)).unwrap()
    }

    fn source_file(dir: &Path) -> PathBuf {
        let path = dir.join("source.jpg");
        std::fs::write(&path, b"not a real jpeg, fakes never read it").unwrap();
        path
    }

    #[tokio::test]
    async fn second_request_is_served_from_cache_without_rerunning() {
        let dir = tempfile::tempdir().unwrap();
        let source = source_file(dir.path());
        let store = Arc::new(MemoryReportStore::new());

        let (ela, ela_calls) = FakeTask::new(DetectorKind::Ela, Duration::ZERO, false);
        let (dq, dq_calls) = FakeTask::new(DetectorKind::Dq, Duration::ZERO, false);
        let orch = orchestrator(
            store,
            test_config(dir.path(), Duration::from_secs(5)),
            vec![ela, dq],
        );

        let hash = test_hash(1);
        assert_eq!(
            orch.create_report(&hash, &source).await.unwrap(),
            ReportStatus::Completed
        );
        assert_eq!(
            orch.create_report(&hash, &source).await.unwrap(),
            ReportStatus::Cached
        );
        assert_eq!(ela_calls.load(Ordering::SeqCst), 1);
        assert_eq!(dq_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn completion_is_independent_of_arrival_order() {
        let dir = tempfile::tempdir().unwrap();
        let source = source_file(dir.path());
        let store = Arc::new(MemoryReportStore::new());

        // Mixed delays and results: slots must all fill regardless.
        let (slowest, _) = FakeTask::new(DetectorKind::Ela, Duration::from_millis(80), false);
        let (failing, _) = FakeTask::new(DetectorKind::Dq, Duration::from_millis(20), true);
        let (fastest, _) = FakeTask::new(DetectorKind::Blocking, Duration::ZERO, false);
        let orch = orchestrator(
            Arc::clone(&store),
            test_config(dir.path(), Duration::from_secs(5)),
            vec![slowest, failing, fastest],
        );

        let hash = test_hash(2);
        let status = orch.create_report(&hash, &source).await.unwrap();
        assert_eq!(status, ReportStatus::Partial { failed: 1 });

        let report = store.get(&hash).await.unwrap().unwrap();
        assert!(report.is_complete(&orch.configured_kinds()));
        assert!(!report.outcomes[&DetectorKind::Dq].completed);
        assert!(report.outcomes[&DetectorKind::Ela].completed);
    }

    #[tokio::test]
    async fn deadline_fills_every_unfinished_slot_with_a_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let source = source_file(dir.path());
        let store = Arc::new(MemoryReportStore::new());

        let (fast, _) = FakeTask::new(DetectorKind::Ela, Duration::from_millis(10), false);
        let (stuck_a, _) = FakeTask::new(DetectorKind::Ghost, Duration::from_secs(60), false);
        let (stuck_b, _) = FakeTask::new(DetectorKind::Dq, Duration::from_secs(60), false);
        let orch = orchestrator(
            Arc::clone(&store),
            test_config(dir.path(), Duration::from_millis(150)),
            vec![fast, stuck_a, stuck_b],
        );

        let hash = test_hash(3);
        let status = orch.create_report(&hash, &source).await.unwrap();
        assert_eq!(status, ReportStatus::Partial { failed: 2 });

        // Exactly M slots: unfinished ones timeout-tagged, finished kept.
        let report = store.get(&hash).await.unwrap().unwrap();
        assert_eq!(report.outcomes.len(), 3);
        assert!(report.outcomes[&DetectorKind::Ela].completed);
        assert!(report.outcomes[&DetectorKind::Ghost].is_timeout());
        assert!(report.outcomes[&DetectorKind::Dq].is_timeout());
    }

    #[tokio::test]
    async fn unreadable_source_fails_fast_running_no_tasks() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryReportStore::new());
        let (ela, calls) = FakeTask::new(DetectorKind::Ela, Duration::ZERO, false);
        let orch = orchestrator(
            store,
            test_config(dir.path(), Duration::from_secs(5)),
            vec![ela],
        );

        let err = orch
            .create_report(&test_hash(4), &dir.path().join("missing.jpg"))
            .await
            .unwrap_err();
        assert!(err.is_input_error());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn concurrent_request_for_same_hash_observes_in_progress() {
        let dir = tempfile::tempdir().unwrap();
        let source = source_file(dir.path());
        let store = Arc::new(MemoryReportStore::new());

        let (slow, calls) = FakeTask::new(DetectorKind::Ela, Duration::from_millis(200), false);
        let orch = Arc::new(orchestrator(
            store,
            test_config(dir.path(), Duration::from_secs(5)),
            vec![slow],
        ));

        let hash = test_hash(5);
        let first = {
            let orch = Arc::clone(&orch);
            let hash = hash.clone();
            let source = source.clone();
            tokio::spawn(async move { orch.create_report(&hash, &source).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        let second = orch.create_report(&hash, &source).await.unwrap();
        assert_eq!(second, ReportStatus::InProgress);

        let first = first.await.unwrap().unwrap();
        assert_eq!(first, ReportStatus::Completed);
        // The expensive task set ran exactly once.
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // With the first run finished, the hash is claimable again and now
        // cached.
        assert_eq!(
            orch.create_report(&hash, &source).await.unwrap(),
            ReportStatus::Cached
        );
    }

    #[tokio::test]
    async fn partial_results_are_durable_as_they_land() {
        let dir = tempfile::tempdir().unwrap();
        let source = source_file(dir.path());
        let store = Arc::new(MemoryReportStore::new());

        let (fast, _) = FakeTask::new(DetectorKind::Ela, Duration::ZERO, false);
        let (stuck, _) = FakeTask::new(DetectorKind::Ghost, Duration::from_secs(60), false);
        let orch = Arc::new(orchestrator(
            Arc::clone(&store),
            test_config(dir.path(), Duration::from_secs(30)),
            vec![fast, stuck],
        ));

        let hash = test_hash(6);
        let run = {
            let orch = Arc::clone(&orch);
            let hash = hash.clone();
            let source = source.clone();
            tokio::spawn(async move { orch.create_report(&hash, &source).await })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;

        // Mid-run: the fast detector's outcome is already persisted.
        let snapshot = store.get(&hash).await.unwrap().unwrap();
        assert!(snapshot.outcomes[&DetectorKind::Ela].completed);
        assert!(!snapshot.outcomes.contains_key(&DetectorKind::Ghost));

        run.abort();
    }

    #[tokio::test]
    async fn predictor_failure_still_yields_other_detectors() {
        let dir = tempfile::tempdir().unwrap();
        let source = source_file(dir.path());
        let store = Arc::new(MemoryReportStore::new());

        let (ela, _) = FakeTask::new(DetectorKind::Ela, Duration::ZERO, false);
        let score_task: Arc<dyn AnalysisTask> = Arc::new(ManipulatedScoreTask::new(
            PredictorClient::new("http://127.0.0.1:1").unwrap(),
        ));
        let orch = orchestrator(
            Arc::clone(&store),
            test_config(dir.path(), Duration::from_secs(10)),
            vec![ela, score_task],
        );

        let hash = test_hash(7);
        let status = orch.create_report(&hash, &source).await.unwrap();
        assert_eq!(status, ReportStatus::Partial { failed: 1 });

        let report = store.get(&hash).await.unwrap().unwrap();
        let score = &report.outcomes[&DetectorKind::ManipulatedScore];
        assert!(!score.completed);
        assert!(score.metrics.is_empty());
        assert!(report.outcomes[&DetectorKind::Ela].completed);
    }

    #[tokio::test]
    async fn resumed_incomplete_report_reruns_only_missing_slots() {
        let dir = tempfile::tempdir().unwrap();
        let source = source_file(dir.path());
        let store = Arc::new(MemoryReportStore::new());
        let hash = test_hash(8);

        // A previous run persisted one slot before crashing.
        let mut stale = ForensicReport::new(hash.clone(), "source.jpg");
        stale.merge_outcome(
            DetectorKind::Ela,
            AnalysisOutcome::success(vec![], Default::default()),
        );
        store.upsert(&stale).await.unwrap();

        let (ela, ela_calls) = FakeTask::new(DetectorKind::Ela, Duration::ZERO, false);
        let (dq, dq_calls) = FakeTask::new(DetectorKind::Dq, Duration::ZERO, false);
        let orch = orchestrator(
            Arc::clone(&store),
            test_config(dir.path(), Duration::from_secs(5)),
            vec![ela, dq],
        );

        let status = orch.create_report(&hash, &source).await.unwrap();
        assert_eq!(status, ReportStatus::Completed);
        assert_eq!(ela_calls.load(Ordering::SeqCst), 0);
        assert_eq!(dq_calls.load(Ordering::SeqCst), 1);
    }
}

//! Task runner: bounded execution with a shared deadline.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::time::Instant;
use tracing::warn;

use forensic_models::AnalysisOutcome;

use crate::task::AnalysisTask;

/// Executes analysis tasks against two process-wide bounded pools.
///
/// The outer pool caps how many tasks of a report run concurrently; the
/// ghost pool is a separate, typically larger pool that the ghost task
/// family draws on for its many short sub-computations. Callers never
/// create ad hoc unbounded concurrency.
#[derive(Clone)]
pub struct TaskRunner {
    outer: Arc<Semaphore>,
    ghost: Arc<Semaphore>,
}

impl TaskRunner {
    /// Create a runner with `num_total_threads` outer permits, sharing the
    /// given ghost pool with the tasks that requested it at construction.
    pub fn new(num_total_threads: usize, ghost: Arc<Semaphore>) -> Self {
        Self {
            outer: Arc::new(Semaphore::new(num_total_threads)),
            ghost,
        }
    }

    /// The inner pool for ghost-family sub-computations.
    pub fn ghost_pool(&self) -> Arc<Semaphore> {
        Arc::clone(&self.ghost)
    }

    /// Run one task to an outcome, success, failure, and timeout alike.
    ///
    /// Waiting for an outer permit counts against the deadline
    /// (backpressure, not failure). On expiry the task is cancelled
    /// best-effort — spawned blocking sub-work may not stop instantly —
    /// and a timeout-tagged failed outcome is returned. Panics inside the
    /// task are caught at the spawn boundary and recorded the same way.
    pub async fn run(
        &self,
        task: Arc<dyn AnalysisTask>,
        source: PathBuf,
        out_dir: PathBuf,
        deadline: Instant,
    ) -> AnalysisOutcome {
        let kind = task.kind();
        let outer = Arc::clone(&self.outer);
        let mut handle = tokio::spawn(async move {
            let _permit = match outer.acquire_owned().await {
                Ok(p) => p,
                Err(_) => return AnalysisOutcome::failed("worker pool closed"),
            };
            task.execute(&source, &out_dir).await
        });

        match tokio::time::timeout_at(deadline, &mut handle).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(join_err)) => {
                warn!(detector = %kind, "task panicked: {join_err}");
                AnalysisOutcome::failed(format!("task panicked: {join_err}"))
            }
            Err(_) => {
                warn!(detector = %kind, "task missed the report deadline");
                handle.abort();
                AnalysisOutcome::timed_out()
            }
        }
    }
}

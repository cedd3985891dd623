//! The analysis-task capability.

use std::path::Path;

use async_trait::async_trait;
use forensic_models::{AnalysisOutcome, DetectorKind};

/// One independent forensic computation contributing one report slot.
///
/// Tasks are pure with respect to orchestration state: all communication
/// back to the orchestrator goes through the returned outcome, never
/// through shared mutable fields. The contract is infallible — any
/// failure, including remote-service failure, is encoded as a
/// `completed = false` outcome rather than an error or panic.
///
/// A variant that needs extra resources (the ghost family's inner worker
/// pool, the predictor HTTP client) owns them from construction.
#[async_trait]
pub trait AnalysisTask: Send + Sync {
    /// The report slot this task fills.
    fn kind(&self) -> DetectorKind;

    /// Analyze `source`, writing artifacts under `out_dir`.
    async fn execute(&self, source: &Path, out_dir: &Path) -> AnalysisOutcome;
}

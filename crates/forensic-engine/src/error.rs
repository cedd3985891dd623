//! Engine error types.
//!
//! Only input and persistence failures propagate to the caller; everything
//! a detector does wrong is absorbed into its slot's outcome.

use std::path::PathBuf;

use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    /// The source image cannot be opened at all; no tasks are run.
    #[error("source image unreadable: {}", .0.display())]
    SourceUnreadable(PathBuf),

    /// The report store is unavailable; no result can be durably recorded.
    #[error("report store error: {0}")]
    Store(#[from] forensic_store::StoreError),

    /// Output directory preparation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The predictor client could not be constructed.
    #[error("predictor client init failed: {0}")]
    PredictorInit(#[from] forensic_ml_client::MlError),
}

impl EngineError {
    /// True when the failure is the caller's input rather than our state.
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::SourceUnreadable(_))
    }
}

//! Predictor client error types.

use thiserror::Error;

pub type MlResult<T> = Result<T, MlError>;

#[derive(Debug, Error)]
pub enum MlError {
    #[error("predictor request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("predictor returned status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("predictor response missing or malformed: {0}")]
    MalformedResponse(String),

    #[error("heatmap decode failed: {0}")]
    HeatmapDecode(String),

    #[error("I/O error writing heatmap: {0}")]
    Io(#[from] std::io::Error),
}

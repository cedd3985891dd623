//! Remote-model manipulation score task.

use std::path::Path;

use async_trait::async_trait;
use tracing::warn;

use forensic_ml_client::PredictorClient;
use forensic_models::{AnalysisOutcome, DetectorKind};

use crate::task::AnalysisTask;

/// Scores the image with the external predictor service.
///
/// Any I/O, parse, or remote error degrades to a recorded failure with
/// zeroed metrics; the orchestrator never observes an error from this
/// variant. Single attempt, no retry.
pub struct ManipulatedScoreTask {
    client: PredictorClient,
}

impl ManipulatedScoreTask {
    pub fn new(client: PredictorClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AnalysisTask for ManipulatedScoreTask {
    fn kind(&self) -> DetectorKind {
        DetectorKind::ManipulatedScore
    }

    async fn execute(&self, source: &Path, out_dir: &Path) -> AnalysisOutcome {
        let output = out_dir.join("manipulated_score.png");
        match self.client.predict(source, &output).await {
            Ok(prediction) => {
                let artifacts = prediction.heatmap_path.into_iter().collect();
                AnalysisOutcome::success(artifacts, Default::default())
                    .with_metric("manipulation_score", prediction.manipulation_score as f64)
                    .with_metric("min_value", prediction.min_value as f64)
                    .with_metric("max_value", prediction.max_value as f64)
            }
            Err(e) => {
                warn!("manipulation-score prediction failed: {e}");
                AnalysisOutcome::failed(format!("manipulation-score prediction failed: {e}"))
            }
        }
    }
}

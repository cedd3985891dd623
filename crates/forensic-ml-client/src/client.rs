//! HTTP client for the predictor service.

use std::path::Path;
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{MlError, MlResult};

/// Default request timeout; the predictor runs model inference, so this is
/// well above a typical HTTP call.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Request body for `POST /predict`.
#[derive(Debug, Clone, Serialize)]
pub struct PredictRequest {
    pub image_path: String,
    pub output_path: String,
}

/// Response body from the predictor.
#[derive(Debug, Clone, Deserialize)]
pub struct PredictResponse {
    pub manipulation_score: f32,
    pub min_value: f32,
    pub max_value: f32,
    /// Inline raster, present only when the service could not write the
    /// heatmap file itself.
    #[serde(default)]
    pub heatmap_base64: Option<String>,
}

/// A completed prediction with the heatmap materialized on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub manipulation_score: f32,
    pub min_value: f32,
    pub max_value: f32,
    /// Path of the heatmap file, when one was produced.
    pub heatmap_path: Option<String>,
}

/// Client for the manipulation-score predictor service.
#[derive(Debug, Clone)]
pub struct PredictorClient {
    http: reqwest::Client,
    base_url: String,
}

impl PredictorClient {
    /// Create a client for the service at `base_url`
    /// (e.g. `http://localhost:5000`).
    pub fn new(base_url: impl Into<String>) -> MlResult<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> MlResult<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Ask the predictor to score `image_path`, materializing the heatmap
    /// at `output_path`.
    ///
    /// Single attempt: transient failures surface as errors for the caller
    /// to absorb into a failed outcome.
    pub async fn predict(&self, image_path: &Path, output_path: &Path) -> MlResult<Prediction> {
        let request = PredictRequest {
            image_path: image_path.to_string_lossy().into_owned(),
            output_path: output_path.to_string_lossy().into_owned(),
        };
        let url = format!("{}/predict", self.base_url);
        debug!(url = %url, image = %request.image_path, "requesting manipulation score");

        let response = self.http.post(&url).json(&request).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MlError::Status { status, body });
        }

        let body: PredictResponse = response
            .json()
            .await
            .map_err(|e| MlError::MalformedResponse(e.to_string()))?;

        // The service normally writes the heatmap itself; only fall back to
        // the inline raster when the file did not materialize.
        let heatmap_path = if output_path.exists() {
            Some(output_path.to_string_lossy().into_owned())
        } else if let Some(encoded) = &body.heatmap_base64 {
            self.write_heatmap(encoded, output_path)?;
            Some(output_path.to_string_lossy().into_owned())
        } else {
            warn!(
                output = %output_path.display(),
                "predictor returned no heatmap file and no inline raster"
            );
            None
        };

        Ok(Prediction {
            manipulation_score: body.manipulation_score,
            min_value: body.min_value,
            max_value: body.max_value,
            heatmap_path,
        })
    }

    fn write_heatmap(&self, encoded: &str, output_path: &Path) -> MlResult<()> {
        let bytes = BASE64
            .decode(encoded)
            .map_err(|e| MlError::HeatmapDecode(e.to_string()))?;
        let raster =
            image::load_from_memory(&bytes).map_err(|e| MlError::HeatmapDecode(e.to_string()))?;
        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        raster
            .save_with_format(output_path, image::ImageFormat::Png)
            .map_err(|e| MlError::HeatmapDecode(e.to_string()))?;
        debug!(output = %output_path.display(), "wrote inline heatmap");
        Ok(())
    }
}

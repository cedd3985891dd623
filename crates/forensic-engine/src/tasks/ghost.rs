//! JPEG ghost re-compression task family.
//!
//! Re-encodes the image at a sweep of JPEG quality levels and writes a
//! difference map per level; a local minimum in the mean difference at a
//! quality other than the original's betrays prior compression of a
//! region. Each quality level is an independent short sub-computation, so
//! the sweep fans out across the inner bounded pool rather than the outer
//! task pool.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::GrayImage;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use forensic_models::{AnalysisOutcome, DetectorKind};

use crate::task::AnalysisTask;

/// Quality levels swept by the ghost analysis.
const QUALITIES: [u8; 10] = [50, 55, 60, 65, 70, 75, 80, 85, 90, 95];

/// The ghost task family: one sub-unit per quality level on the inner pool.
pub struct GhostTask {
    ghost_pool: Arc<Semaphore>,
    max_small_dimension: u32,
}

impl GhostTask {
    /// The inner pool is requested at construction; the task owns its
    /// resource needs.
    pub fn new(ghost_pool: Arc<Semaphore>, max_small_dimension: u32) -> Self {
        Self {
            ghost_pool,
            max_small_dimension,
        }
    }
}

#[async_trait]
impl AnalysisTask for GhostTask {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Ghost
    }

    async fn execute(&self, source: &Path, out_dir: &Path) -> AnalysisOutcome {
        let base = match load_guarded(source, self.max_small_dimension).await {
            Ok(img) => Arc::new(img),
            Err(e) => return AnalysisOutcome::failed(e),
        };

        let mut sweep = JoinSet::new();
        for quality in QUALITIES {
            let pool = Arc::clone(&self.ghost_pool);
            let base = Arc::clone(&base);
            let out_dir = out_dir.to_path_buf();
            sweep.spawn(async move {
                let _permit = pool
                    .acquire_owned()
                    .await
                    .map_err(|_| "ghost pool closed".to_string())?;
                tokio::task::spawn_blocking(move || ghost_at_quality(&base, quality, &out_dir))
                    .await
                    .map_err(|e| format!("ghost sub-task panicked: {e}"))?
            });
        }

        let mut outcome = AnalysisOutcome::success(Vec::new(), Default::default());
        let mut failures = Vec::new();
        while let Some(joined) = sweep.join_next().await {
            match joined {
                Ok(Ok((quality, mean_diff, map_path))) => {
                    outcome
                        .metrics
                        .insert(format!("quality_{quality}"), mean_diff);
                    outcome
                        .artifact_paths
                        .push(map_path.to_string_lossy().into_owned());
                }
                Ok(Err(msg)) => failures.push(msg),
                Err(join_err) => failures.push(join_err.to_string()),
            }
        }

        if !failures.is_empty() {
            warn!("ghost sweep failed: {}", failures.join("; "));
            return AnalysisOutcome::failed(format!("ghost sweep failed: {}", failures.join("; ")));
        }
        outcome.artifact_paths.sort();
        outcome
    }
}

/// Load the source and apply the small-dimension guard.
async fn load_guarded(source: &Path, max_small_dimension: u32) -> Result<GrayImage, String> {
    let source = source.to_path_buf();
    let loaded = tokio::task::spawn_blocking(move || image::open(&source))
        .await
        .map_err(|e| format!("ghost load panicked: {e}"))?
        .map_err(|e| format!("unable to open source image: {e}"))?;

    let (w, h) = (loaded.width(), loaded.height());
    let small = w.min(h);
    let img = if small > max_small_dimension {
        debug!(from = small, to = max_small_dimension, "downscaling for ghost sweep");
        let scale = max_small_dimension as f32 / small as f32;
        loaded.thumbnail(
            (w as f32 * scale).round() as u32,
            (h as f32 * scale).round() as u32,
        )
    } else {
        loaded
    };
    Ok(img.to_luma8())
}

/// One sub-unit: re-encode at `quality`, diff against the base, write the
/// difference map.
fn ghost_at_quality(
    base: &GrayImage,
    quality: u8,
    out_dir: &Path,
) -> Result<(u8, f64, PathBuf), String> {
    let mut encoded = Vec::new();
    JpegEncoder::new_with_quality(&mut encoded, quality)
        .encode(
            base.as_raw(),
            base.width(),
            base.height(),
            image::ColorType::L8,
        )
        .map_err(|e| format!("re-encode at q{quality} failed: {e}"))?;

    let recompressed = image::load_from_memory(&encoded)
        .map_err(|e| format!("re-decode at q{quality} failed: {e}"))?
        .to_luma8();

    let mut total: u64 = 0;
    let diff = GrayImage::from_fn(base.width(), base.height(), |x, y| {
        let a = base.get_pixel(x, y).0[0];
        let b = recompressed.get_pixel(x, y).0[0];
        let d = a.abs_diff(b);
        total += d as u64;
        image::Luma([d])
    });
    let mean = total as f64 / (base.width() as u64 * base.height() as u64) as f64;

    std::fs::create_dir_all(out_dir).map_err(|e| e.to_string())?;
    let map_path = out_dir.join(format!("ghost_q{quality}.png"));
    diff.save(&map_path)
        .map_err(|e| format!("writing ghost map failed: {e}"))?;
    Ok((quality, mean, map_path))
}

//! Thumbnail/metadata extraction task.

use std::path::Path;

use async_trait::async_trait;
use tracing::warn;

use forensic_media::thumbnail::extract_thumbnails;
use forensic_models::{AnalysisOutcome, DetectorKind};

use crate::task::AnalysisTask;

/// Walks the source image's marker segments and extracts embedded
/// thumbnails. A malformed or truncated stream fails only this slot.
#[derive(Debug, Default)]
pub struct ThumbnailTask;

#[async_trait]
impl AnalysisTask for ThumbnailTask {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Thumbnail
    }

    async fn execute(&self, source: &Path, out_dir: &Path) -> AnalysisOutcome {
        let source = source.to_path_buf();
        let out_dir = out_dir.to_path_buf();
        let scan = tokio::task::spawn_blocking(move || extract_thumbnails(&source, &out_dir)).await;

        match scan {
            Ok(Ok(scan)) => {
                let paths = scan
                    .thumbnail_paths
                    .iter()
                    .map(|p| p.to_string_lossy().into_owned())
                    .collect();
                AnalysisOutcome::success(paths, Default::default())
                    .with_metric("number_of_thumbnails", scan.thumbnail_paths.len() as f64)
                    .with_metric("marker_count", scan.marker_count as f64)
                    .with_metric("app_segment_count", scan.app_segment_count as f64)
            }
            Ok(Err(e)) => {
                warn!("thumbnail scan failed: {e}");
                AnalysisOutcome::failed(format!("thumbnail scan failed: {e}"))
            }
            Err(join_err) => AnalysisOutcome::failed(format!("thumbnail task panicked: {join_err}")),
        }
    }
}

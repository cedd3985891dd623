//! In-memory report store for tests and single-process runs.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use forensic_models::{ContentHash, ForensicReport};
use tokio::sync::RwLock;

use crate::error::StoreResult;
use crate::ReportStore;

/// Process-local [`ReportStore`] backed by a hash map.
#[derive(Debug, Clone, Default)]
pub struct MemoryReportStore {
    reports: Arc<RwLock<HashMap<ContentHash, ForensicReport>>>,
}

impl MemoryReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored reports.
    pub async fn len(&self) -> usize {
        self.reports.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.reports.read().await.is_empty()
    }
}

#[async_trait]
impl ReportStore for MemoryReportStore {
    async fn get(&self, hash: &ContentHash) -> StoreResult<Option<ForensicReport>> {
        Ok(self.reports.read().await.get(hash).cloned())
    }

    async fn upsert(&self, report: &ForensicReport) -> StoreResult<()> {
        self.reports
            .write()
            .await
            .insert(report.hash.clone(), report.clone());
        Ok(())
    }
}

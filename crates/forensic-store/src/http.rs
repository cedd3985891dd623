//! HTTP document-store backend.
//!
//! Speaks a small JSON document API: `GET {base}/reports/{hash}` returns the
//! stored record or 404, `PUT {base}/reports/{hash}` replaces it. The
//! store maintains `created_at`/`updated_at` from the record body.

use std::time::Duration;

use async_trait::async_trait;
use forensic_models::{ContentHash, ForensicReport};
use reqwest::StatusCode;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::ReportStore;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// [`ReportStore`] backed by a remote document API.
#[derive(Debug, Clone)]
pub struct HttpReportStore {
    http: reqwest::Client,
    base_url: String,
}

impl HttpReportStore {
    pub fn new(base_url: impl Into<String>) -> StoreResult<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> StoreResult<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn report_url(&self, hash: &ContentHash) -> String {
        format!("{}/reports/{}", self.base_url, hash)
    }
}

#[async_trait]
impl ReportStore for HttpReportStore {
    async fn get(&self, hash: &ContentHash) -> StoreResult<Option<ForensicReport>> {
        let url = self.report_url(hash);
        let response = self.http.get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Status { status, body });
        }
        let text = response.text().await?;
        let report: ForensicReport = serde_json::from_str(&text)?;
        debug!(hash = %hash, "fetched report");
        Ok(Some(report))
    }

    async fn upsert(&self, report: &ForensicReport) -> StoreResult<()> {
        let url = self.report_url(&report.hash);
        let response = self.http.put(&url).json(report).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Status { status, body });
        }
        debug!(hash = %report.hash, slots = report.outcomes.len(), "upserted report");
        Ok(())
    }
}

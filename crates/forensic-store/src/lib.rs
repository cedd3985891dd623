//! Report persistence.
//!
//! The engine talks to its backing document store through the narrow
//! [`ReportStore`] contract: whole-record get and upsert, keyed by content
//! hash. The orchestrator is the single writer per hash, so no store-side
//! merge primitives are needed.
//!
//! Two implementations ship here: [`MemoryReportStore`] for tests and the
//! demo binary, and [`HttpReportStore`] for a production document API.

mod error;
mod http;
mod memory;

use async_trait::async_trait;
use forensic_models::{ContentHash, ForensicReport};

pub use error::{StoreError, StoreResult};
pub use http::HttpReportStore;
pub use memory::MemoryReportStore;

/// Narrow read/write contract over the report document store.
///
/// Handles are injected with explicit lifecycle (opened at startup), never
/// reached through ambient process-wide state, so tests can substitute the
/// in-memory implementation.
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Fetch the report for `hash`, if one exists.
    async fn get(&self, hash: &ContentHash) -> StoreResult<Option<ForensicReport>>;

    /// Insert or replace the report keyed by its hash.
    async fn upsert(&self, report: &ForensicReport) -> StoreResult<()>;
}

//! Forensic report orchestration engine.
//!
//! Coordinates a heterogeneous set of forensic analysis tasks over one
//! submitted image: deduplicates requests by content hash, fans the task
//! set out onto bounded worker pools under a shared deadline, records
//! per-task failure without aborting the report, and merges partial
//! outcomes into one persisted record.

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod presenter;
pub mod runner;
pub mod task;
pub mod tasks;

pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};
pub use orchestrator::ReportOrchestrator;
pub use presenter::present;
pub use runner::TaskRunner;
pub use task::AnalysisTask;

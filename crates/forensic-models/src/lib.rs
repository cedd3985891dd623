//! Shared data models for the forensic report engine.
//!
//! This crate provides Serde-serializable types for:
//! - Content hashes (dedup/cache keys)
//! - Per-detector analysis outcomes
//! - The composite forensic report record
//! - Report call status messages

pub mod hash;
pub mod outcome;
pub mod report;
pub mod status;

// Re-export common types
pub use hash::{ContentHash, ContentHashError};
pub use outcome::AnalysisOutcome;
pub use report::{DetectorKind, ForensicReport};
pub use status::ReportStatus;

//! Per-detector analysis outcomes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The typed, always-present result of running one analysis task.
///
/// `completed = false` means the detector ran but did not produce a usable
/// result (unsuitable input, internal error, remote failure, or timeout).
/// It is not the same as "not attempted": a report slot is only filled once
/// the task has actually reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AnalysisOutcome {
    /// Whether the detector produced a usable result.
    pub completed: bool,

    /// Internal filesystem paths of artifacts written by the detector.
    /// External URL form is derived at presentation time, never stored.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub artifact_paths: Vec<String>,

    /// Numeric metrics produced by the detector.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metrics: BTreeMap<String, f64>,

    /// Sanitized failure description when `completed` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl AnalysisOutcome {
    /// A successful outcome with artifacts and metrics.
    pub fn success(artifact_paths: Vec<String>, metrics: BTreeMap<String, f64>) -> Self {
        Self {
            completed: true,
            artifact_paths,
            metrics,
            error_message: None,
        }
    }

    /// A recorded failure: no artifacts, zeroed metrics, a message.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            completed: false,
            artifact_paths: Vec::new(),
            metrics: BTreeMap::new(),
            error_message: Some(message.into()),
        }
    }

    /// A recorded failure whose cause is the shared deadline elapsing.
    pub fn timed_out() -> Self {
        Self::failed("timeout: task did not complete before the deadline")
    }

    /// Whether this outcome records a deadline timeout.
    pub fn is_timeout(&self) -> bool {
        self.error_message
            .as_deref()
            .is_some_and(|m| m.starts_with("timeout:"))
    }

    /// Add a single metric, builder style.
    pub fn with_metric(mut self, key: impl Into<String>, value: f64) -> Self {
        self.metrics.insert(key.into(), value);
        self
    }
}

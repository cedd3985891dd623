//! Status messages returned by report calls.

use serde::{Deserialize, Serialize};

/// Outcome of a `create_report` call.
///
/// A report call always returns a status; partial detector failure is never
/// surfaced as an error. `Display` yields the wire status strings of the
/// original service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    /// A complete report already existed; nothing was recomputed.
    Cached,
    /// Another request for the same hash is already computing the report.
    InProgress,
    /// Every configured detector reported `completed = true`.
    Completed,
    /// All slots are filled but some detectors failed or timed out.
    Partial {
        /// Number of slots with `completed = false`.
        failed: usize,
    },
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cached => "CACHED",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETEDSUCCESSFULLY",
            Self::Partial { .. } => "COMPLETEDWITHFAILURES",
        }
    }

    /// True when the call finished the task set (fully or partially).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Cached | Self::Completed | Self::Partial { .. })
    }
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Partial { failed } => write!(f, "{} ({} failed)", self.as_str(), failed),
            _ => f.write_str(self.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_service_strings() {
        assert_eq!(ReportStatus::Completed.to_string(), "COMPLETEDSUCCESSFULLY");
        assert_eq!(
            ReportStatus::Partial { failed: 2 }.to_string(),
            "COMPLETEDWITHFAILURES (2 failed)"
        );
    }

    #[test]
    fn terminal_statuses() {
        assert!(ReportStatus::Cached.is_terminal());
        assert!(ReportStatus::Partial { failed: 1 }.is_terminal());
        assert!(!ReportStatus::InProgress.is_terminal());
    }
}

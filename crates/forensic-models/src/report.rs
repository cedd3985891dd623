//! The composite forensic report record.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::hash::ContentHash;
use crate::outcome::AnalysisOutcome;

/// The closed set of forensic detectors contributing report slots.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum DetectorKind {
    /// Error-level analysis
    Ela,
    /// Double-quantization map
    Dq,
    /// Wavelet-based noise estimation
    DwNoise,
    /// Median-filter noise estimation
    MedianNoise,
    /// JPEG ghost re-compression sweep (inner-pool task family)
    Ghost,
    /// JPEG grid alignment artifacts
    Grids,
    /// Inverted grid alignment artifacts
    GridsInversed,
    /// Blocking artifact map
    Blocking,
    /// Embedded thumbnail and metadata extraction
    Thumbnail,
    /// Learned-model manipulation score from the remote predictor
    ManipulatedScore,
}

impl DetectorKind {
    /// All detectors, in slot order.
    pub const ALL: [DetectorKind; 10] = [
        Self::Ela,
        Self::Dq,
        Self::DwNoise,
        Self::MedianNoise,
        Self::Ghost,
        Self::Grids,
        Self::GridsInversed,
        Self::Blocking,
        Self::Thumbnail,
        Self::ManipulatedScore,
    ];

    /// Snake_case slot name used as the persisted map key.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ela => "ela",
            Self::Dq => "dq",
            Self::DwNoise => "dw_noise",
            Self::MedianNoise => "median_noise",
            Self::Ghost => "ghost",
            Self::Grids => "grids",
            Self::GridsInversed => "grids_inversed",
            Self::Blocking => "blocking",
            Self::Thumbnail => "thumbnail",
            Self::ManipulatedScore => "manipulated_score",
        }
    }
}

impl std::fmt::Display for DetectorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregate forensic report, one per content hash.
///
/// Created at the first request for a previously-unseen hash, mutated at
/// most once per detector slot as each analysis task finishes, never
/// deleted by the engine. Artifact paths in the record are always internal
/// filesystem paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForensicReport {
    /// Content hash identity key
    pub hash: ContentHash,

    /// Original filename of the analyzed image
    pub source_filename: String,

    /// Internal path of the image shown alongside the report
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_image: Option<String>,

    /// When the record was created
    pub created_at: DateTime<Utc>,

    /// When a slot was last merged
    pub updated_at: DateTime<Utc>,

    /// Detector-name -> outcome mapping, filled as tasks report
    #[serde(default)]
    pub outcomes: BTreeMap<DetectorKind, AnalysisOutcome>,
}

impl ForensicReport {
    /// Create a fresh record with no slots filled.
    pub fn new(hash: ContentHash, source_filename: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            hash,
            source_filename: source_filename.into(),
            display_image: None,
            created_at: now,
            updated_at: now,
            outcomes: BTreeMap::new(),
        }
    }

    /// Merge one detector's outcome into its slot and bump `updated_at`.
    ///
    /// Slots are per-detector and commutative: tasks may finish in any
    /// order, and no two detectors ever write the same slot.
    pub fn merge_outcome(&mut self, kind: DetectorKind, outcome: AnalysisOutcome) {
        self.outcomes.insert(kind, outcome);
        self.updated_at = Utc::now();
    }

    /// A report is complete once every configured detector has reported,
    /// whether `completed = true` or `false`, independent of arrival order.
    pub fn is_complete(&self, configured: &[DetectorKind]) -> bool {
        configured.iter().all(|k| self.outcomes.contains_key(k))
    }

    /// Number of filled slots that record a failure.
    pub fn failed_count(&self) -> usize {
        self.outcomes.values().filter(|o| !o.completed).count()
    }

    /// Iterator over every artifact path in the record, including the
    /// display image.
    pub fn artifact_paths(&self) -> impl Iterator<Item = &String> {
        self.outcomes
            .values()
            .flat_map(|o| o.artifact_paths.iter())
            .chain(self.display_image.iter())
    }
}

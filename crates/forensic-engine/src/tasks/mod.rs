//! Concrete analysis task variants.
//!
//! The pixel-math detectors (ELA, DQ, noise estimators, grids, blocking)
//! are external collaborators: they plug in as further [`crate::AnalysisTask`]
//! implementations without engine changes.

mod ghost;
mod manipulated_score;
mod thumbnail;

pub use ghost::GhostTask;
pub use manipulated_score::ManipulatedScoreTask;
pub use thumbnail::ThumbnailTask;

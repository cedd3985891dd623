//! Engine configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Engine configuration, threaded explicitly through the orchestrator
/// entry point so tests can vary parameters per instance.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Outer worker pool size: the full per-image task set runs here.
    pub num_total_threads: usize,
    /// Inner pool size for the ghost task family's sub-computations.
    pub num_ghost_threads: usize,
    /// Shared deadline for one whole report run.
    pub forensic_process_timeout: Duration,
    /// Size guard for the ghost family: images whose smaller dimension
    /// exceeds this are downscaled before the quality sweep.
    pub max_ghost_image_small_dimension: u32,
    /// Root output directory and internal artifact path prefix.
    pub report_root: PathBuf,
    /// Public host prefix used when rewriting artifact paths at read time.
    pub public_host: String,
    /// Base URL of the manipulation-score predictor service.
    pub predictor_url: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            num_total_threads: 8,
            num_ghost_threads: 16,
            forensic_process_timeout: Duration::from_secs(120),
            max_ghost_image_small_dimension: 768,
            report_root: PathBuf::from("/tmp/forensic/reports"),
            public_host: "http://localhost:8080/".to_string(),
            predictor_url: "http://localhost:5000".to_string(),
        }
    }
}

impl EngineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            num_total_threads: env_parse("FORENSIC_NUM_TOTAL_THREADS")
                .unwrap_or(defaults.num_total_threads),
            num_ghost_threads: env_parse("FORENSIC_NUM_GHOST_THREADS")
                .unwrap_or(defaults.num_ghost_threads),
            forensic_process_timeout: env_parse("FORENSIC_PROCESS_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.forensic_process_timeout),
            max_ghost_image_small_dimension: env_parse("FORENSIC_MAX_GHOST_SMALL_DIM")
                .unwrap_or(defaults.max_ghost_image_small_dimension),
            report_root: std::env::var("FORENSIC_REPORT_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.report_root),
            public_host: std::env::var("FORENSIC_PUBLIC_HOST")
                .unwrap_or(defaults.public_host),
            predictor_url: std::env::var("FORENSIC_PREDICTOR_URL")
                .unwrap_or(defaults.predictor_url),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = EngineConfig::default();
        assert!(cfg.num_ghost_threads >= cfg.num_total_threads);
        assert!(cfg.forensic_process_timeout > Duration::ZERO);
    }
}

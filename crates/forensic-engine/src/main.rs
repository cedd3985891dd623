//! Forensic report engine demo binary.
//!
//! Hashes an image, runs the standard task set against an in-memory
//! store, and prints the presented report as JSON. The HTTP front door
//! lives elsewhere; this binary wires the engine end to end.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use sha2::{Digest, Sha256};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use forensic_engine::{EngineConfig, ReportOrchestrator};
use forensic_models::ContentHash;
use forensic_store::MemoryReportStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let source = match std::env::args().nth(1) {
        Some(arg) => PathBuf::from(arg),
        None => bail!("usage: forensic-engine <image-path>"),
    };

    let config = EngineConfig::from_env();
    info!("Engine config: {:?}", config);

    let hash = hash_file(&source)?;
    info!(hash = %hash, source = %source.display(), "computed content hash");

    let store = Arc::new(MemoryReportStore::new());
    let orchestrator = ReportOrchestrator::with_standard_tasks(store, config)?;

    let status = orchestrator.create_report(&hash, &source).await?;
    info!(status = %status, "report call finished");

    let report = orchestrator
        .get_report(&hash)
        .await?
        .context("report missing after create")?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("forensic=info"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(true).with_target(true))
            .with(env_filter)
            .init();
    }
}

/// 128-bit content hash: SHA-256 truncated to the original record width.
fn hash_file(path: &PathBuf) -> anyhow::Result<ContentHash> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("cannot read source image {}", path.display()))?;
    let digest = Sha256::digest(&bytes);
    let hex: String = digest[..16].iter().map(|b| format!("{b:02x}")).collect();
    ContentHash::parse(&hex).context("digest is not a valid content hash")
}

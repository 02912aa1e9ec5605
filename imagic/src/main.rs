mod jobs;
mod settings;
use std::path::PathBuf;

use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load config first so we can honor logging.filter directive.
    let path = std::env::args_os().nth(1).map(PathBuf::from);
    let manager = settings::ConfigManager::load(path).await?;
    let cfg = manager.to_struct()?;
    let filter_directive = cfg
        .logging
        .as_ref()
        .and_then(|l| l.filter.clone())
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| "info,imagic=debug".to_string());
    fmt()
        .with_env_filter(EnvFilter::new(filter_directive))
        .init();
    tracing::info!(
        config = %manager.path().display(),
        stereograms = cfg.stereograms.len(),
        palettes = cfg.palettes.len(),
        "loaded config"
    );

    let mut failed = 0usize;
    for (id, job) in cfg.stereograms.iter() {
        if let Err(e) = jobs::run_stereogram(id, job).await {
            tracing::warn!(job = %id, error = %format!("{e:#}"), "autostereogram job failed");
            failed += 1;
        }
    }
    for (id, job) in cfg.palettes.iter() {
        if let Err(e) = jobs::run_palette(id, job).await {
            tracing::warn!(job = %id, error = %format!("{e:#}"), "palette job failed");
            failed += 1;
        }
    }
    if failed > 0 {
        anyhow::bail!("{failed} job(s) failed");
    }
    Ok(())
}

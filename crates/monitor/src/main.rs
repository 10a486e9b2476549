//! Proctor Monitor - Main Entry Point

use monitor::{init_logging, install_metrics, run, MonitorConfig};
use std::path::PathBuf;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = MonitorConfig::load(config_path.as_deref())?;
    init_logging(&config);

    info!("=== Proctor Monitor v{} ===", env!("CARGO_PKG_VERSION"));

    if let Some(addr) = config.metrics_addr {
        install_metrics(addr)?;
    }

    let report = run(config).await?;
    for (cause, count) in &report.incident_counts {
        info!("{}: {} incident(s)", cause, count);
    }

    Ok(())
}

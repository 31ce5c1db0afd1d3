//! Kubernetes operator for Zeebe clusters.

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use zeebe_operator::config::{Cli, Command};
use zeebe_operator::metrics::{self, Metrics};
use zeebe_operator::{controller, crd_yaml, telemetry};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.command == Some(Command::Crd) {
        print!("{}", crd_yaml()?);
        return Ok(());
    }

    let config = cli.config;
    telemetry::init(&config.log_level)?;
    info!(version = env!("CARGO_PKG_VERSION"), "Starting Zeebe operator");

    let client = kube::Client::try_default()
        .await
        .context("failed to create Kubernetes client")?;
    let metrics = Metrics::new().context("failed to register metrics")?;
    let cancel = CancellationToken::new();

    let server = tokio::spawn({
        let addr = config.metrics_addr.clone();
        let metrics = metrics.clone();
        let cancel = cancel.clone();
        async move {
            if let Err(e) = metrics::serve(&addr, metrics, cancel).await {
                error!(addr = %addr, "Metrics server failed: {e}");
            }
        }
    });

    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {e}");
                return;
            }
            info!("Shutdown signal received");
            cancel.cancel();
        }
    });

    controller::run(client, config, metrics, cancel.clone()).await;

    cancel.cancel();
    let _ = server.await;
    Ok(())
}

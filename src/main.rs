// main.rs

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;

use pbx_monitor::checks::Thresholds;
use pbx_monitor::client::PbxClient;
use pbx_monitor::config::Config;
use pbx_monitor::metrics::PbxMetrics;
use pbx_monitor::monitor::Monitor;
use pbx_monitor::reporter::HealthReporter;
use pbx_monitor::server;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init_from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "info"),
    );

    info!("Starting pbx-monitor version {}", env!("CARGO_PKG_VERSION"));

    let config = Config::parse();
    config.validate().context("Invalid configuration")?;

    let metrics = Arc::new(PbxMetrics::new().context("Failed to build metrics registry")?);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let server_metrics = metrics.clone();
    tokio::spawn(async move {
        if let Err(e) = server::start_metrics_server(addr, server_metrics).await {
            error!("Metrics server failed: {e:#}");
        }
    });

    // One session for the lifetime of the process. A failed login is not
    // fatal: every poll then fails as an acquisition error and is reported
    // to the health-check endpoint until the process is restarted.
    let client = PbxClient::new(&config.pbx_host, &config.pbx_user, &config.pbx_password)
        .context("Failed to build PBX client")?;
    if let Err(e) = client.login().await {
        warn!("Initial PBX login failed, polls will report failures: {e:#}");
    }

    let thresholds = Thresholds {
        min_extensions: config.pbx_min_extensions,
        min_trunks: config.pbx_min_trunks,
    };
    let reporter = HealthReporter::new(&config.hc_server, &config.hc_ping_uid);
    let monitor = Monitor::new(client, thresholds, metrics, reporter, config.poll_interval());

    match config.poll_interval() {
        Some(interval) => {
            info!("Polling PBX status every {}s", interval.as_secs());
            tokio::select! {
                _ = monitor.run() => {}
                _ = tokio::signal::ctrl_c() => {
                    info!("Shutdown signal received, stopping");
                }
            }
        }
        None => {
            info!("No INTERVAL_SEC configured, running a single check");
            monitor.run().await;
        }
    }

    Ok(())
}

// monitor.rs

use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::checks::{self, Thresholds, Verdict};
use crate::client::StatusSource;
use crate::metrics::PbxMetrics;
use crate::reporter::HealthReporter;

/// The poll loop. Each cycle fetches a status snapshot, evaluates it,
/// records metrics, and reports the outcome — strictly in that order, with
/// no overlap between cycles. With an interval it runs until shutdown;
/// without one it stops after a single cycle.
pub struct Monitor<S> {
    source: S,
    thresholds: Thresholds,
    metrics: Arc<PbxMetrics>,
    reporter: HealthReporter,
    interval: Option<Duration>,
}

impl<S: StatusSource> Monitor<S> {
    pub fn new(
        source: S,
        thresholds: Thresholds,
        metrics: Arc<PbxMetrics>,
        reporter: HealthReporter,
        interval: Option<Duration>,
    ) -> Self {
        Self {
            source,
            thresholds,
            metrics,
            reporter,
            interval,
        }
    }

    pub async fn run(&self) {
        loop {
            self.run_cycle().await;

            match self.interval {
                Some(interval) => {
                    debug!("Next poll in {}s", interval.as_secs());
                    tokio::time::sleep(interval).await;
                }
                None => {
                    info!("Single-shot mode, stopping after one cycle");
                    break;
                }
            }
        }
    }

    /// One full poll cycle. The fetch is timed into the poll histogram
    /// whether it succeeds or fails; metrics are only recorded from a
    /// snapshot that was actually acquired.
    pub async fn run_cycle(&self) -> Verdict {
        let started = Instant::now();
        let result = self.source.fetch_status().await;
        self.metrics.observe_poll(started.elapsed().as_secs_f64());

        let verdict = match result {
            Ok(status) => {
                let verdict = checks::evaluate(&status, &self.thresholds);
                self.metrics.record(&status);
                verdict
            }
            Err(e) => Verdict::Unhealthy(format!("{e:#}")),
        };

        match &verdict {
            Verdict::Healthy => info!("PBX healthy"),
            Verdict::Unhealthy(reason) => warn!("PBX unhealthy: {reason}"),
        }

        self.reporter.report(&verdict).await;
        verdict
    }
}

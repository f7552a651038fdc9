// config.rs

use anyhow::Result;
use clap::Parser;
use std::time::Duration;

/// Agent configuration. Every option is also readable from the environment,
/// which is the normal way to run this in a container.
#[derive(Parser, Debug, Clone)]
#[command(name = "pbx-monitor")]
#[command(about = "3CX PBX health-check and metrics agent")]
#[command(version)]
pub struct Config {
    /// Health-check endpoint base URL (e.g. https://hc-ping.com)
    #[arg(long, env = "HC_SERVER")]
    pub hc_server: String,

    /// Unique check identifier appended to the ping path
    #[arg(long, env = "HC_PING_UID")]
    pub hc_ping_uid: String,

    /// Poll interval in seconds; runs a single check when unset
    #[arg(long, env = "INTERVAL_SEC")]
    pub interval_sec: Option<u64>,

    /// PBX management API host or base URL
    #[arg(long, env = "PBX_HOST")]
    pub pbx_host: String,

    /// PBX API username
    #[arg(long, env = "PBX_USER")]
    pub pbx_user: String,

    /// PBX API password
    #[arg(long, env = "PBX_PASSWORD")]
    pub pbx_password: String,

    /// Minimum number of registered extensions expected
    #[arg(long, env = "PBX_MIN_EXTENSIONS")]
    pub pbx_min_extensions: Option<u64>,

    /// Minimum number of registered trunks expected
    #[arg(long, env = "PBX_MIN_TRUNKS")]
    pub pbx_min_trunks: Option<u64>,

    /// Metrics server listen port
    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.hc_server.trim().is_empty() {
            anyhow::bail!("HC_SERVER must not be empty");
        }
        if self.hc_ping_uid.trim().is_empty() {
            anyhow::bail!("HC_PING_UID must not be empty");
        }
        if self.pbx_host.trim().is_empty() {
            anyhow::bail!("PBX_HOST must not be empty");
        }
        if self.interval_sec == Some(0) {
            anyhow::bail!("INTERVAL_SEC must be a positive number of seconds");
        }
        Ok(())
    }

    /// None means single-shot mode: one cycle, then exit.
    pub fn poll_interval(&self) -> Option<Duration> {
        self.interval_sec.map(Duration::from_secs)
    }
}

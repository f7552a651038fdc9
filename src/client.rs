// client.rs

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use serde::Deserialize;

/// One point-in-time read of PBX system status, as reported by the
/// management API. Numeric fields are optional because their presence
/// varies across PBX versions; a missing field skips the corresponding
/// check and metric for the cycle instead of failing it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SystemStatus {
    #[serde(default)]
    pub activated: bool,
    pub calls_active: Option<u64>,
    pub extensions_total: Option<u64>,
    pub extensions_registered: Option<u64>,
    pub trunks_total: Option<u64>,
    pub trunks_registered: Option<u64>,
    pub cpu_usage: Option<f64>,
    pub disk_usage: Option<f64>,
    /// Virtual memory usage percent.
    pub memory_usage: Option<f64>,
    pub physical_memory_usage: Option<f64>,
    pub free_virtual_memory: Option<u64>,
    pub total_virtual_memory: Option<u64>,
    pub free_physical_memory: Option<u64>,
    pub total_physical_memory: Option<u64>,
    pub free_disk_space: Option<u64>,
    pub total_disk_space: Option<u64>,
    #[serde(default)]
    pub has_not_running_services: bool,
    #[serde(default)]
    pub has_unregistered_system_extensions: bool,
}

/// Source of status snapshots. The poll loop only depends on this trait,
/// so tests can drive it with a stub instead of a live PBX.
#[async_trait]
pub trait StatusSource {
    async fn fetch_status(&self) -> Result<SystemStatus>;
}

/// Client for the PBX management API. Authentication is a cookie session
/// established once with `login`; the session is reused for every poll and
/// never re-established (a dead session surfaces as an acquisition error
/// each cycle until the process is restarted).
pub struct PbxClient {
    http: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
}

impl PbxClient {
    pub fn new(host: &str, username: &str, password: &str) -> Result<Self> {
        let base_url = if host.starts_with("http://") || host.starts_with("https://") {
            host.trim_end_matches('/').to_string()
        } else {
            format!("https://{}", host.trim_end_matches('/'))
        };

        let http = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url,
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    /// Authenticate against the management API. The API answers the login
    /// POST with a plain `AuthSuccess` body and sets the session cookie.
    pub async fn login(&self) -> Result<()> {
        let url = format!("{}/api/login", self.base_url);
        debug!("Logging in to PBX at {url}");

        let response = self
            .http
            .post(&url)
            .json(&serde_json::json!({
                "Username": self.username,
                "Password": self.password,
            }))
            .send()
            .await
            .context("PBX login request failed")?
            .error_for_status()
            .context("PBX login rejected")?;

        let body = response.text().await.context("Failed to read login response")?;
        if body.trim() != "AuthSuccess" {
            anyhow::bail!("PBX authentication failed: {}", body.trim());
        }

        debug!("PBX login succeeded");
        Ok(())
    }
}

#[async_trait]
impl StatusSource for PbxClient {
    async fn fetch_status(&self) -> Result<SystemStatus> {
        let url = format!("{}/api/SystemStatus", self.base_url);
        debug!("Fetching system status from {url}");

        let status = self
            .http
            .get(&url)
            .send()
            .await
            .context("SystemStatus request failed")?
            .error_for_status()
            .context("SystemStatus request rejected")?
            .json::<SystemStatus>()
            .await
            .context("Failed to parse SystemStatus response")?;

        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_from_bare_host() {
        let client = PbxClient::new("pbx.example.com", "admin", "secret").unwrap();
        assert_eq!(client.base_url, "https://pbx.example.com");
    }

    #[test]
    fn test_base_url_keeps_explicit_scheme() {
        let client = PbxClient::new("http://10.0.0.5:5000/", "admin", "secret").unwrap();
        assert_eq!(client.base_url, "http://10.0.0.5:5000");
    }

    #[test]
    fn test_status_parses_partial_payload() {
        let status: SystemStatus = serde_json::from_str(
            r#"{"Activated": true, "CallsActive": 3, "CpuUsage": 12.5}"#,
        )
        .unwrap();
        assert!(status.activated);
        assert_eq!(status.calls_active, Some(3));
        assert_eq!(status.cpu_usage, Some(12.5));
        assert_eq!(status.trunks_registered, None);
        assert!(!status.has_not_running_services);
    }

    #[test]
    fn test_status_parses_full_payload() {
        let status: SystemStatus = serde_json::from_str(
            r#"{
                "Activated": true,
                "CallsActive": 2,
                "ExtensionsTotal": 20,
                "ExtensionsRegistered": 18,
                "TrunksTotal": 4,
                "TrunksRegistered": 4,
                "CpuUsage": 7.0,
                "DiskUsage": 41.0,
                "MemoryUsage": 55.0,
                "PhysicalMemoryUsage": 62.0,
                "FreeVirtualMemory": 1000,
                "TotalVirtualMemory": 4000,
                "FreePhysicalMemory": 500,
                "TotalPhysicalMemory": 2000,
                "FreeDiskSpace": 9000,
                "TotalDiskSpace": 20000,
                "HasNotRunningServices": false,
                "HasUnregisteredSystemExtensions": true
            }"#,
        )
        .unwrap();
        assert_eq!(status.extensions_registered, Some(18));
        assert_eq!(status.total_disk_space, Some(20000));
        assert!(status.has_unregistered_system_extensions);
    }
}

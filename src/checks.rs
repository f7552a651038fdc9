// checks.rs

use crate::client::SystemStatus;

/// Fixed resource-usage ceilings, in percent. Only the extension and trunk
/// minimums are operator-configurable.
pub const MAX_PHYSICAL_MEMORY_PERCENT: f64 = 75.0;
pub const MAX_CPU_PERCENT: f64 = 75.0;
pub const MAX_DISK_PERCENT: f64 = 75.0;

/// Configurable minimums, taken from the environment at startup.
#[derive(Debug, Clone, Copy, Default)]
pub struct Thresholds {
    pub min_extensions: Option<u64>,
    pub min_trunks: Option<u64>,
}

/// Outcome of evaluating one status snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Healthy,
    Unhealthy(String),
}

impl Verdict {
    pub fn is_healthy(&self) -> bool {
        matches!(self, Verdict::Healthy)
    }
}

/// Classify a snapshot as healthy or unhealthy. Checks run in order and
/// short-circuit on the first failure. Pure function: no I/O, no state.
/// A check whose input field is absent from the snapshot is skipped.
pub fn evaluate(status: &SystemStatus, thresholds: &Thresholds) -> Verdict {
    if !status.activated {
        return Verdict::Unhealthy("system not activated".to_string());
    }

    if let (Some(min), Some(registered)) = (thresholds.min_extensions, status.extensions_registered)
    {
        if registered < min {
            return Verdict::Unhealthy(format!(
                "expected at least {min} registered extensions, found {registered}"
            ));
        }
    }

    if status.has_not_running_services {
        return Verdict::Unhealthy("failed services reported".to_string());
    }

    if status.has_unregistered_system_extensions {
        return Verdict::Unhealthy("unregistered extension reported".to_string());
    }

    if let (Some(min), Some(registered)) = (thresholds.min_trunks, status.trunks_registered) {
        if registered < min {
            return Verdict::Unhealthy(format!(
                "expected at least {min} registered trunks, found {registered}"
            ));
        }
    }

    if let Some(usage) = status.physical_memory_usage {
        if usage > MAX_PHYSICAL_MEMORY_PERCENT {
            return Verdict::Unhealthy(format!("physical memory usage at {usage}%"));
        }
    }

    if let Some(usage) = status.cpu_usage {
        if usage > MAX_CPU_PERCENT {
            return Verdict::Unhealthy(format!("CPU usage at {usage}%"));
        }
    }

    if let Some(usage) = status.disk_usage {
        if usage > MAX_DISK_PERCENT {
            return Verdict::Unhealthy(format!("disk usage at {usage}%"));
        }
    }

    Verdict::Healthy
}

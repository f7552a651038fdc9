// metrics.rs

use anyhow::Result;
use prometheus::{
    Encoder, Gauge, Histogram, HistogramOpts, IntCounter, IntGauge, Registry, TextEncoder,
};

use crate::client::SystemStatus;

/// Current PBX telemetry as named Prometheus series. Owns its registry and
/// is shared by the poll loop (writer) and the metrics server (reader); each
/// series updates atomically, so a concurrent scrape never sees a torn value.
pub struct PbxMetrics {
    registry: Registry,

    /// Cumulative sum of active calls observed across all cycles.
    pub active_calls_counter: IntCounter,
    pub active_calls: IntGauge,
    pub cpu_usage: Gauge,
    pub disk_usage: Gauge,
    pub extensions_total: IntGauge,
    pub extensions_registered: IntGauge,
    pub trunks_total: IntGauge,
    pub trunks_registered: IntGauge,
    pub disk_free: IntGauge,
    pub disk_total: IntGauge,
    pub memory_physical_free: IntGauge,
    pub memory_physical_used: IntGauge,
    pub memory_physical_total: IntGauge,
    pub memory_virtual_free: IntGauge,
    pub memory_virtual_used: IntGauge,
    pub memory_virtual_total: IntGauge,
    pub polls: Histogram,
}

impl PbxMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let active_calls_counter = IntCounter::new(
            "pbx_active_calls_counter",
            "Cumulative count of active calls observed per poll",
        )?;
        let active_calls = IntGauge::new("pbx_active_calls", "Active calls at last poll")?;
        let cpu_usage = Gauge::new("pbx_cpu_usage", "CPU usage percent")?;
        let disk_usage = Gauge::new("pbx_disk_usage", "Disk usage percent")?;
        let extensions_total = IntGauge::new("pbx_extensions_total", "Total extensions")?;
        let extensions_registered =
            IntGauge::new("pbx_extensions_registered", "Registered extensions")?;
        let trunks_total = IntGauge::new("pbx_trunks_total", "Total trunks")?;
        let trunks_registered = IntGauge::new("pbx_trunks_registered", "Registered trunks")?;
        let disk_free = IntGauge::new("pbx_disk_free", "Free disk space in bytes")?;
        let disk_total = IntGauge::new("pbx_disk_total", "Total disk space in bytes")?;
        let memory_physical_free =
            IntGauge::new("pbx_memory_physical_free", "Free physical memory in bytes")?;
        let memory_physical_used =
            IntGauge::new("pbx_memory_physical_used", "Used physical memory in bytes")?;
        let memory_physical_total =
            IntGauge::new("pbx_memory_physical_total", "Total physical memory in bytes")?;
        let memory_virtual_free =
            IntGauge::new("pbx_memory_virtual_free", "Free virtual memory in bytes")?;
        let memory_virtual_used =
            IntGauge::new("pbx_memory_virtual_used", "Used virtual memory in bytes")?;
        let memory_virtual_total =
            IntGauge::new("pbx_memory_virtual_total", "Total virtual memory in bytes")?;
        let polls = Histogram::with_opts(HistogramOpts::new(
            "pbx_polls",
            "Duration of status polls in seconds",
        ))?;

        registry.register(Box::new(active_calls_counter.clone()))?;
        registry.register(Box::new(active_calls.clone()))?;
        registry.register(Box::new(cpu_usage.clone()))?;
        registry.register(Box::new(disk_usage.clone()))?;
        registry.register(Box::new(extensions_total.clone()))?;
        registry.register(Box::new(extensions_registered.clone()))?;
        registry.register(Box::new(trunks_total.clone()))?;
        registry.register(Box::new(trunks_registered.clone()))?;
        registry.register(Box::new(disk_free.clone()))?;
        registry.register(Box::new(disk_total.clone()))?;
        registry.register(Box::new(memory_physical_free.clone()))?;
        registry.register(Box::new(memory_physical_used.clone()))?;
        registry.register(Box::new(memory_physical_total.clone()))?;
        registry.register(Box::new(memory_virtual_free.clone()))?;
        registry.register(Box::new(memory_virtual_used.clone()))?;
        registry.register(Box::new(memory_virtual_total.clone()))?;
        registry.register(Box::new(polls.clone()))?;

        Ok(Self {
            registry,
            active_calls_counter,
            active_calls,
            cpu_usage,
            disk_usage,
            extensions_total,
            extensions_registered,
            trunks_total,
            trunks_registered,
            disk_free,
            disk_total,
            memory_physical_free,
            memory_physical_used,
            memory_physical_total,
            memory_virtual_free,
            memory_virtual_used,
            memory_virtual_total,
            polls,
        })
    }

    /// Project a snapshot onto the series. Missing fields skip their series
    /// for this cycle; recording never fails the poll.
    pub fn record(&self, status: &SystemStatus) {
        if let Some(calls) = status.calls_active {
            self.active_calls_counter.inc_by(calls);
            self.active_calls.set(calls as i64);
        }
        if let Some(v) = status.cpu_usage {
            self.cpu_usage.set(v);
        }
        if let Some(v) = status.disk_usage {
            self.disk_usage.set(v);
        }
        if let Some(v) = status.extensions_total {
            self.extensions_total.set(v as i64);
        }
        if let Some(v) = status.extensions_registered {
            self.extensions_registered.set(v as i64);
        }
        if let Some(v) = status.trunks_total {
            self.trunks_total.set(v as i64);
        }
        if let Some(v) = status.trunks_registered {
            self.trunks_registered.set(v as i64);
        }
        if let Some(free) = status.free_disk_space {
            self.disk_free.set(free as i64);
            if let Some(total) = status.total_disk_space {
                self.disk_total.set(total as i64);
            }
        }
        if let Some(free) = status.free_physical_memory {
            self.memory_physical_free.set(free as i64);
            if let Some(total) = status.total_physical_memory {
                self.memory_physical_total.set(total as i64);
                self.memory_physical_used.set(total.saturating_sub(free) as i64);
            }
        }
        if let Some(free) = status.free_virtual_memory {
            self.memory_virtual_free.set(free as i64);
            if let Some(total) = status.total_virtual_memory {
                self.memory_virtual_total.set(total as i64);
                self.memory_virtual_used.set(total.saturating_sub(free) as i64);
            }
        }
    }

    /// Record how long a status poll took, whether or not it succeeded.
    pub fn observe_poll(&self, seconds: f64) {
        self.polls.observe(seconds);
    }

    /// Render the registry in the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

//! Metrics Collection
//!
//! Collects and exposes metrics for monitoring the monitor itself.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Metrics collector for the monitor
#[derive(Default)]
pub struct Metrics {
    /// Start time for uptime calculation
    start_time: Option<Instant>,

    /// Completed sync cycles
    pub sync_cycles: AtomicU64,

    /// REST calls made to the node
    pub remote_calls: AtomicU64,

    /// REST calls that yielded no data
    pub remote_failures: AtomicU64,

    /// Accepted configuration documents
    pub configs_applied: AtomicU64,

    /// Rejected configuration documents
    pub configs_rejected: AtomicU64,

    /// Current reconciled neighbor count
    pub neighbor_count: AtomicU64,

    /// Last-known round duration (milliseconds)
    pub round_duration_ms: AtomicU64,
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> Self {
        Self {
            start_time: Some(Instant::now()),
            ..Default::default()
        }
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time
            .map(|t| t.elapsed().as_secs())
            .unwrap_or(0)
    }

    /// Increment completed sync cycles
    pub fn inc_sync_cycles(&self) {
        self.sync_cycles.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment REST calls made
    pub fn inc_remote_calls(&self) {
        self.remote_calls.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment failed REST calls
    pub fn inc_remote_failures(&self) {
        self.remote_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment accepted configurations
    pub fn inc_configs_applied(&self) {
        self.configs_applied.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment rejected configurations
    pub fn inc_configs_rejected(&self) {
        self.configs_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Update reconciled neighbor count
    pub fn set_neighbor_count(&self, count: u64) {
        self.neighbor_count.store(count, Ordering::Relaxed);
    }

    /// Update last-known round duration
    pub fn set_round_duration_ms(&self, millis: u64) {
        self.round_duration_ms.store(millis, Ordering::Relaxed);
    }

    /// Export metrics in Prometheus format
    pub fn to_prometheus(&self) -> String {
        let mut output = String::new();

        // Uptime
        output.push_str(&format!(
            "# HELP ict_monitor_uptime_seconds Monitor uptime in seconds\n\
             # TYPE ict_monitor_uptime_seconds gauge\n\
             ict_monitor_uptime_seconds {}\n\n",
            self.uptime_secs()
        ));

        // Sync activity
        output.push_str(&format!(
            "# HELP ict_monitor_sync_cycles_total Completed sync cycles\n\
             # TYPE ict_monitor_sync_cycles_total counter\n\
             ict_monitor_sync_cycles_total {}\n\n",
            self.sync_cycles.load(Ordering::Relaxed)
        ));

        output.push_str(&format!(
            "# HELP ict_monitor_remote_calls_total REST calls made to the node\n\
             # TYPE ict_monitor_remote_calls_total counter\n\
             ict_monitor_remote_calls_total {}\n\n",
            self.remote_calls.load(Ordering::Relaxed)
        ));

        output.push_str(&format!(
            "# HELP ict_monitor_remote_failures_total REST calls that yielded no data\n\
             # TYPE ict_monitor_remote_failures_total counter\n\
             ict_monitor_remote_failures_total {}\n\n",
            self.remote_failures.load(Ordering::Relaxed)
        ));

        // Configuration
        output.push_str(&format!(
            "# HELP ict_monitor_configs_applied_total Accepted configuration documents\n\
             # TYPE ict_monitor_configs_applied_total counter\n\
             ict_monitor_configs_applied_total {}\n\n",
            self.configs_applied.load(Ordering::Relaxed)
        ));

        output.push_str(&format!(
            "# HELP ict_monitor_configs_rejected_total Rejected configuration documents\n\
             # TYPE ict_monitor_configs_rejected_total counter\n\
             ict_monitor_configs_rejected_total {}\n\n",
            self.configs_rejected.load(Ordering::Relaxed)
        ));

        // Node state
        output.push_str(&format!(
            "# HELP ict_monitor_neighbor_count Reconciled neighbor count\n\
             # TYPE ict_monitor_neighbor_count gauge\n\
             ict_monitor_neighbor_count {}\n\n",
            self.neighbor_count.load(Ordering::Relaxed)
        ));

        output.push_str(&format!(
            "# HELP ict_monitor_round_duration_ms Last-known node round duration\n\
             # TYPE ict_monitor_round_duration_ms gauge\n\
             ict_monitor_round_duration_ms {}\n\n",
            self.round_duration_ms.load(Ordering::Relaxed)
        ));

        output
    }

    /// Export metrics as JSON
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "uptime_secs": self.uptime_secs(),
            "sync": {
                "cycles": self.sync_cycles.load(Ordering::Relaxed),
                "remote_calls": self.remote_calls.load(Ordering::Relaxed),
                "remote_failures": self.remote_failures.load(Ordering::Relaxed),
            },
            "configs": {
                "applied": self.configs_applied.load(Ordering::Relaxed),
                "rejected": self.configs_rejected.load(Ordering::Relaxed),
            },
            "node": {
                "neighbor_count": self.neighbor_count.load(Ordering::Relaxed),
                "round_duration_ms": self.round_duration_ms.load(Ordering::Relaxed),
            },
        })
    }
}

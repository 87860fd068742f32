//! Prometheus metrics for the relay.
//!
//! Metrics live in a process-wide [`REGISTRY`] and are only recorded once
//! [`init_metrics`] has been called; until then [`relay_metrics`] is `None`
//! and instrumented code skips recording.

use prometheus::{
    Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};
use std::sync::{LazyLock, OnceLock};

pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static METRICS: OnceLock<RelayMetrics> = OnceLock::new();

/// Counters and gauges for both relay roles
#[derive(Debug, Clone)]
pub struct RelayMetrics {
    pub packets_received: IntCounterVec,
    pub packets_forwarded: IntCounter,
    pub packets_denied: IntCounter,
    pub packets_undecodable: IntCounterVec,
    pub replies_relayed: IntCounter,
    pub accounting_records: IntCounter,
    pub sessions_active: IntGauge,
    pub reloads: IntCounter,
}

impl RelayMetrics {
    /// Create the metric set and register it with `registry`.
    pub fn register(registry: &Registry) -> Result<Self, prometheus::Error> {
        let packets_received = IntCounterVec::new(
            Opts::new(
                "radgate_packets_received_total",
                "Datagrams read from the public socket",
            ),
            &["role"],
        )?;
        registry.register(Box::new(packets_received.clone()))?;

        let packets_forwarded = IntCounter::with_opts(Opts::new(
            "radgate_packets_forwarded_total",
            "Datagrams forwarded upstream",
        ))?;
        registry.register(Box::new(packets_forwarded.clone()))?;

        let packets_denied = IntCounter::with_opts(Opts::new(
            "radgate_packets_denied_total",
            "Datagrams dropped by a pre-authorization plugin",
        ))?;
        registry.register(Box::new(packets_denied.clone()))?;

        let packets_undecodable = IntCounterVec::new(
            Opts::new(
                "radgate_packets_undecodable_total",
                "Datagrams that failed to decode with the shared secret",
            ),
            &["role"],
        )?;
        registry.register(Box::new(packets_undecodable.clone()))?;

        let replies_relayed = IntCounter::with_opts(Opts::new(
            "radgate_replies_relayed_total",
            "Upstream replies relayed back to clients",
        ))?;
        registry.register(Box::new(replies_relayed.clone()))?;

        let accounting_records = IntCounter::with_opts(Opts::new(
            "radgate_accounting_records_total",
            "Accounting packets dispatched to plugins",
        ))?;
        registry.register(Box::new(accounting_records.clone()))?;

        let sessions_active = IntGauge::with_opts(Opts::new(
            "radgate_sessions_active",
            "Entries in the connection table",
        ))?;
        registry.register(Box::new(sessions_active.clone()))?;

        let reloads = IntCounter::with_opts(Opts::new(
            "radgate_reloads_total",
            "Reload signals handled",
        ))?;
        registry.register(Box::new(reloads.clone()))?;

        Ok(Self {
            packets_received,
            packets_forwarded,
            packets_denied,
            packets_undecodable,
            replies_relayed,
            accounting_records,
            sessions_active,
            reloads,
        })
    }

    pub fn record_received(&self, role: &str) {
        self.packets_received.with_label_values(&[role]).inc();
    }

    pub fn record_undecodable(&self, role: &str) {
        self.packets_undecodable.with_label_values(&[role]).inc();
    }
}

/// Register the relay metrics with [`REGISTRY`]. Idempotent.
pub fn init_metrics() -> Result<&'static RelayMetrics, prometheus::Error> {
    if let Some(metrics) = METRICS.get() {
        return Ok(metrics);
    }
    let metrics = RelayMetrics::register(&REGISTRY)?;
    Ok(METRICS.get_or_init(|| metrics))
}

pub fn metrics_enabled() -> bool {
    METRICS.get().is_some()
}

pub fn relay_metrics() -> Option<&'static RelayMetrics> {
    METRICS.get()
}

/// Render [`REGISTRY`] in the Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&REGISTRY.gather(), &mut buffer) {
        tracing::warn!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_record() {
        let registry = Registry::new();
        let metrics = RelayMetrics::register(&registry).unwrap();
        metrics.record_received("auth");
        metrics.record_received("auth");
        metrics.record_undecodable("accounting");
        metrics.sessions_active.set(3);

        assert_eq!(metrics.packets_received.with_label_values(&["auth"]).get(), 2);
        assert_eq!(metrics.sessions_active.get(), 3);
        assert!(RelayMetrics::register(&registry).is_err());
    }

    #[test]
    fn test_gather_after_init() {
        let metrics = init_metrics().unwrap();
        assert!(metrics_enabled());
        metrics.reloads.inc();
        let text = gather_metrics();
        assert!(text.contains("radgate_reloads_total"));
        assert!(init_metrics().is_ok());
    }
}

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, LoggingConfig};
pub use metrics::{
    gather_metrics, init_metrics, metrics_enabled, relay_metrics, RelayMetrics, REGISTRY,
};

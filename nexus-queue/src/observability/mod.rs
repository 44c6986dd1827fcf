pub mod metrics;
pub mod analytics;

pub use metrics::{LiveMetrics, MetricsSnapshot, TaskMetrics};
pub use analytics::ObservabilityLayer;

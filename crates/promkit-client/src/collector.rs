//! The registry-facing collector interface.
//!
//! Every built-in metric implements [`Collector`] through
//! [`Family`](crate::family::Family); external collectors (process stats,
//! bridges to other libraries) implement it directly and are registered with
//! [`CollectorRegistry::register`](crate::registry::CollectorRegistry::register).

use promkit_core::writer::{MetricType, MetricsWriter};
use promkit_core::Result;

/// Type and label schema of a collector. Two registrations under one name
/// are compatible only if their shapes are equal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectorShape {
    pub metric_type: MetricType,
    pub label_names: Vec<String>,
}

pub trait Collector: Send + Sync {
    /// Metric name; the registry key.
    fn name(&self) -> &str;

    fn shape(&self) -> CollectorShape;

    /// Write the current state of every instance.
    fn collect(&self, writer: &mut dyn MetricsWriter) -> Result<()>;
}

//! Exposition protocol.
//!
//! A scrape drives a [`MetricsWriter`] through a fixed call sequence per
//! metric:
//!
//! ```text
//! start_metric(name)
//!   write_help(help)
//!   write_type(type)
//!   ( start_sample(suffix)
//!       [ start_labels  write_label*  end_labels ]
//!       write_value  [ write_timestamp ]
//!     end_sample )*
//! end_metric
//! ```
//!
//! Consumers parse by position as well as by label, so collectors must emit
//! histogram buckets in ascending order (then `_sum`, `_count`) and summary
//! quantiles in ascending order (then `_sum`, `_count`).

mod format;
mod text;

pub use format::{escape_help, escape_label_value, format_value};
pub use text::{TextWriter, TEXT_CONTENT_TYPE};

use crate::error::Result;
use crate::labels::LabelSet;

/// Metric type tag written in `# TYPE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricType {
    Counter,
    Gauge,
    Untyped,
    Histogram,
    Summary,
}

impl MetricType {
    pub fn as_str(self) -> &'static str {
        match self {
            MetricType::Counter => "counter",
            MetricType::Gauge => "gauge",
            MetricType::Untyped => "untyped",
            MetricType::Histogram => "histogram",
            MetricType::Summary => "summary",
        }
    }
}

/// Streaming sink for one exposition document.
///
/// Errors from the underlying sink are returned unchanged; the core does not
/// retry or buffer on failure.
pub trait MetricsWriter {
    fn start_metric(&mut self, name: &str) -> Result<()>;
    fn write_help(&mut self, help: &str) -> Result<()>;
    fn write_type(&mut self, metric_type: MetricType) -> Result<()>;

    fn start_sample(&mut self, suffix: &str) -> Result<()>;
    fn start_labels(&mut self) -> Result<()>;
    fn write_label(&mut self, name: &str, value: &str) -> Result<()>;
    fn end_labels(&mut self) -> Result<()>;
    fn write_value(&mut self, value: f64) -> Result<()>;
    /// Milliseconds since the Unix epoch.
    fn write_timestamp(&mut self, timestamp_ms: i64) -> Result<()>;
    fn end_sample(&mut self) -> Result<()>;

    fn end_metric(&mut self) -> Result<()>;

    /// Push buffered output to the sink.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Write the metric header (`start_metric`, help, type).
pub fn write_header(
    writer: &mut dyn MetricsWriter,
    name: &str,
    help: &str,
    metric_type: MetricType,
) -> Result<()> {
    writer.start_metric(name)?;
    writer.write_help(help)?;
    writer.write_type(metric_type)
}

/// Write one complete sample line.
///
/// `extra` is the reserved `le`/`quantile` pair; it follows the instance's
/// own labels. The label block is skipped entirely when there is nothing to
/// write.
pub fn write_sample(
    writer: &mut dyn MetricsWriter,
    suffix: &str,
    labels: &LabelSet,
    extra: Option<(&str, &str)>,
    value: f64,
    timestamp_ms: Option<i64>,
) -> Result<()> {
    writer.start_sample(suffix)?;
    if !labels.is_empty() || extra.is_some() {
        writer.start_labels()?;
        for (name, val) in labels.iter() {
            writer.write_label(name, val)?;
        }
        if let Some((name, val)) = extra {
            writer.write_label(name, val)?;
        }
        writer.end_labels()?;
    }
    writer.write_value(value)?;
    if let Some(ts) = timestamp_ms {
        writer.write_timestamp(ts)?;
    }
    writer.end_sample()
}

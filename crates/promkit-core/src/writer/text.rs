//! Text exposition format (version 0.0.4).

use std::io::Write;

use super::format::{escape_help, escape_label_value, format_value};
use super::{MetricType, MetricsWriter};
use crate::error::Result;

/// Content type a transport should attach to [`TextWriter`] output.
pub const TEXT_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// [`MetricsWriter`] rendering the Prometheus text format into any
/// `io::Write`. Output is written through as calls arrive; wrap the sink in a
/// `BufWriter` if it needs batching.
pub struct TextWriter<W: Write> {
    out: W,
    metric: String,
    first_label: bool,
}

impl<W: Write> TextWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            metric: String::new(),
            first_label: true,
        }
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> MetricsWriter for TextWriter<W> {
    fn start_metric(&mut self, name: &str) -> Result<()> {
        self.metric.clear();
        self.metric.push_str(name);
        Ok(())
    }

    fn write_help(&mut self, help: &str) -> Result<()> {
        if help.is_empty() {
            return Ok(());
        }
        writeln!(self.out, "# HELP {} {}", self.metric, escape_help(help))?;
        Ok(())
    }

    fn write_type(&mut self, metric_type: MetricType) -> Result<()> {
        writeln!(self.out, "# TYPE {} {}", self.metric, metric_type.as_str())?;
        Ok(())
    }

    fn start_sample(&mut self, suffix: &str) -> Result<()> {
        debug_assert!(!self.metric.is_empty(), "start_sample outside of a metric");
        self.out.write_all(self.metric.as_bytes())?;
        self.out.write_all(suffix.as_bytes())?;
        Ok(())
    }

    fn start_labels(&mut self) -> Result<()> {
        self.first_label = true;
        self.out.write_all(b"{")?;
        Ok(())
    }

    fn write_label(&mut self, name: &str, value: &str) -> Result<()> {
        if !self.first_label {
            self.out.write_all(b",")?;
        }
        self.first_label = false;
        write!(self.out, "{}=\"{}\"", name, escape_label_value(value))?;
        Ok(())
    }

    fn end_labels(&mut self) -> Result<()> {
        self.out.write_all(b"}")?;
        Ok(())
    }

    fn write_value(&mut self, value: f64) -> Result<()> {
        write!(self.out, " {}", format_value(value))?;
        Ok(())
    }

    fn write_timestamp(&mut self, timestamp_ms: i64) -> Result<()> {
        write!(self.out, " {timestamp_ms}")?;
        Ok(())
    }

    fn end_sample(&mut self) -> Result<()> {
        self.out.write_all(b"\n")?;
        Ok(())
    }

    fn end_metric(&mut self) -> Result<()> {
        self.metric.clear();
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

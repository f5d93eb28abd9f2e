//! Histogram with fixed bucket upper bounds.
//!
//! Each observation lands in exactly one slot (the first bound `>=` value,
//! or the implicit `+Inf` slot); cumulative counts are the running sum of the
//! slots, computed while reading. A concurrent reader therefore always sees
//! non-decreasing buckets with `+Inf == _count`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use promkit_core::error::{PromError, Result};
use promkit_core::labels::BUCKET_LABEL;
use promkit_core::writer::{format_value, write_sample, MetricType, MetricsWriter};
use promkit_core::AtomicF64;

use crate::family::{Family, InstanceCore, Labelled, MetricOpts};

pub type Histogram = Family<LabelledHistogram>;

/// `.005 .01 .025 .05 .075 .1 .25 .5 .75 1 2.5 5 7.5 10`
pub const DEFAULT_BUCKETS: [f64; 14] = [
    0.005, 0.01, 0.025, 0.05, 0.075, 0.1, 0.25, 0.5, 0.75, 1.0, 2.5, 5.0, 7.5, 10.0,
];

/// `count` buckets starting at `start`, each `width` wide.
pub fn linear_buckets(start: f64, width: f64, count: usize) -> Result<Vec<f64>> {
    if count < 1 {
        return Err(PromError::InvalidArgument(
            "linear_buckets needs a positive count".into(),
        ));
    }
    if !(width > 0.0) {
        return Err(PromError::InvalidArgument(format!(
            "linear_buckets needs a positive width, got {width}"
        )));
    }
    Ok((0..count).map(|i| start + width * i as f64).collect())
}

/// `count` buckets starting at `start`, each `factor` times the previous.
pub fn exponential_buckets(start: f64, factor: f64, count: usize) -> Result<Vec<f64>> {
    if count < 1 {
        return Err(PromError::InvalidArgument(
            "exponential_buckets needs a positive count".into(),
        ));
    }
    if !(start > 0.0) {
        return Err(PromError::InvalidArgument(format!(
            "exponential_buckets needs a positive start, got {start}"
        )));
    }
    if !(factor > 1.0) {
        return Err(PromError::InvalidArgument(format!(
            "exponential_buckets needs a factor greater than 1, got {factor}"
        )));
    }
    let mut out = Vec::with_capacity(count);
    let mut bound = start;
    for _ in 0..count {
        out.push(bound);
        bound *= factor;
    }
    Ok(out)
}

/// Validated bucket layout shared by all instances of one histogram.
#[derive(Debug, Clone)]
pub struct HistogramConfig {
    bounds: Arc<[f64]>,
    /// Pre-rendered `le` values.
    labels: Arc<[String]>,
}

impl HistogramConfig {
    /// Bounds must be strictly ascending and not NaN. A trailing `+Inf` is
    /// dropped; the `+Inf` bucket is always implicit.
    pub fn new(buckets: &[f64]) -> Result<Self> {
        let mut bounds = buckets.to_vec();
        if bounds.last() == Some(&f64::INFINITY) {
            bounds.pop();
        }
        if let Some(nan) = bounds.iter().position(|b| b.is_nan()) {
            return Err(PromError::InvalidArgument(format!(
                "histogram bucket #{nan} is NaN"
            )));
        }
        if let Some(w) = bounds.windows(2).find(|w| w[0] >= w[1]) {
            return Err(PromError::InvalidArgument(format!(
                "histogram buckets must be strictly ascending ({} then {})",
                w[0], w[1]
            )));
        }

        let labels = bounds.iter().map(|b| format_value(*b)).collect();
        Ok(Self {
            bounds: bounds.into(),
            labels,
        })
    }

    /// Upper bounds, without the implicit `+Inf`.
    pub fn bounds(&self) -> &[f64] {
        &self.bounds
    }
}

/// Options for [`MetricFactory::create_histogram_with`](crate::MetricFactory::create_histogram_with).
#[derive(Debug, Clone)]
pub struct HistogramOpts {
    pub common: MetricOpts,
    pub buckets: Vec<f64>,
}

impl HistogramOpts {
    pub fn new(buckets: impl Into<Vec<f64>>) -> Self {
        Self {
            common: MetricOpts::default(),
            buckets: buckets.into(),
        }
    }

    pub fn include_timestamp(mut self, on: bool) -> Self {
        self.common.include_timestamp = on;
        self
    }

    pub fn suppress_empty(mut self, on: bool) -> Self {
        self.common.suppress_empty = on;
        self
    }

    pub(crate) fn to_config(&self) -> Result<HistogramConfig> {
        HistogramConfig::new(&self.buckets)
    }
}

impl Default for HistogramOpts {
    fn default() -> Self {
        Self::new(DEFAULT_BUCKETS)
    }
}

/// Point-in-time read of one instance.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramSnapshot {
    /// Cumulative count per explicit bound, ascending.
    pub buckets: Vec<u64>,
    pub count: u64,
    pub sum: f64,
}

#[derive(Debug)]
pub struct LabelledHistogram {
    core: InstanceCore,
    config: HistogramConfig,
    /// One slot per bound plus the `+Inf` slot.
    slots: Box<[AtomicU64]>,
    sum: AtomicF64,
}

impl LabelledHistogram {
    pub fn observe(&self, value: f64) {
        let bounds = self.config.bounds();
        let slot = if value.is_nan() {
            bounds.len()
        } else {
            bounds.partition_point(|b| *b < value)
        };
        self.slots[slot].fetch_add(1, Ordering::AcqRel);
        self.sum.add(value);
        self.core.mark_updated();
    }

    /// Count `value` `n` times at once.
    pub fn observe_n(&self, value: f64, n: u64) {
        if n == 0 {
            return;
        }
        let bounds = self.config.bounds();
        let slot = if value.is_nan() {
            bounds.len()
        } else {
            bounds.partition_point(|b| *b < value)
        };
        self.slots[slot].fetch_add(n, Ordering::AcqRel);
        self.sum.add(value * n as f64);
        self.core.mark_updated();
    }

    pub fn snapshot(&self) -> HistogramSnapshot {
        let mut buckets = Vec::with_capacity(self.config.bounds().len());
        let mut cumulative = 0u64;
        for (i, slot) in self.slots.iter().enumerate() {
            cumulative += slot.load(Ordering::Acquire);
            if i < self.config.bounds().len() {
                buckets.push(cumulative);
            }
        }
        HistogramSnapshot {
            buckets,
            count: cumulative,
            sum: self.sum.get(),
        }
    }

    pub fn count(&self) -> u64 {
        self.slots.iter().map(|s| s.load(Ordering::Acquire)).sum()
    }

    pub fn sum(&self) -> f64 {
        self.sum.get()
    }
}

impl Labelled for LabelledHistogram {
    type Config = HistogramConfig;

    const TYPE: MetricType = MetricType::Histogram;
    const RESERVED_LABELS: &'static [&'static str] = &[BUCKET_LABEL];

    fn create(config: &HistogramConfig, core: InstanceCore) -> Self {
        let slots = (0..=config.bounds().len())
            .map(|_| AtomicU64::new(0))
            .collect();
        Self {
            core,
            config: config.clone(),
            slots,
            sum: AtomicF64::new(0.0),
        }
    }

    fn core(&self) -> &InstanceCore {
        &self.core
    }

    fn collect(&self, writer: &mut dyn MetricsWriter) -> Result<()> {
        let snap = self.snapshot();
        let labels = self.core.labels();
        let ts = self.core.timestamp();

        for (count, le) in snap.buckets.iter().zip(self.config.labels.iter()) {
            write_sample(
                writer,
                "_bucket",
                labels,
                Some((BUCKET_LABEL, le)),
                *count as f64,
                ts,
            )?;
        }
        write_sample(
            writer,
            "_bucket",
            labels,
            Some((BUCKET_LABEL, "+Inf")),
            snap.count as f64,
            ts,
        )?;
        write_sample(writer, "_sum", labels, None, snap.sum, ts)?;
        write_sample(writer, "_count", labels, None, snap.count as f64, ts)
    }

    fn reset(&self) {
        for slot in self.slots.iter() {
            slot.store(0, Ordering::Release);
        }
        self.sum.set(0.0);
    }

    fn is_empty(&self) -> bool {
        self.count() == 0
    }
}

impl Family<LabelledHistogram> {
    pub fn observe(&self, value: f64) {
        self.unlabelled().observe(value);
    }

    pub fn observe_n(&self, value: f64, n: u64) {
        self.unlabelled().observe_n(value, n);
    }

    pub fn snapshot(&self) -> HistogramSnapshot {
        self.unlabelled().snapshot()
    }

    pub fn bounds(&self) -> &[f64] {
        self.config().bounds()
    }
}

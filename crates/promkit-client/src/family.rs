//! Collector framework: one metric name, its label schema, and every
//! per-label-combination instance.
//!
//! - The unlabelled instance always exists.
//! - Labelled instances are created lazily, exactly once per value tuple,
//!   and never removed. Lookups take a shared shard lock only; a miss
//!   falls through to `entry()`, which serializes concurrent creators of
//!   the same tuple so all of them get the same `Arc`.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use dashmap::DashMap;

use promkit_core::error::{PromError, Result};
use promkit_core::labels::{validate_label_names, validate_metric_name, LabelSet};
use promkit_core::writer::{write_header, MetricType, MetricsWriter};

use crate::collector::{Collector, CollectorShape};

/// Options shared by every metric type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricOpts {
    /// Append the time of the last update (ms since epoch) to each sample.
    pub include_timestamp: bool,
    /// Omit instances that hold no data (never-updated scalars,
    /// distributions with zero observations).
    pub suppress_empty: bool,
}

impl Default for MetricOpts {
    fn default() -> Self {
        Self {
            include_timestamp: false,
            suppress_empty: true,
        }
    }
}

/// Milliseconds since the Unix epoch (0 if the clock is before it).
pub(crate) fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// State common to every instance: its labels, whether it was ever
/// updated, and the time of the last update.
#[derive(Debug)]
pub struct InstanceCore {
    labels: LabelSet,
    include_timestamp: bool,
    touched: AtomicBool,
    updated_ms: AtomicI64,
}

impl InstanceCore {
    pub(crate) fn new(labels: LabelSet, include_timestamp: bool) -> Self {
        Self {
            labels,
            include_timestamp,
            touched: AtomicBool::new(false),
            updated_ms: AtomicI64::new(0),
        }
    }

    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    #[inline]
    pub(crate) fn mark_updated(&self) {
        self.touched.store(true, Ordering::Release);
        if self.include_timestamp {
            self.updated_ms.store(now_millis(), Ordering::Release);
        }
    }

    pub fn is_touched(&self) -> bool {
        self.touched.load(Ordering::Acquire)
    }

    /// Timestamp to emit, if tracking is on and the instance was updated.
    pub fn timestamp(&self) -> Option<i64> {
        if self.include_timestamp && self.is_touched() {
            Some(self.updated_ms.load(Ordering::Acquire))
        } else {
            None
        }
    }
}

/// Per-label-combination value holder of one metric type.
pub trait Labelled: Send + Sync + Sized + 'static {
    /// Type-specific settings shared by all instances (bucket bounds,
    /// quantile objectives, ...).
    type Config: Send + Sync + 'static;

    const TYPE: MetricType;

    /// Label names this type writes itself.
    const RESERVED_LABELS: &'static [&'static str] = &[];

    fn create(config: &Self::Config, core: InstanceCore) -> Self;

    fn core(&self) -> &InstanceCore;

    /// Write this instance's samples in wire order.
    fn collect(&self, writer: &mut dyn MetricsWriter) -> Result<()>;

    /// Back to the zero state; the instance itself survives.
    fn reset(&self);

    fn is_empty(&self) -> bool {
        !self.core().is_touched()
    }
}

/// A named metric with its label schema and instances.
pub struct Family<L: Labelled> {
    name: String,
    help: String,
    label_names: Arc<[String]>,
    opts: MetricOpts,
    config: L::Config,
    unlabelled: Arc<L>,
    labelled: DashMap<Vec<String>, Arc<L>>,
}

impl<L: Labelled> std::fmt::Debug for Family<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Family")
            .field("name", &self.name)
            .field("help", &self.help)
            .field("label_names", &self.label_names)
            .finish_non_exhaustive()
    }
}

impl<L: Labelled> Family<L> {
    /// Validate the name and label schema and build an unregistered
    /// collector. Most callers go through
    /// [`MetricFactory`](crate::factory::MetricFactory) instead.
    pub fn new(
        name: &str,
        help: &str,
        label_names: &[&str],
        opts: MetricOpts,
        config: L::Config,
    ) -> Result<Self> {
        validate_metric_name(name)?;
        let label_names = validate_label_names(label_names, L::RESERVED_LABELS)?;
        let unlabelled = Arc::new(L::create(
            &config,
            InstanceCore::new(LabelSet::empty(), opts.include_timestamp),
        ));

        Ok(Self {
            name: name.to_string(),
            help: help.to_string(),
            label_names,
            opts,
            config,
            unlabelled,
            labelled: DashMap::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn help(&self) -> &str {
        &self.help
    }

    pub fn label_names(&self) -> &[String] {
        &self.label_names
    }

    pub fn opts(&self) -> MetricOpts {
        self.opts
    }

    pub fn config(&self) -> &L::Config {
        &self.config
    }

    /// The instance without labels.
    pub fn unlabelled(&self) -> &Arc<L> {
        &self.unlabelled
    }

    /// The instance for `values` (in declared label order), created on
    /// first use. Calls with equal values return the same `Arc`.
    pub fn with_labels(&self, values: &[&str]) -> Result<Arc<L>> {
        if values.len() != self.label_names.len() {
            return Err(PromError::InvalidArgument(format!(
                "{}: expected {} label values, got {}",
                self.name,
                self.label_names.len(),
                values.len()
            )));
        }
        if values.is_empty() {
            return Ok(Arc::clone(&self.unlabelled));
        }

        let key: Vec<String> = values.iter().map(|v| v.to_string()).collect();
        if let Some(found) = self.labelled.get(&key) {
            return Ok(Arc::clone(found.value()));
        }

        let labels = LabelSet::new(Arc::clone(&self.label_names), key.clone())?;
        let instance = self
            .labelled
            .entry(key)
            .or_insert_with(|| {
                Arc::new(L::create(
                    &self.config,
                    InstanceCore::new(labels, self.opts.include_timestamp),
                ))
            })
            .value()
            .clone();
        Ok(instance)
    }

    /// Number of labelled instances created so far.
    pub fn labelled_count(&self) -> usize {
        self.labelled.len()
    }

    /// Zero every instance without removing any.
    pub fn reset(&self) {
        self.unlabelled.reset();
        for entry in self.labelled.iter() {
            entry.value().reset();
        }
    }

    fn emits_unlabelled(&self) -> bool {
        // With a label schema, the bare series only appears once used.
        if !self.label_names.is_empty() {
            return self.unlabelled.core().is_touched();
        }
        !(self.opts.suppress_empty && self.unlabelled.is_empty())
    }

    /// Labelled instances ordered by label values.
    fn sorted_instances(&self) -> Vec<Arc<L>> {
        let mut instances: Vec<Arc<L>> = self
            .labelled
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        instances.sort_by(|a, b| a.core().labels().values().cmp(b.core().labels().values()));
        instances
    }
}

impl<L: Labelled> Collector for Family<L> {
    fn name(&self) -> &str {
        &self.name
    }

    fn shape(&self) -> CollectorShape {
        CollectorShape {
            metric_type: L::TYPE,
            label_names: self.label_names.to_vec(),
        }
    }

    fn collect(&self, writer: &mut dyn MetricsWriter) -> Result<()> {
        write_header(writer, &self.name, &self.help, L::TYPE)?;

        if self.emits_unlabelled() {
            self.unlabelled.collect(writer)?;
        }
        for instance in self.sorted_instances() {
            if self.opts.suppress_empty && instance.is_empty() {
                continue;
            }
            instance.collect(writer)?;
        }

        writer.end_metric()
    }
}

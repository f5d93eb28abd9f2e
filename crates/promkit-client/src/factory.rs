//! Metric construction bound to a registry.
//!
//! `create_*` builds a collector and registers it through
//! [`CollectorRegistry::get_or_add`], so asking twice for the same metric
//! returns the first instance, while asking with another type or other label
//! names is a `Conflict`.

use std::sync::Arc;

use once_cell::sync::Lazy;

use promkit_core::error::Result;

use crate::config::ClientConfig;
use crate::family::{Family, Labelled, MetricOpts};
use crate::metrics::{
    Counter, Gauge, Histogram, HistogramOpts, Summary, SummaryOpts, Untyped,
};
use crate::registry::{default_registry, CollectorRegistry};

#[derive(Clone)]
pub struct MetricFactory {
    registry: Arc<CollectorRegistry>,
    defaults: MetricOpts,
    histogram: HistogramOpts,
    summary: SummaryOpts,
}

impl MetricFactory {
    pub fn new(registry: Arc<CollectorRegistry>) -> Self {
        Self {
            registry,
            defaults: MetricOpts::default(),
            histogram: HistogramOpts::default(),
            summary: SummaryOpts::default(),
        }
    }

    /// Factory whose defaults come from `config` (validated here).
    pub fn with_config(registry: Arc<CollectorRegistry>, config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            registry,
            defaults: config.metric_opts(),
            histogram: config.histogram_opts(),
            summary: config.summary_opts(),
        })
    }

    pub fn registry(&self) -> &Arc<CollectorRegistry> {
        &self.registry
    }

    pub fn create_counter(&self, name: &str, help: &str, labels: &[&str]) -> Result<Arc<Counter>> {
        self.create_counter_with(name, help, labels, self.defaults)
    }

    pub fn create_counter_with(
        &self,
        name: &str,
        help: &str,
        labels: &[&str],
        opts: MetricOpts,
    ) -> Result<Arc<Counter>> {
        self.add(Family::new(name, help, labels, opts, ())?)
    }

    pub fn create_gauge(&self, name: &str, help: &str, labels: &[&str]) -> Result<Arc<Gauge>> {
        self.create_gauge_with(name, help, labels, self.defaults)
    }

    pub fn create_gauge_with(
        &self,
        name: &str,
        help: &str,
        labels: &[&str],
        opts: MetricOpts,
    ) -> Result<Arc<Gauge>> {
        self.add(Family::new(name, help, labels, opts, ())?)
    }

    pub fn create_untyped(&self, name: &str, help: &str, labels: &[&str]) -> Result<Arc<Untyped>> {
        self.create_untyped_with(name, help, labels, self.defaults)
    }

    pub fn create_untyped_with(
        &self,
        name: &str,
        help: &str,
        labels: &[&str],
        opts: MetricOpts,
    ) -> Result<Arc<Untyped>> {
        self.add(Family::new(name, help, labels, opts, ())?)
    }

    /// Histogram with the factory's default buckets.
    pub fn create_histogram(
        &self,
        name: &str,
        help: &str,
        labels: &[&str],
    ) -> Result<Arc<Histogram>> {
        self.create_histogram_with(name, help, labels, self.histogram.clone())
    }

    pub fn create_histogram_with(
        &self,
        name: &str,
        help: &str,
        labels: &[&str],
        opts: HistogramOpts,
    ) -> Result<Arc<Histogram>> {
        let config = opts.to_config()?;
        self.add(Family::new(name, help, labels, opts.common, config)?)
    }

    /// Summary with the factory's default objectives and window.
    pub fn create_summary(&self, name: &str, help: &str, labels: &[&str]) -> Result<Arc<Summary>> {
        self.create_summary_with(name, help, labels, self.summary.clone())
    }

    pub fn create_summary_with(
        &self,
        name: &str,
        help: &str,
        labels: &[&str],
        opts: SummaryOpts,
    ) -> Result<Arc<Summary>> {
        let config = opts.to_config()?;
        self.add(Family::new(name, help, labels, opts.common, config)?)
    }

    fn add<L: Labelled>(&self, family: Family<L>) -> Result<Arc<Family<L>>> {
        self.registry.get_or_add(family)
    }
}

static DEFAULT_FACTORY: Lazy<MetricFactory> = Lazy::new(|| MetricFactory::new(default_registry()));

/// Factory over [`default_registry`], created on first use.
pub fn default_factory() -> &'static MetricFactory {
    &DEFAULT_FACTORY
}

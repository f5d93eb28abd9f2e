use std::time::Duration;

use serde::Deserialize;

use promkit_core::error::{PromError, Result};
use promkit_core::quantile::Objective;

use crate::family::MetricOpts;
use crate::metrics::histogram::{HistogramConfig, HistogramOpts, DEFAULT_BUCKETS};
use crate::metrics::summary::{
    default_objectives, SummaryConfig, SummaryOpts, DEFAULT_AGE_BUCKETS, DEFAULT_MAX_AGE,
};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    pub version: u32,

    #[serde(default)]
    pub defaults: DefaultsSection,

    #[serde(default)]
    pub histogram: HistogramSection,

    #[serde(default)]
    pub summary: SummarySection,
}

impl ClientConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(PromError::InvalidArgument(format!(
                "unsupported config version {}",
                self.version
            )));
        }
        self.histogram.validate()?;
        self.summary.validate()?;
        Ok(())
    }

    pub fn metric_opts(&self) -> MetricOpts {
        MetricOpts {
            include_timestamp: self.defaults.include_timestamp,
            suppress_empty: self.defaults.suppress_empty,
        }
    }

    pub fn histogram_opts(&self) -> HistogramOpts {
        HistogramOpts {
            common: self.metric_opts(),
            buckets: self.histogram.buckets.clone(),
        }
    }

    pub fn summary_opts(&self) -> SummaryOpts {
        SummaryOpts {
            common: self.metric_opts(),
            objectives: self.summary.to_objectives(),
            max_age: Duration::from_secs(self.summary.max_age_secs),
            age_buckets: self.summary.age_buckets,
            buffer_cap: self.summary.buffer_cap,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            version: 1,
            defaults: DefaultsSection::default(),
            histogram: HistogramSection::default(),
            summary: SummarySection::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DefaultsSection {
    #[serde(default)]
    pub include_timestamp: bool,

    #[serde(default = "default_suppress_empty")]
    pub suppress_empty: bool,
}

impl Default for DefaultsSection {
    fn default() -> Self {
        Self {
            include_timestamp: false,
            suppress_empty: default_suppress_empty(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HistogramSection {
    #[serde(default = "default_buckets")]
    pub buckets: Vec<f64>,
}

impl Default for HistogramSection {
    fn default() -> Self {
        Self {
            buckets: default_buckets(),
        }
    }
}

impl HistogramSection {
    pub fn validate(&self) -> Result<()> {
        HistogramConfig::new(&self.buckets)
            .map(|_| ())
            .map_err(|e| in_section("histogram.buckets", e))
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObjectiveEntry {
    pub quantile: f64,
    pub epsilon: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SummarySection {
    #[serde(default = "default_objective_entries")]
    pub objectives: Vec<ObjectiveEntry>,

    #[serde(default = "default_max_age_secs")]
    pub max_age_secs: u64,

    #[serde(default = "default_age_buckets")]
    pub age_buckets: usize,

    #[serde(default = "default_buffer_cap")]
    pub buffer_cap: usize,
}

impl Default for SummarySection {
    fn default() -> Self {
        Self {
            objectives: default_objective_entries(),
            max_age_secs: default_max_age_secs(),
            age_buckets: default_age_buckets(),
            buffer_cap: default_buffer_cap(),
        }
    }
}

impl SummarySection {
    /// Same checks a summary built from this section goes through.
    pub fn validate(&self) -> Result<()> {
        SummaryConfig::new(
            &self.to_objectives(),
            Duration::from_secs(self.max_age_secs),
            self.age_buckets,
            self.buffer_cap,
        )
        .map(|_| ())
        .map_err(|e| in_section("summary", e))
    }

    fn to_objectives(&self) -> Vec<Objective> {
        self.objectives
            .iter()
            .map(|o| Objective {
                quantile: o.quantile,
                epsilon: o.epsilon,
            })
            .collect()
    }
}

fn in_section(section: &str, err: PromError) -> PromError {
    match err {
        PromError::InvalidArgument(msg) => PromError::InvalidArgument(format!("{section}: {msg}")),
        other => other,
    }
}

fn default_suppress_empty() -> bool {
    true
}
fn default_buckets() -> Vec<f64> {
    DEFAULT_BUCKETS.to_vec()
}
fn default_objective_entries() -> Vec<ObjectiveEntry> {
    default_objectives()
        .into_iter()
        .map(|o| ObjectiveEntry {
            quantile: o.quantile,
            epsilon: o.epsilon,
        })
        .collect()
}
fn default_max_age_secs() -> u64 {
    DEFAULT_MAX_AGE.as_secs()
}
fn default_age_buckets() -> usize {
    DEFAULT_AGE_BUCKETS
}
fn default_buffer_cap() -> usize {
    promkit_core::quantile::DEFAULT_BUFFER_CAP
}

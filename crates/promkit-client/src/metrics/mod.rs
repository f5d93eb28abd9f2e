//! Built-in metric types.
//!
//! Each type is a [`Family`](crate::family::Family) over its per-label
//! instance type; the family forwards the instance API to its unlabelled
//! instance for convenience.

pub mod counter;
pub mod gauge;
pub mod histogram;
pub mod summary;
pub mod untyped;

pub use counter::{Counter, LabelledCounter};
pub use gauge::{Gauge, LabelledGauge};
pub use histogram::{
    exponential_buckets, linear_buckets, Histogram, HistogramConfig, HistogramOpts,
    HistogramSnapshot, LabelledHistogram, DEFAULT_BUCKETS,
};
pub use summary::{
    default_objectives, LabelledSummary, Summary, SummaryConfig, SummaryOpts, SummarySnapshot,
    DEFAULT_AGE_BUCKETS, DEFAULT_MAX_AGE,
};
pub use untyped::{LabelledUntyped, Untyped};

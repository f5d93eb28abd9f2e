//! promkit client: metric types, the collector registry, and the factory
//! that ties them together.
//!
//! ```text
//! MetricFactory --create_*--> CollectorRegistry --collect_all--> MetricsWriter
//!                                   |
//!                              Family<L> (Counter, Gauge, Untyped,
//!                                         Histogram, Summary)
//! ```
//!
//! Every collector owns one unlabelled instance plus lazily created labelled
//! instances. Updates are lock-free except for the summary window, which is
//! guarded per instance.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod collector;
pub mod config;
pub mod exposition;
pub mod factory;
pub mod family;
pub mod metrics;
pub mod registry;

pub use collector::{Collector, CollectorShape};
pub use exposition::{encode_text, write_text, TEXT_CONTENT_TYPE};
pub use factory::{default_factory, MetricFactory};
pub use family::{Family, Labelled, MetricOpts};
pub use metrics::*;
pub use registry::{default_registry, CollectorRegistry};

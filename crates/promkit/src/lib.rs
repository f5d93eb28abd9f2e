//! Top-level facade crate for promkit.
//!
//! Re-exports the core primitives and the client library so users can depend on a single crate.

pub mod core {
    pub use promkit_core::*;
}

pub mod client {
    pub use promkit_client::*;
}

pub use promkit_client::{
    default_factory, default_registry, encode_text, Collector, CollectorRegistry, Counter, Gauge,
    Histogram, HistogramOpts, MetricFactory, MetricOpts, Summary, SummaryOpts, Untyped,
    TEXT_CONTENT_TYPE,
};
pub use promkit_core::{PromError, Result};

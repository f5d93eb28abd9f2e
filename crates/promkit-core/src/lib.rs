//! promkit core: transport-agnostic metric primitives, error types, and the
//! exposition wire format.
//!
//! This crate defines the pieces shared by the client library and by any
//! external collector: the atomic numeric cell, label validation, the
//! streaming quantile sketch, and the `MetricsWriter` protocol with its text
//! encoder. It has no async runtime or transport dependencies so it can be
//! reused in multiple contexts.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Validation failures surface as `PromError`; internal invariants of the
//! sketch are guarded by `debug_assert!` only.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod labels;
pub mod quantile;
pub mod value;
pub mod writer;

pub use error::{ErrorCode, PromError, Result};
pub use labels::LabelSet;
pub use value::AtomicF64;
pub use writer::{MetricType, MetricsWriter, TextWriter};

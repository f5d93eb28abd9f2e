//! Streaming biased-quantile estimation.
//!
//! Implements the CKMS algorithm ("Effective Computation of Biased Quantiles
//! over Data Streams", Cormode, Korn, Muthukrishnan, Srivastava). The sketch
//! keeps a sorted list of `(value, width, delta)` samples and periodically
//! compresses neighbours whose combined rank uncertainty still fits the error
//! budget at that rank. The budget is given by an [`Invariant`].
//!
//! - [`SampleStream`]: the compressed sample list (merge / compress / query).
//! - [`QuantileStream`]: buffered front end for direct use; exact until the
//!   first flush.

mod buffered;
mod stream;

pub use buffered::{QuantileStream, DEFAULT_BUFFER_CAP};
pub use stream::SampleStream;

use crate::error::{PromError, Result};

/// One entry of the compressed list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub value: f64,
    /// Number of observations represented since the previous sample.
    pub width: f64,
    /// Upper bound on the rank uncertainty of this sample.
    pub delta: f64,
}

impl Sample {
    /// A single exact observation.
    pub fn point(value: f64) -> Self {
        Self {
            value,
            width: 1.0,
            delta: 0.0,
        }
    }
}

/// Maximum allowed rank uncertainty at `rank` for a stream of `n`
/// observations.
pub trait Invariant: Send + Sync {
    fn max_delta(&self, n: f64, rank: f64) -> f64;
}

/// Uniform relative error `epsilon` on low ranks.
#[derive(Debug, Clone, Copy)]
pub struct LowBiased {
    pub epsilon: f64,
}

impl Invariant for LowBiased {
    fn max_delta(&self, _n: f64, rank: f64) -> f64 {
        2.0 * self.epsilon * rank
    }
}

/// Uniform relative error `epsilon` on high ranks.
#[derive(Debug, Clone, Copy)]
pub struct HighBiased {
    pub epsilon: f64,
}

impl Invariant for HighBiased {
    fn max_delta(&self, n: f64, rank: f64) -> f64 {
        2.0 * self.epsilon * (n - rank)
    }
}

/// A quantile of interest with its allowed absolute rank error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Objective {
    pub quantile: f64,
    pub epsilon: f64,
}

impl Objective {
    pub fn new(quantile: f64, epsilon: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&quantile) {
            return Err(PromError::InvalidArgument(format!(
                "quantile {quantile} must be within [0, 1]"
            )));
        }
        if !(0.0..=1.0).contains(&epsilon) {
            return Err(PromError::InvalidArgument(format!(
                "epsilon {epsilon} for quantile {quantile} must be within [0, 1]"
            )));
        }
        Ok(Self { quantile, epsilon })
    }
}

/// Error targets for a fixed set of quantiles; the tightest target wins at
/// every rank.
#[derive(Debug, Clone, Default)]
pub struct Targeted {
    objectives: Vec<Objective>,
}

impl Targeted {
    pub fn new(mut objectives: Vec<Objective>) -> Self {
        objectives.sort_by(|a, b| a.quantile.total_cmp(&b.quantile));
        Self { objectives }
    }

    /// Objectives sorted by quantile.
    pub fn objectives(&self) -> &[Objective] {
        &self.objectives
    }
}

impl Invariant for Targeted {
    fn max_delta(&self, n: f64, rank: f64) -> f64 {
        let mut m = f64::MAX;
        for o in &self.objectives {
            let f = if o.quantile * n <= rank {
                (2.0 * o.epsilon * rank) / o.quantile
            } else {
                (2.0 * o.epsilon * (n - rank)) / (1.0 - o.quantile)
            };
            // NaN (0/0 at the extremes) never tightens the bound.
            if f < m {
                m = f;
            }
        }
        m
    }
}

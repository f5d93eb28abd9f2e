//! Compressed sample list.

use super::{Invariant, Sample};

/// Sorted, compressed sample list over `n` observations.
///
/// Invariants: samples are ascending by value and their widths sum to `n`.
#[derive(Debug, Clone)]
pub struct SampleStream<I> {
    invariant: I,
    n: f64,
    samples: Vec<Sample>,
}

impl<I: Invariant> SampleStream<I> {
    pub fn new(invariant: I) -> Self {
        Self {
            invariant,
            n: 0.0,
            samples: Vec::new(),
        }
    }

    /// Total observation count.
    pub fn count(&self) -> u64 {
        self.n as u64
    }

    /// Number of retained samples (after compression).
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn invariant(&self) -> &I {
        &self.invariant
    }

    pub fn observe(&mut self, value: f64) {
        self.merge(&[Sample::point(value)]);
    }

    /// Fold an ascending batch of samples into the list, then compress.
    ///
    /// Merging another sketch's samples is only an approximation: the
    /// algorithm defines insertion of single observations, and deltas of
    /// foreign samples are carried over without being re-derived against
    /// this stream's ranks. The resulting quantiles can exceed the declared
    /// error bound.
    pub fn merge(&mut self, batch: &[Sample]) {
        debug_assert!(
            batch.windows(2).all(|w| w[0].value <= w[1].value),
            "merge input must be sorted"
        );

        let mut r = 0.0;
        let mut i = 0;
        for incoming in batch {
            let mut inserted = false;
            while i < self.samples.len() {
                let c = self.samples[i];
                if c.value > incoming.value {
                    let delta = incoming
                        .delta
                        .max(self.invariant.max_delta(self.n, r).floor() - 1.0);
                    self.samples.insert(
                        i,
                        Sample {
                            value: incoming.value,
                            width: incoming.width,
                            delta,
                        },
                    );
                    i += 1;
                    inserted = true;
                    break;
                }
                r += c.width;
                i += 1;
            }
            if !inserted {
                self.samples.push(Sample {
                    value: incoming.value,
                    width: incoming.width,
                    delta: 0.0,
                });
                i += 1;
            }
            self.n += incoming.width;
            r += incoming.width;
        }
        self.compress();
    }

    /// Merge neighbours from the tail backward while the combined
    /// uncertainty fits the budget at the current rank.
    fn compress(&mut self) {
        if self.samples.len() < 2 {
            return;
        }

        let mut xi = self.samples.len() - 1;
        let mut x = self.samples[xi];
        let mut r = self.n - 1.0 - x.width;

        for i in (0..self.samples.len() - 1).rev() {
            let c = self.samples[i];
            if c.width + x.width + x.delta <= self.invariant.max_delta(self.n, r) {
                x.width += c.width;
                self.samples[xi] = x;
                self.samples.remove(i);
                xi -= 1;
            } else {
                x = c;
                xi = i;
            }
            r -= c.width;
        }

        debug_assert!(
            self.samples.windows(2).all(|w| w[0].value <= w[1].value),
            "samples out of order after compress"
        );
    }

    /// Tightest value consistent with the uncertainty bounds at quantile
    /// `q`; `None` when the stream is empty.
    pub fn query(&self, q: f64) -> Option<f64> {
        let (first, rest) = self.samples.split_first()?;

        let mut t = (q * self.n).ceil();
        t += (self.invariant.max_delta(self.n, t) / 2.0).ceil();

        let mut p = first;
        let mut r = 0.0;
        for c in rest {
            r += p.width;
            if r + c.width + c.delta > t {
                return Some(p.value);
            }
            p = c;
        }
        Some(p.value)
    }

    pub fn reset(&mut self) {
        self.samples.clear();
        self.n = 0.0;
    }
}

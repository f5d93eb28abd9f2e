//! Buffered front end over [`SampleStream`].
//!
//! Raw observations are appended to a buffer and merged into the compressed
//! list in sorted batches. Until the first merge, queries are answered
//! exactly from the buffer, which is both cheaper and more accurate for small
//! data sets.

use super::{Invariant, Sample, SampleStream};

/// Buffer capacity used when none is given.
pub const DEFAULT_BUFFER_CAP: usize = 500;

#[derive(Debug, Clone)]
pub struct QuantileStream<I> {
    stream: SampleStream<I>,
    buffer: Vec<Sample>,
    cap: usize,
    sorted: bool,
}

impl<I: Invariant> QuantileStream<I> {
    pub fn new(invariant: I) -> Self {
        Self::with_capacity(invariant, DEFAULT_BUFFER_CAP)
    }

    pub fn with_capacity(invariant: I, cap: usize) -> Self {
        let cap = cap.max(1);
        Self {
            stream: SampleStream::new(invariant),
            buffer: Vec::with_capacity(cap),
            cap,
            sorted: true,
        }
    }

    pub fn insert(&mut self, value: f64) {
        self.buffer.push(Sample::point(value));
        self.sorted = false;
        if self.buffer.len() >= self.cap {
            self.flush();
        }
    }

    /// Merge samples exported by another stream.
    ///
    /// This is an approximation; see [`SampleStream::merge`]. Accuracy of
    /// the merged result is not guaranteed to meet the configured targets.
    pub fn merge(&mut self, samples: &[Sample]) {
        let mut samples = samples.to_vec();
        samples.sort_by(|a, b| a.value.total_cmp(&b.value));
        self.stream.merge(&samples);
    }

    /// Estimated value at quantile `q`, `None` if nothing was observed.
    pub fn query(&mut self, q: f64) -> Option<f64> {
        if !self.flushed() {
            if self.buffer.is_empty() {
                return None;
            }
            let len = self.buffer.len();
            let i = ((len as f64 * q).ceil() as usize).saturating_sub(1).min(len - 1);
            self.maybe_sort();
            return Some(self.buffer[i].value);
        }
        self.flush();
        self.stream.query(q)
    }

    /// Retained samples; flushes the buffer first unless nothing has been
    /// merged yet.
    pub fn samples(&mut self) -> Vec<Sample> {
        if !self.flushed() {
            self.maybe_sort();
            return self.buffer.clone();
        }
        self.flush();
        self.stream.samples().to_vec()
    }

    /// Observations seen so far (buffered and merged).
    pub fn count(&self) -> u64 {
        self.buffer.len() as u64 + self.stream.count()
    }

    pub fn reset(&mut self) {
        self.stream.reset();
        self.buffer.clear();
        self.sorted = true;
    }

    pub fn flush(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        self.maybe_sort();
        self.stream.merge(&self.buffer);
        self.buffer.clear();
    }

    fn flushed(&self) -> bool {
        self.stream.sample_count() > 0
    }

    fn maybe_sort(&mut self) {
        if !self.sorted {
            self.sorted = true;
            self.buffer.sort_by(|a, b| a.value.total_cmp(&b.value));
        }
    }
}

//! Monotonic counter.

use promkit_core::error::{PromError, Result};
use promkit_core::writer::{write_sample, MetricType, MetricsWriter};
use promkit_core::AtomicF64;

use crate::family::{Family, InstanceCore, Labelled};

/// Counter collector; `with_labels` yields [`LabelledCounter`]s.
pub type Counter = Family<LabelledCounter>;

#[derive(Debug)]
pub struct LabelledCounter {
    core: InstanceCore,
    value: AtomicF64,
}

impl LabelledCounter {
    pub fn inc(&self) {
        self.value.add(1.0);
        self.core.mark_updated();
    }

    /// Fails for negative (or NaN) increments and leaves the value untouched.
    pub fn inc_by(&self, increment: f64) -> Result<()> {
        if increment < 0.0 || increment.is_nan() {
            return Err(PromError::InvalidArgument(format!(
                "counter cannot decrease (increment {increment})"
            )));
        }
        self.value.add(increment);
        self.core.mark_updated();
        Ok(())
    }

    /// Raise the counter to `value`; smaller values are ignored.
    pub fn inc_to(&self, value: f64) {
        if value > self.value.fetch_max(value) {
            self.core.mark_updated();
        }
    }

    pub fn get(&self) -> f64 {
        self.value.get()
    }
}

impl Labelled for LabelledCounter {
    type Config = ();

    const TYPE: MetricType = MetricType::Counter;

    fn create(_config: &(), core: InstanceCore) -> Self {
        Self {
            core,
            value: AtomicF64::new(0.0),
        }
    }

    fn core(&self) -> &InstanceCore {
        &self.core
    }

    fn collect(&self, writer: &mut dyn MetricsWriter) -> Result<()> {
        write_sample(
            writer,
            "",
            self.core.labels(),
            None,
            self.get(),
            self.core.timestamp(),
        )
    }

    fn reset(&self) {
        self.value.set(0.0);
    }
}

impl Family<LabelledCounter> {
    pub fn inc(&self) {
        self.unlabelled().inc();
    }

    pub fn inc_by(&self, increment: f64) -> Result<()> {
        self.unlabelled().inc_by(increment)
    }

    pub fn inc_to(&self, value: f64) {
        self.unlabelled().inc_to(value);
    }

    pub fn get(&self) -> f64 {
        self.unlabelled().get()
    }
}

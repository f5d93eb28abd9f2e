//! Gauge: a value that goes up and down.

use promkit_core::error::Result;
use promkit_core::writer::{write_sample, MetricType, MetricsWriter};
use promkit_core::AtomicF64;

use crate::family::{now_millis, Family, InstanceCore, Labelled};

pub type Gauge = Family<LabelledGauge>;

#[derive(Debug)]
pub struct LabelledGauge {
    core: InstanceCore,
    value: AtomicF64,
}

impl LabelledGauge {
    pub fn inc(&self) {
        self.inc_by(1.0);
    }

    pub fn inc_by(&self, delta: f64) {
        self.value.add(delta);
        self.core.mark_updated();
    }

    pub fn dec(&self) {
        self.inc_by(-1.0);
    }

    pub fn dec_by(&self, delta: f64) {
        self.inc_by(-delta);
    }

    pub fn set(&self, value: f64) {
        self.value.set(value);
        self.core.mark_updated();
    }

    /// Raise to `value` if currently lower.
    pub fn inc_to(&self, value: f64) {
        if value > self.value.fetch_max(value) {
            self.core.mark_updated();
        }
    }

    /// Lower to `value` if currently higher.
    pub fn dec_to(&self, value: f64) {
        if value < self.value.fetch_min(value) {
            self.core.mark_updated();
        }
    }

    /// Set to the current Unix time in seconds.
    pub fn set_to_current_time(&self) {
        self.set(now_millis() as f64 / 1000.0);
    }

    pub fn get(&self) -> f64 {
        self.value.get()
    }
}

impl Labelled for LabelledGauge {
    type Config = ();

    const TYPE: MetricType = MetricType::Gauge;

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

impl Family<LabelledGauge> {
    pub fn inc(&self) {
        self.unlabelled().inc();
    }

    pub fn inc_by(&self, delta: f64) {
        self.unlabelled().inc_by(delta);
    }

    pub fn dec(&self) {
        self.unlabelled().dec();
    }

    pub fn dec_by(&self, delta: f64) {
        self.unlabelled().dec_by(delta);
    }

    pub fn set(&self, value: f64) {
        self.unlabelled().set(value);
    }

    pub fn inc_to(&self, value: f64) {
        self.unlabelled().inc_to(value);
    }

    pub fn dec_to(&self, value: f64) {
        self.unlabelled().dec_to(value);
    }

    pub fn set_to_current_time(&self) {
        self.unlabelled().set_to_current_time();
    }

    pub fn get(&self) -> f64 {
        self.unlabelled().get()
    }
}

//! Untyped value: set-only, exposed without type semantics.

use promkit_core::error::Result;
use promkit_core::writer::{write_sample, MetricType, MetricsWriter};
use promkit_core::AtomicF64;

use crate::family::{Family, InstanceCore, Labelled};

pub type Untyped = Family<LabelledUntyped>;

#[derive(Debug)]
pub struct LabelledUntyped {
    core: InstanceCore,
    value: AtomicF64,
}

impl LabelledUntyped {
    pub fn set(&self, value: f64) {
        self.value.set(value);
        self.core.mark_updated();
    }

    pub fn get(&self) -> f64 {
        self.value.get()
    }
}

impl Labelled for LabelledUntyped {
    type Config = ();

    const TYPE: MetricType = MetricType::Untyped;

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

impl Family<LabelledUntyped> {
    pub fn set(&self, value: f64) {
        self.unlabelled().set(value);
    }

    pub fn get(&self) -> f64 {
        self.unlabelled().get()
    }
}

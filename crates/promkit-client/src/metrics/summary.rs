//! Summary: lifetime sum and count plus quantiles over a sliding window.
//!
//! The window of `max_age` is split into `age_buckets` sketches that all see
//! every observation; each one is reset in turn every
//! `max_age / age_buckets`, and queries go to the oldest (head) sketch.
//! Observations are first buffered and merged into the sketches in sorted
//! batches when the buffer fills, when its slice of time expires, or at
//! collection.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tracing::trace;

use promkit_core::error::{PromError, Result};
use promkit_core::labels::QUANTILE_LABEL;
use promkit_core::quantile::{Objective, Sample, SampleStream, Targeted, DEFAULT_BUFFER_CAP};
use promkit_core::writer::{format_value, write_sample, MetricType, MetricsWriter};
use promkit_core::AtomicF64;

use crate::family::{Family, InstanceCore, Labelled, MetricOpts};

pub type Summary = Family<LabelledSummary>;

pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(600);
pub const DEFAULT_AGE_BUCKETS: usize = 5;

/// `{0.5: 0.05, 0.9: 0.01, 0.99: 0.001}`
pub fn default_objectives() -> Vec<Objective> {
    vec![
        Objective {
            quantile: 0.5,
            epsilon: 0.05,
        },
        Objective {
            quantile: 0.9,
            epsilon: 0.01,
        },
        Objective {
            quantile: 0.99,
            epsilon: 0.001,
        },
    ]
}

/// Validated window and objective settings shared by all instances.
#[derive(Debug, Clone)]
pub struct SummaryConfig {
    targets: Targeted,
    /// Pre-rendered `quantile` values, in objective order.
    labels: Arc<[String]>,
    max_age: Duration,
    age_buckets: u32,
    stream_duration: Duration,
    buffer_cap: usize,
}

impl SummaryConfig {
    pub fn new(
        objectives: &[Objective],
        max_age: Duration,
        age_buckets: usize,
        buffer_cap: usize,
    ) -> Result<Self> {
        let mut checked = Vec::with_capacity(objectives.len());
        for o in objectives {
            checked.push(Objective::new(o.quantile, o.epsilon)?);
        }
        let mut quantiles: Vec<f64> = checked.iter().map(|o| o.quantile).collect();
        quantiles.sort_by(f64::total_cmp);
        if let Some(w) = quantiles.windows(2).find(|w| w[0] == w[1]) {
            return Err(PromError::InvalidArgument(format!(
                "quantile {} listed twice",
                w[0]
            )));
        }
        if age_buckets == 0 {
            return Err(PromError::InvalidArgument(
                "summary needs at least one age bucket".into(),
            ));
        }
        if buffer_cap == 0 {
            return Err(PromError::InvalidArgument(
                "summary buffer capacity must be positive".into(),
            ));
        }
        let buckets = u32::try_from(age_buckets).map_err(|_| {
            PromError::InvalidArgument(format!("{age_buckets} age buckets is too many"))
        })?;
        let stream_duration = max_age / buckets;
        if stream_duration.is_zero() {
            return Err(PromError::InvalidArgument(format!(
                "max_age {max_age:?} is too short for {age_buckets} age buckets"
            )));
        }

        let targets = Targeted::new(checked);
        let labels = targets
            .objectives()
            .iter()
            .map(|o| format_value(o.quantile))
            .collect();
        Ok(Self {
            targets,
            labels,
            max_age,
            age_buckets: buckets,
            stream_duration,
            buffer_cap,
        })
    }

    pub fn objectives(&self) -> &[Objective] {
        self.targets.objectives()
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    pub fn age_buckets(&self) -> usize {
        self.age_buckets as usize
    }

    pub fn buffer_cap(&self) -> usize {
        self.buffer_cap
    }

    fn stream_duration(&self) -> Duration {
        self.stream_duration
    }
}

/// Options for [`MetricFactory::create_summary_with`](crate::MetricFactory::create_summary_with).
#[derive(Debug, Clone)]
pub struct SummaryOpts {
    pub common: MetricOpts,
    pub objectives: Vec<Objective>,
    pub max_age: Duration,
    pub age_buckets: usize,
    pub buffer_cap: usize,
}

impl SummaryOpts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the objectives with `(quantile, epsilon)` pairs.
    pub fn objectives(mut self, objectives: &[(f64, f64)]) -> Self {
        self.objectives = objectives
            .iter()
            .map(|&(quantile, epsilon)| Objective { quantile, epsilon })
            .collect();
        self
    }

    pub fn max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn age_buckets(mut self, age_buckets: usize) -> Self {
        self.age_buckets = age_buckets;
        self
    }

    pub fn buffer_cap(mut self, buffer_cap: usize) -> Self {
        self.buffer_cap = buffer_cap;
        self
    }

    pub fn include_timestamp(mut self, on: bool) -> Self {
        self.common.include_timestamp = on;
        self
    }

    pub fn suppress_empty(mut self, on: bool) -> Self {
        self.common.suppress_empty = on;
        self
    }

    pub(crate) fn to_config(&self) -> Result<SummaryConfig> {
        SummaryConfig::new(
            &self.objectives,
            self.max_age,
            self.age_buckets,
            self.buffer_cap,
        )
    }
}

impl Default for SummaryOpts {
    fn default() -> Self {
        Self {
            common: MetricOpts::default(),
            objectives: default_objectives(),
            max_age: DEFAULT_MAX_AGE,
            age_buckets: DEFAULT_AGE_BUCKETS,
            buffer_cap: DEFAULT_BUFFER_CAP,
        }
    }
}

/// Point-in-time read of one instance.
#[derive(Debug, Clone, PartialEq)]
pub struct SummarySnapshot {
    pub count: u64,
    pub sum: f64,
    /// `(quantile, value)` ascending by quantile; `NaN` when the window is
    /// empty.
    pub quantiles: Vec<(f64, f64)>,
}

#[derive(Debug)]
struct Window {
    buffer: Vec<f64>,
    buffer_expiry: Instant,
    streams: Vec<SampleStream<Targeted>>,
    head: usize,
    head_expiry: Instant,
    stream_duration: Duration,
    buffer_cap: usize,
}

impl Window {
    fn new(config: &SummaryConfig, now: Instant) -> Self {
        let stream_duration = config.stream_duration();
        let streams = (0..config.age_buckets)
            .map(|_| SampleStream::new(config.targets.clone()))
            .collect();
        Self {
            buffer: Vec::with_capacity(config.buffer_cap),
            buffer_expiry: now + stream_duration,
            streams,
            head: 0,
            head_expiry: now + stream_duration,
            stream_duration,
            buffer_cap: config.buffer_cap,
        }
    }

    fn observe(&mut self, value: f64, now: Instant) {
        if now > self.buffer_expiry {
            self.flush(now);
        }
        self.buffer.push(value);
        if self.buffer.len() >= self.buffer_cap {
            self.flush(now);
        }
    }

    /// Merge the buffer into every stream, then retire expired streams.
    fn flush(&mut self, now: Instant) {
        while now > self.buffer_expiry {
            self.buffer_expiry += self.stream_duration;
        }
        if !self.buffer.is_empty() {
            self.buffer.sort_by(f64::total_cmp);
            let batch: Vec<_> = self
                .buffer
                .iter()
                .map(|v| Sample::point(*v))
                .collect();
            for stream in &mut self.streams {
                stream.merge(&batch);
            }
            self.buffer.clear();
        }
        self.rotate(now);
    }

    fn rotate(&mut self, now: Instant) {
        while now >= self.head_expiry {
            self.streams[self.head].reset();
            self.head = (self.head + 1) % self.streams.len();
            self.head_expiry += self.stream_duration;
            trace!(head = self.head, "summary window rotated");
        }
    }

    fn query(&self, q: f64) -> f64 {
        self.streams[self.head].query(q).unwrap_or(f64::NAN)
    }

    fn reset(&mut self, now: Instant) {
        self.buffer.clear();
        for stream in &mut self.streams {
            stream.reset();
        }
        self.buffer_expiry = now + self.stream_duration;
        self.head = 0;
        self.head_expiry = now + self.stream_duration;
    }
}

#[derive(Debug)]
pub struct LabelledSummary {
    core: InstanceCore,
    config: SummaryConfig,
    count: AtomicU64,
    sum: AtomicF64,
    window: Mutex<Window>,
}

impl LabelledSummary {
    pub fn observe(&self, value: f64) {
        self.lock_window().observe(value, Instant::now());
        self.sum.add(value);
        self.count.fetch_add(1, Ordering::AcqRel);
        self.core.mark_updated();
    }

    pub fn snapshot(&self) -> SummarySnapshot {
        let quantiles = {
            let mut window = self.lock_window();
            window.flush(Instant::now());
            self.config
                .objectives()
                .iter()
                .map(|o| (o.quantile, window.query(o.quantile)))
                .collect()
        };
        SummarySnapshot {
            count: self.count(),
            sum: self.sum(),
            quantiles,
        }
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Acquire)
    }

    pub fn sum(&self) -> f64 {
        self.sum.get()
    }

    fn lock_window(&self) -> MutexGuard<'_, Window> {
        // A panic while holding the lock leaves the window merely stale.
        self.window.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Labelled for LabelledSummary {
    type Config = SummaryConfig;

    const TYPE: MetricType = MetricType::Summary;
    const RESERVED_LABELS: &'static [&'static str] = &[QUANTILE_LABEL];

    fn create(config: &SummaryConfig, core: InstanceCore) -> Self {
        Self {
            core,
            config: config.clone(),
            count: AtomicU64::new(0),
            sum: AtomicF64::new(0.0),
            window: Mutex::new(Window::new(config, Instant::now())),
        }
    }

    fn core(&self) -> &InstanceCore {
        &self.core
    }

    fn collect(&self, writer: &mut dyn MetricsWriter) -> Result<()> {
        let snap = self.snapshot();
        let labels = self.core.labels();
        let ts = self.core.timestamp();

        for ((_, value), q) in snap.quantiles.iter().zip(self.config.labels.iter()) {
            write_sample(writer, "", labels, Some((QUANTILE_LABEL, q)), *value, ts)?;
        }
        write_sample(writer, "_sum", labels, None, snap.sum, ts)?;
        write_sample(writer, "_count", labels, None, snap.count as f64, ts)
    }

    fn reset(&self) {
        self.lock_window().reset(Instant::now());
        self.sum.set(0.0);
        self.count.store(0, Ordering::Release);
    }

    fn is_empty(&self) -> bool {
        self.count() == 0
    }
}

impl Family<LabelledSummary> {
    pub fn observe(&self, value: f64) {
        self.unlabelled().observe(value);
    }

    pub fn snapshot(&self) -> SummarySnapshot {
        self.unlabelled().snapshot()
    }
}

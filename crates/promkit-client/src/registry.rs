//! Collector registry: one collector per metric name.

use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use tracing::{debug, warn};

use promkit_core::error::{PromError, Result};
use promkit_core::writer::MetricsWriter;

use crate::collector::Collector;

struct Registered {
    collector: Arc<dyn Collector>,
    /// Set for collectors added through `get_or_add`, so they can be handed
    /// back with their concrete type.
    typed: Option<Arc<dyn Any + Send + Sync>>,
    /// Registration order; output follows it.
    seq: u64,
}

#[derive(Default)]
pub struct CollectorRegistry {
    collectors: DashMap<String, Registered>,
    seq: AtomicU64,
}

impl CollectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `collector`; fails with `Conflict` if its name is taken. The
    /// collector already registered under that name is left in place.
    pub fn register(&self, collector: Arc<dyn Collector>) -> Result<()> {
        let name = collector.name().to_string();
        match self.collectors.entry(name) {
            Entry::Occupied(e) => {
                warn!(metric = %e.key(), "duplicate registration rejected");
                Err(PromError::Conflict(format!(
                    "metric {} is already registered",
                    e.key()
                )))
            }
            Entry::Vacant(v) => {
                debug!(metric = %v.key(), "collector registered");
                v.insert(Registered {
                    collector,
                    typed: None,
                    seq: self.seq.fetch_add(1, Ordering::Relaxed),
                });
                Ok(())
            }
        }
    }

    /// Register `collector`, or return the one already registered under its
    /// name if it has the same concrete type and shape. Anything else under
    /// that name is a `Conflict`.
    pub fn get_or_add<C>(&self, collector: C) -> Result<Arc<C>>
    where
        C: Collector + Any,
    {
        let name = collector.name().to_string();
        match self.collectors.entry(name) {
            Entry::Occupied(e) => {
                let existing = e.get();
                let same_shape = existing.collector.shape() == collector.shape();
                let typed = existing
                    .typed
                    .as_ref()
                    .and_then(|t| Arc::clone(t).downcast::<C>().ok());
                match typed {
                    Some(found) if same_shape => Ok(found),
                    _ => {
                        warn!(
                            metric = %e.key(),
                            "registration with a different type or label names rejected"
                        );
                        Err(PromError::Conflict(format!(
                            "metric {} is already registered with a different shape",
                            e.key()
                        )))
                    }
                }
            }
            Entry::Vacant(v) => {
                let collector = Arc::new(collector);
                debug!(metric = %v.key(), "collector registered");
                v.insert(Registered {
                    collector: Arc::clone(&collector) as Arc<dyn Collector>,
                    typed: Some(Arc::clone(&collector) as Arc<dyn Any + Send + Sync>),
                    seq: self.seq.fetch_add(1, Ordering::Relaxed),
                });
                Ok(collector)
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Collector>> {
        self.collectors
            .get(name)
            .map(|e| Arc::clone(&e.value().collector))
    }

    /// Unregister `name`; returns the removed collector.
    pub fn remove(&self, name: &str) -> Option<Arc<dyn Collector>> {
        let (_, removed) = self.collectors.remove(name)?;
        debug!(metric = name, "collector removed");
        Some(removed.collector)
    }

    pub fn len(&self) -> usize {
        self.collectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collectors.is_empty()
    }

    /// Registered names in registration order.
    pub fn names(&self) -> Vec<String> {
        self.snapshot()
            .into_iter()
            .map(|c| c.name().to_string())
            .collect()
    }

    /// Write every collector, in registration order, then flush the writer.
    ///
    /// Collectors registered or removed concurrently may or may not be
    /// included. The first error aborts the pass.
    pub fn collect_all(&self, writer: &mut dyn MetricsWriter) -> Result<()> {
        for collector in self.snapshot() {
            if let Err(e) = collector.collect(writer) {
                warn!(metric = collector.name(), error = %e, "collect failed");
                return Err(e);
            }
        }
        writer.flush()
    }

    fn snapshot(&self) -> Vec<Arc<dyn Collector>> {
        let mut entries: Vec<(u64, Arc<dyn Collector>)> = self
            .collectors
            .iter()
            .map(|e| (e.value().seq, Arc::clone(&e.value().collector)))
            .collect();
        entries.sort_by_key(|(seq, _)| *seq);
        entries.into_iter().map(|(_, c)| c).collect()
    }
}

static DEFAULT_REGISTRY: Lazy<Arc<CollectorRegistry>> =
    Lazy::new(|| Arc::new(CollectorRegistry::new()));

/// Process-wide registry, created on first use.
pub fn default_registry() -> Arc<CollectorRegistry> {
    Arc::clone(&DEFAULT_REGISTRY)
}

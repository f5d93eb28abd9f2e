//! Lock-free `f64` cell.
//!
//! There is no native atomic double, so the value lives in an `AtomicU64` as
//! its IEEE-754 bit pattern. `add` is a compare-and-swap retry loop; writers
//! never block each other and never lose an update.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

pub struct AtomicF64 {
    bits: AtomicU64,
}

impl AtomicF64 {
    pub const fn new(value: f64) -> Self {
        Self {
            bits: AtomicU64::new(value.to_bits()),
        }
    }

    /// Current value.
    #[inline]
    pub fn get(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Acquire))
    }

    #[inline]
    pub fn set(&self, value: f64) {
        self.bits.store(value.to_bits(), Ordering::Release);
    }

    /// Add `delta` (may be negative) and return the previous value.
    #[inline]
    pub fn add(&self, delta: f64) -> f64 {
        self.update(|current| Some(current + delta))
    }

    /// Raise the value to `target` if it is currently smaller.
    pub fn fetch_max(&self, target: f64) -> f64 {
        self.update(|current| (target > current).then_some(target))
    }

    /// Lower the value to `target` if it is currently larger.
    pub fn fetch_min(&self, target: f64) -> f64 {
        self.update(|current| (target < current).then_some(target))
    }

    /// CAS loop; `f` returning `None` leaves the value untouched.
    fn update(&self, f: impl Fn(f64) -> Option<f64>) -> f64 {
        let mut current = self.bits.load(Ordering::Relaxed);
        loop {
            let old = f64::from_bits(current);
            let Some(new) = f(old) else { return old };
            match self.bits.compare_exchange_weak(
                current,
                new.to_bits(),
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return old,
                Err(next) => current = next,
            }
        }
    }
}

impl Default for AtomicF64 {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl fmt::Debug for AtomicF64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AtomicF64").field(&self.get()).finish()
    }
}

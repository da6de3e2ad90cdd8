//! Memoized dependency cache.
//!
//! One slot per distinct (operation, params, source ids) key. A slot is an
//! `Arc<OnceLock<Series>>`: the map lock is held only long enough to find or
//! insert the slot, and the factory runs inside `OnceLock::get_or_init` with
//! no lock held. Concurrent requests for one key block on the same slot, so
//! each factory runs at most once and nested requests (composites pulling
//! their inputs through the cache) never contend on the map lock.

use crate::domain::{Series, SeriesId};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};
use tracing::{debug, trace, warn};

/// Structured cache key.
///
/// Parameters are canonical tagged strings (`i:14`, `f:2.5`, `b:true`,
/// `s:close`) so an integer 2 and a float 2.0 never share a slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    op: Cow<'static, str>,
    params: Vec<String>,
    sources: Vec<SeriesId>,
}

impl CacheKey {
    pub fn new(op: impl Into<Cow<'static, str>>) -> Self {
        Self {
            op: op.into(),
            params: Vec::new(),
            sources: Vec::new(),
        }
    }

    pub fn int(mut self, value: usize) -> Self {
        self.params.push(format!("i:{value}"));
        self
    }

    pub fn float(mut self, value: f64) -> Self {
        self.params.push(format!("f:{value}"));
        self
    }

    pub fn flag(mut self, value: bool) -> Self {
        self.params.push(format!("b:{value}"));
        self
    }

    pub fn text(mut self, value: &str) -> Self {
        self.params.push(format!("s:{value}"));
        self
    }

    pub fn source(mut self, id: SeriesId) -> Self {
        self.sources.push(id);
        self
    }

    pub fn op(&self) -> &str {
        &self.op
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub fn sources(&self) -> &[SeriesId] {
        &self.sources
    }

    /// Provenance identity of the series this key produces.
    pub fn series_id(&self) -> SeriesId {
        SeriesId::derived(&self.op, &self.params, &self.sources)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}", self.op, self.params.join(","))?;
        for s in &self.sources {
            write!(f, ";{}", s.short())?;
        }
        write!(f, ")")
    }
}

/// Snapshot of cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    /// Equals the number of factory invocations.
    pub misses: u64,
    pub entries: usize,
}

type Slot = Arc<OnceLock<Series>>;

#[derive(Debug, Default)]
pub struct DependencyCache {
    slots: RwLock<HashMap<CacheKey, Slot>>,
    max_entries: Option<usize>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl DependencyCache {
    pub fn new(max_entries: Option<usize>) -> Self {
        Self {
            max_entries,
            ..Self::default()
        }
    }

    /// Return the series for `key`, running `factory` if no slot holds it yet.
    ///
    /// The returned series carries `key.series_id()`.
    pub fn get_or_compute<F>(&self, key: CacheKey, factory: F) -> Series
    where
        F: FnOnce() -> Vec<f64>,
    {
        let Some(slot) = self.slot_for(&key) else {
            warn!(key = %key, cap = ?self.max_entries, "cache full, computing without storing");
            self.misses.fetch_add(1, Ordering::Relaxed);
            return Series::new(key.series_id(), factory());
        };

        let mut computed = false;
        let series = slot.get_or_init(|| {
            computed = true;
            self.misses.fetch_add(1, Ordering::Relaxed);
            debug!(
                op = key.op(),
                params = ?key.params(),
                sources = ?key.sources(),
                "cache miss"
            );
            Series::new(key.series_id(), factory())
        });

        if !computed {
            self.hits.fetch_add(1, Ordering::Relaxed);
            trace!(key = %key, "cache hit");
        }
        series.clone()
    }

    /// Find or create the slot for `key`. `None` when the cap forbids a new slot.
    fn slot_for(&self, key: &CacheKey) -> Option<Slot> {
        {
            let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(slot) = slots.get(key) {
                return Some(Arc::clone(slot));
            }
        }

        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(slot) = slots.get(key) {
            return Some(Arc::clone(slot));
        }
        if self.max_entries.is_some_and(|cap| slots.len() >= cap) {
            return None;
        }
        let slot = Slot::default();
        slots.insert(key.clone(), Arc::clone(&slot));
        Some(slot)
    }

    /// Stored series for `key`, without computing.
    pub fn get(&self, key: &CacheKey) -> Option<Series> {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        slots.get(key).and_then(|slot| slot.get().cloned())
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.slots.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }

    /// Drop every entry and zero the counters.
    pub fn clear(&mut self) {
        self.slots
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        *self.hits.get_mut() = 0;
        *self.misses.get_mut() = 0;
    }
}

//! Numeric series: immutable, index-aligned with the bar set.

use super::ids::SeriesId;
use std::ops::Deref;
use std::sync::Arc;

/// An immutable sequence of `f64`, one value per bar.
///
/// Cloning is cheap (shared buffer). Once a series has been published into
/// the dependency cache it is never mutated.
#[derive(Debug, Clone)]
pub struct Series {
    id: SeriesId,
    values: Arc<[f64]>,
}

impl Series {
    /// Wrap values under a caller-chosen identity.
    pub fn new(id: SeriesId, values: Vec<f64>) -> Self {
        Self {
            id,
            values: values.into(),
        }
    }

    /// Build a source series whose identity is its content.
    pub fn from_values(label: &str, values: Vec<f64>) -> Self {
        let id = SeriesId::of_values(label, &values);
        Self::new(id, values)
    }

    pub fn id(&self) -> SeriesId {
        self.id
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Value at `index`, or `None` past the end.
    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }

    /// Last value, if any.
    pub fn last(&self) -> Option<f64> {
        self.values.last().copied()
    }

    /// True when both handles share one buffer.
    pub fn ptr_eq(&self, other: &Series) -> bool {
        Arc::ptr_eq(&self.values, &other.values)
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.values.to_vec()
    }
}

impl Deref for Series {
    type Target = [f64];

    fn deref(&self) -> &[f64] {
        &self.values
    }
}

impl PartialEq for Series {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.values[..] == other.values[..]
    }
}

/// Encode a boolean series as 1.0 / 0.0 so it can live in the cache.
pub fn bools_to_series(flags: &[bool]) -> Vec<f64> {
    flags.iter().map(|&b| if b { 1.0 } else { 0.0 }).collect()
}

/// Decode a 1.0 / 0.0 series back to booleans (any non-zero is true).
pub fn series_to_bools(values: &[f64]) -> Vec<bool> {
    values.iter().map(|&v| v != 0.0).collect()
}

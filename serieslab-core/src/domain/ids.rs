use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identity of a numeric series.
///
/// Source series are identified by their content, derived series by their
/// provenance (operation + canonical params + input ids). Both are BLAKE3
/// digests, so two logically identical requests always land on the same id
/// regardless of where the buffers live in memory.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SeriesId([u8; 32]);

impl SeriesId {
    /// Content identity for a source series.
    pub fn of_values(label: &str, values: &[f64]) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"src");
        write_str(&mut hasher, label);
        hasher.update(&(values.len() as u64).to_le_bytes());
        for v in values {
            hasher.update(&v.to_bits().to_le_bytes());
        }
        Self(*hasher.finalize().as_bytes())
    }

    /// Provenance identity for a computed series.
    ///
    /// Every component is length-prefixed: ("ab", ["c"]) and ("a", ["bc"])
    /// hash differently.
    pub fn derived<P: AsRef<str>>(op: &str, params: &[P], sources: &[SeriesId]) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"drv");
        write_str(&mut hasher, op);
        hasher.update(&(params.len() as u64).to_le_bytes());
        for p in params {
            write_str(&mut hasher, p.as_ref());
        }
        hasher.update(&(sources.len() as u64).to_le_bytes());
        for s in sources {
            hasher.update(&s.0);
        }
        Self(*hasher.finalize().as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Short hex prefix for log lines.
    pub fn short(&self) -> String {
        self.0[..6].iter().map(|b| format!("{b:02x}")).collect()
    }
}

fn write_str(hasher: &mut blake3::Hasher, s: &str) {
    hasher.update(&(s.len() as u64).to_le_bytes());
    hasher.update(s.as_bytes());
}

impl fmt::Debug for SeriesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SeriesId({})", self.short())
    }
}

impl fmt::Display for SeriesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

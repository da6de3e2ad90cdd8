//! Per-context engine settings.

use super::error::EngineError;
use crate::indicators::ShiftFill;
use serde::{Deserialize, Serialize};

/// Settings fixed for the lifetime of one `EvaluationContext`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Upper bound on stored cache entries. `None` means unbounded.
    ///
    /// Once the bound is reached, new keys are computed without being
    /// stored. Existing entries are never evicted.
    pub max_cached_series: Option<usize>,

    /// Fill policy for bars vacated by time shifts (Senkou, Chinkou).
    pub shift_fill: ShiftFill,
}

impl EngineConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, EngineError> {
        Ok(toml::from_str(s)?)
    }

    pub fn with_max_cached_series(mut self, max: usize) -> Self {
        self.max_cached_series = Some(max);
        self
    }

    pub fn with_shift_fill(mut self, fill: ShiftFill) -> Self {
        self.shift_fill = fill;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_unbounded_zero_fill() {
        let config = EngineConfig::default();
        assert_eq!(config.max_cached_series, None);
        assert_eq!(config.shift_fill, ShiftFill::Zero);
    }

    #[test]
    fn parse_from_toml() {
        let config = EngineConfig::from_toml_str(
            r#"
            max_cached_series = 64
            shift_fill = "hold"
            "#,
        )
        .unwrap();
        assert_eq!(config.max_cached_series, Some(64));
        assert_eq!(config.shift_fill, ShiftFill::Hold);
    }

    #[test]
    fn empty_toml_gives_default() {
        assert_eq!(EngineConfig::from_toml_str("").unwrap(), EngineConfig::default());
    }

    #[test]
    fn unknown_fill_is_an_error() {
        assert!(EngineConfig::from_toml_str(r#"shift_fill = "smear""#).is_err());
    }
}

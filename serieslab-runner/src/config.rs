//! Serializable sweep configuration.
//!
//! ```toml
//! data_path = "spy.csv"
//! parallel = true
//!
//! [engine]
//! shift_fill = "hold"
//!
//! [request]
//! op = "bollinger"
//! inputs = ["close"]
//! params = { k = 2.0 }
//!
//! [grid]
//! period = [10, 20, 30]
//! upper = [true, false]
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serieslab_core::engine::{EngineConfig, IndicatorRequest, ParamValue};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::sweep::ParamGrid;

fn parallel_default() -> bool {
    true
}

/// Everything needed to reproduce one parameter sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Request template; grid values overwrite its params per job.
    pub request: IndicatorRequest,

    /// Parameter name -> values to try.
    #[serde(default)]
    pub grid: BTreeMap<String, Vec<ParamValue>>,

    #[serde(default = "parallel_default")]
    pub parallel: bool,

    /// CSV bars, resolved relative to the config file by `load`.
    #[serde(default)]
    pub data_path: Option<PathBuf>,

    #[serde(default)]
    pub engine: EngineConfig,
}

impl SweepConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("failed to parse sweep config")
    }

    /// Read a config file. A relative `data_path` is taken relative to the
    /// file's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read sweep config {}", path.display()))?;
        let mut config = Self::from_toml_str(&text)
            .with_context(|| format!("in {}", path.display()))?;

        if let (Some(data), Some(dir)) = (config.data_path.take(), path.parent()) {
            config.data_path = Some(if data.is_relative() { dir.join(data) } else { data });
        }
        Ok(config)
    }

    pub fn param_grid(&self) -> ParamGrid {
        ParamGrid::new(self.grid.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serieslab_core::domain::PriceField;
    use serieslab_core::indicators::ShiftFill;

    const EXAMPLE: &str = r#"
        data_path = "bars.csv"

        [engine]
        shift_fill = "hold"

        [request]
        op = "bollinger"
        inputs = ["close"]
        params = { k = 2.0 }

        [grid]
        period = [10, 20, 30]
        upper = [true, false]
    "#;

    #[test]
    fn parses_full_config() {
        let config = SweepConfig::from_toml_str(EXAMPLE).unwrap();
        assert!(config.parallel);
        assert_eq!(config.engine.shift_fill, ShiftFill::Hold);
        assert_eq!(config.engine.max_cached_series, None);
        assert_eq!(
            config.request,
            IndicatorRequest::new("bollinger")
                .param("k", 2.0)
                .input(PriceField::Close)
        );
        assert_eq!(config.grid["period"].len(), 3);
        assert_eq!(config.param_grid().size(), 6);
    }

    #[test]
    fn load_resolves_data_path_next_to_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sweep.toml");
        std::fs::write(&path, EXAMPLE).unwrap();

        let config = SweepConfig::load(&path).unwrap();
        assert_eq!(config.data_path, Some(dir.path().join("bars.csv")));
    }

    #[test]
    fn errors_carry_context() {
        let err = SweepConfig::load("/no/such/sweep.toml").unwrap_err();
        assert!(format!("{err:#}").contains("failed to read sweep config"));

        let err = SweepConfig::from_toml_str("[request]\nparams = 3").unwrap_err();
        assert!(format!("{err:#}").contains("failed to parse sweep config"));
    }
}

//! Sweep summaries: JSON and CSV artifacts.
//!
//! A summary carries one row per sweep job (grid params, last value, cache
//! counters) plus the request template and the dataset hash. Full series are
//! left out; the CSV export writes them separately when wanted.

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serieslab_core::engine::{CacheStats, IndicatorRequest, Params};

use crate::sweep::SweepResults;

/// Bumped when the summary layout changes; newer versions are rejected on load.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepRow {
    pub params: Params,
    pub last_value: Option<f64>,
    pub bars: usize,
    pub cache: CacheStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepSummary {
    pub schema_version: u32,
    pub template: IndicatorRequest,
    #[serde(default)]
    pub dataset_hash: Option<String>,
    pub rows: Vec<SweepRow>,
}

impl SweepSummary {
    pub fn from_results(results: &SweepResults, dataset_hash: Option<String>) -> Self {
        let rows = results
            .all()
            .iter()
            .map(|o| SweepRow {
                params: o.params.clone(),
                // NaN has no JSON form
                last_value: o.last_value.filter(|v| v.is_finite()),
                bars: o.series.len(),
                cache: o.cache_stats,
            })
            .collect();
        Self {
            schema_version: SCHEMA_VERSION,
            template: results.template().clone(),
            dataset_hash,
            rows,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize sweep summary to JSON")
    }

    /// Parse a summary, rejecting unknown schema versions.
    pub fn from_json(json: &str) -> Result<Self> {
        let summary: Self =
            serde_json::from_str(json).context("failed to deserialize sweep summary from JSON")?;
        if summary.schema_version > SCHEMA_VERSION {
            bail!(
                "unsupported schema version {} (max supported: {})",
                summary.schema_version,
                SCHEMA_VERSION
            );
        }
        Ok(summary)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_json()?)
            .with_context(|| format!("failed to write {}", path.display()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_json(&json)
    }
}

/// One column per sweep job, one row per bar.
///
/// Column headers are the grid params (`period=10;k=2`).
pub fn export_series_csv(results: &SweepResults) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header = vec!["bar".to_string()];
    header.extend(results.all().iter().map(|o| {
        o.params
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(";")
    }));
    wtr.write_record(&header)?;

    let bars = results.all().iter().map(|o| o.series.len()).max().unwrap_or(0);
    for i in 0..bars {
        let mut record = vec![i.to_string()];
        record.extend(
            results
                .all()
                .iter()
                .map(|o| o.series.get(i).map(|v| format!("{v:.6}")).unwrap_or_default()),
        );
        wtr.write_record(&record)?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

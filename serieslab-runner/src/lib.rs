//! SeriesLab Runner: parameter sweeps and batch evaluation over the core engine.
//!
//! This crate builds on `serieslab-core` to provide:
//! - CSV bar loading with a dataset hash
//! - TOML sweep configuration
//! - Parallel parameter sweeps (one evaluation context per job)
//! - Concurrent batch evaluation against one shared context
//! - JSON / CSV export of sweep results

pub mod batch;
pub mod config;
pub mod data_loader;
pub mod export;
pub mod sweep;

pub use batch::{evaluate_batch, evaluate_batch_with, evaluate_catalog};
pub use config::SweepConfig;
pub use data_loader::{dataset_hash, load_bars, LoadError, LoadedData};
pub use export::{export_series_csv, SweepRow, SweepSummary, SCHEMA_VERSION};
pub use sweep::{sweep, ParamGrid, ParamSweep, SweepOutcome, SweepResults};

use anyhow::{Context, Result};

/// Load the bars a config points at, run its sweep, and summarize.
pub fn run_sweep_config(config: &SweepConfig) -> Result<(SweepResults, SweepSummary)> {
    let path = config
        .data_path
        .as_ref()
        .context("sweep config has no data_path")?;
    let loaded = load_bars(path).with_context(|| format!("loading {}", path.display()))?;

    let results = ParamSweep::new()
        .with_parallelism(config.parallel)
        .with_engine_config(config.engine)
        .run(loaded.bars, &config.request, &config.param_grid())?;
    let summary = SweepSummary::from_results(&results, Some(loaded.dataset_hash));
    Ok((results, summary))
}

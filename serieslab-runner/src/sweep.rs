//! Parameter sweeps: one request template, every grid combination.
//!
//! Each job gets its own `EvaluationContext` over the same shared bars, so
//! jobs never contend on a cache. Intermediates are shared only within a
//! job; use `batch::evaluate_batch` to share them across many requests.

use anyhow::{Context, Result};
use rayon::prelude::*;
use serieslab_core::catalog::HandlerSpec;
use serieslab_core::domain::{Bar, Series};
use serieslab_core::engine::{
    CacheStats, EngineConfig, EvaluationContext, IndicatorRequest, ParamValue, Params, Registry,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Parameter grid specification: name -> values to try.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamGrid {
    axes: BTreeMap<String, Vec<ParamValue>>,
}

impl ParamGrid {
    pub fn new(axes: BTreeMap<String, Vec<ParamValue>>) -> Self {
        Self { axes }
    }

    /// Grid over a catalog handler's documented ranges.
    ///
    /// Selector params (`optimize = false`) contribute only their default.
    pub fn from_handler(spec: &HandlerSpec) -> Self {
        let axes = spec
            .params
            .iter()
            .map(|p| (p.name.clone(), p.sweep_values()))
            .collect();
        Self { axes }
    }

    /// Add or replace one axis.
    pub fn axis(
        mut self,
        name: &str,
        values: impl IntoIterator<Item = impl Into<ParamValue>>,
    ) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        self.axes.insert(name.to_string(), values);
        self
    }

    /// Number of combinations. An empty grid has one (the template itself).
    pub fn size(&self) -> usize {
        self.axes.values().map(Vec::len).product()
    }

    /// Every combination, in lexicographic axis order.
    pub fn combinations(&self) -> Vec<Params> {
        let mut out = vec![Params::new()];
        for (name, values) in &self.axes {
            out = out
                .iter()
                .flat_map(|partial| {
                    values.iter().map(move |v| {
                        let mut next = partial.clone();
                        next.insert(name.clone(), v.clone());
                        next
                    })
                })
                .collect();
        }
        out
    }
}

/// One finished sweep job.
#[derive(Debug, Clone)]
pub struct SweepOutcome {
    /// Grid values for this job (template params not included).
    pub params: Params,
    pub last_value: Option<f64>,
    pub series: Series,
    pub cache_stats: CacheStats,
}

/// Parameter sweep executor.
///
/// Runs the template once per grid combination, optionally in parallel.
pub struct ParamSweep {
    registry: Registry,
    engine: EngineConfig,
    parallel: bool,
}

impl Default for ParamSweep {
    fn default() -> Self {
        Self::new()
    }
}

impl ParamSweep {
    pub fn new() -> Self {
        Self {
            registry: Registry::with_defaults(),
            engine: EngineConfig::default(),
            parallel: true,
        }
    }

    /// Enables or disables parallel execution.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_engine_config(mut self, engine: EngineConfig) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_registry(mut self, registry: Registry) -> Self {
        self.registry = registry;
        self
    }

    /// Executes the sweep.
    ///
    /// Every job request is validated before any computation starts, so a
    /// bad grid value fails the whole sweep up front.
    pub fn run(
        &self,
        bars: impl Into<Arc<[Bar]>>,
        template: &IndicatorRequest,
        grid: &ParamGrid,
    ) -> Result<SweepResults> {
        self.run_with_progress(bars, template, grid, |_, _| {})
    }

    /// Executes the sweep, calling `progress(done, total)` after each job.
    pub fn run_with_progress<F>(
        &self,
        bars: impl Into<Arc<[Bar]>>,
        template: &IndicatorRequest,
        grid: &ParamGrid,
        progress: F,
    ) -> Result<SweepResults>
    where
        F: Fn(usize, usize) + Send + Sync,
    {
        let bars: Arc<[Bar]> = bars.into();
        let jobs: Vec<(Params, IndicatorRequest)> = grid
            .combinations()
            .into_iter()
            .map(|params| {
                let request = template.with_params(&params);
                (params, request)
            })
            .collect();

        for (params, request) in &jobs {
            self.registry
                .validate(request)
                .with_context(|| format!("invalid sweep job {params:?}"))?;
        }

        let total = jobs.len();
        let done = std::sync::atomic::AtomicUsize::new(0);
        info!(
            op = %template.op,
            jobs = total,
            bars = bars.len(),
            parallel = self.parallel,
            "sweep started"
        );
        let started = Instant::now();

        let run_job = |(params, request): &(Params, IndicatorRequest)| -> Result<SweepOutcome> {
            let ctx = EvaluationContext::new(Arc::clone(&bars), self.engine);
            let series = self
                .registry
                .evaluate(&ctx, request)
                .with_context(|| format!("sweep job {request} failed"))?;
            let finished = done.fetch_add(1, std::sync::atomic::Ordering::Relaxed) + 1;
            progress(finished, total);
            debug!(job = %request, finished, total, "sweep job done");
            Ok(SweepOutcome {
                params: params.clone(),
                last_value: series.last(),
                series,
                cache_stats: ctx.cache_stats(),
            })
        };

        let outcomes = if self.parallel {
            jobs.par_iter().map(run_job).collect::<Result<Vec<_>>>()?
        } else {
            jobs.iter().map(run_job).collect::<Result<Vec<_>>>()?
        };

        info!(
            op = %template.op,
            jobs = total,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "sweep finished"
        );
        Ok(SweepResults::new(template.clone(), outcomes))
    }
}

/// Run `template` over every combination in `grid` with default settings.
pub fn sweep(
    bars: impl Into<Arc<[Bar]>>,
    template: &IndicatorRequest,
    grid: &ParamGrid,
    parallel: bool,
) -> Result<SweepResults> {
    ParamSweep::new()
        .with_parallelism(parallel)
        .run(bars, template, grid)
}

/// Results from a parameter sweep, in grid order.
#[derive(Debug, Clone)]
pub struct SweepResults {
    template: IndicatorRequest,
    outcomes: Vec<SweepOutcome>,
}

impl SweepResults {
    fn new(template: IndicatorRequest, outcomes: Vec<SweepOutcome>) -> Self {
        Self { template, outcomes }
    }

    pub fn template(&self) -> &IndicatorRequest {
        &self.template
    }

    /// Returns all outcomes as a slice.
    pub fn all(&self) -> &[SweepOutcome] {
        &self.outcomes
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Outcome whose grid params equal `params`.
    pub fn get(&self, params: &Params) -> Option<&SweepOutcome> {
        self.outcomes.iter().find(|o| &o.params == params)
    }

    /// Outcomes sorted by last value, descending. Empty series sort last.
    pub fn sorted_by_last_value(&self) -> Vec<&SweepOutcome> {
        let mut sorted: Vec<_> = self.outcomes.iter().collect();
        sorted.sort_by(|a, b| {
            let key = |o: &SweepOutcome| o.last_value.unwrap_or(f64::NEG_INFINITY);
            key(b).total_cmp(&key(a))
        });
        sorted
    }

    pub fn top_n(&self, n: usize) -> Vec<&SweepOutcome> {
        self.sorted_by_last_value().into_iter().take(n).collect()
    }

    /// Summed cache counters over every job.
    pub fn total_cache_stats(&self) -> CacheStats {
        self.outcomes.iter().fold(CacheStats::default(), |acc, o| CacheStats {
            hits: acc.hits + o.cache_stats.hits,
            misses: acc.misses + o.cache_stats.misses,
            entries: acc.entries + o.cache_stats.entries,
        })
    }
}

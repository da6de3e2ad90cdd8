//! Concurrent evaluation of many requests against one shared context.
//!
//! Unlike a sweep, every request here reads the same `EvaluationContext`, so
//! overlapping sub-computations (the EMA under both MACD and its signal line,
//! the ATR under ADX) run once no matter which worker reaches them first.

use anyhow::{Context, Result};
use rayon::prelude::*;
use serieslab_core::catalog::Catalog;
use serieslab_core::domain::Series;
use serieslab_core::engine::{EngineError, EvaluationContext, IndicatorRequest, Registry};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Evaluate `requests` in parallel with the default registry.
///
/// Results come back in request order; one failure does not stop the rest.
pub fn evaluate_batch(
    ctx: &EvaluationContext,
    requests: &[IndicatorRequest],
) -> Vec<Result<Series, EngineError>> {
    evaluate_batch_with(&Registry::with_defaults(), ctx, requests)
}

pub fn evaluate_batch_with(
    registry: &Registry,
    ctx: &EvaluationContext,
    requests: &[IndicatorRequest],
) -> Vec<Result<Series, EngineError>> {
    let results: Vec<_> = requests
        .par_iter()
        .map(|request| registry.evaluate(ctx, request))
        .collect();

    let failed = results.iter().filter(|r| r.is_err()).count();
    if failed > 0 {
        warn!(failed, total = requests.len(), "batch had failing requests");
    }
    debug!(
        requests = requests.len(),
        stats = ?ctx.cache_stats(),
        "batch evaluated"
    );
    results
}

/// Every catalog handler's default request, keyed by handler name.
pub fn evaluate_catalog(
    ctx: &EvaluationContext,
    catalog: &Catalog,
) -> Result<BTreeMap<String, Series>> {
    let requests: Vec<IndicatorRequest> = catalog.handlers.iter().map(|h| h.request()).collect();
    catalog
        .handlers
        .iter()
        .zip(evaluate_batch(ctx, &requests))
        .map(|(handler, result)| {
            let series = result.with_context(|| format!("handler '{}' failed", handler.name))?;
            Ok((handler.name.clone(), series))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serieslab_core::domain::{Bar, PriceField};
    use serieslab_core::engine::EngineConfig;

    fn make_bars(n: usize) -> Vec<Bar> {
        let base = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        (0..n)
            .map(|i| {
                let close = 50.0 + (i as f64 * 0.2).cos() * 3.0;
                Bar {
                    timestamp: base + chrono::Duration::days(i as i64),
                    open: close,
                    high: close + 0.5,
                    low: close - 0.5,
                    close,
                    volume: 500.0 + i as f64,
                }
            })
            .collect()
    }

    #[test]
    fn batch_preserves_order_and_isolates_failures() {
        let ctx = EvaluationContext::new(make_bars(40), EngineConfig::default());
        let requests = vec![
            IndicatorRequest::new("sma")
                .param("period", 5i64)
                .input(PriceField::Close),
            IndicatorRequest::new("no_such_op"),
            IndicatorRequest::new("atr").param("period", 14i64),
        ];
        let results = evaluate_batch(&ctx, &requests);
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(EngineError::UnknownOperation(_))));
        assert_eq!(results[2].as_ref().unwrap().to_vec(), ctx.atr(14).to_vec());
    }

    #[test]
    fn overlapping_requests_compute_shared_parts_once() {
        let ctx = EvaluationContext::new(make_bars(100), EngineConfig::default());
        let macd = |op: &str| {
            IndicatorRequest::new(op)
                .param("fast", 12i64)
                .param("slow", 26i64)
                .input(PriceField::Close)
        };
        let requests = vec![
            macd("macd"),
            macd("macd_signal").param("signal", 9i64),
            macd("macd_histogram").param("signal", 9i64),
        ];
        let results = evaluate_batch(&ctx, &requests);
        assert!(results.iter().all(Result::is_ok));

        // ema12, ema26, line, signal ema, histogram difference
        assert_eq!(ctx.cache_stats().misses, 5);
    }

    #[test]
    fn whole_catalog_in_one_batch() {
        let ctx = EvaluationContext::new(make_bars(120), EngineConfig::default());
        let catalog = Catalog::builtin().unwrap();
        let all = evaluate_catalog(&ctx, &catalog).unwrap();
        assert_eq!(all.len(), catalog.handlers.len());
        assert!(all.values().all(|s| s.len() == 120));
    }
}

//! Concurrency tests for the dependency cache.
//!
//! Many threads requesting one key at once must trigger the factory exactly
//! once and all receive the same buffer. Distinct keys must not serialize on
//! each other's factories.

use chrono::NaiveDate;
use serieslab_core::domain::{Bar, PriceField, SeriesId};
use serieslab_core::engine::{
    CacheKey, DependencyCache, EngineConfig, EvaluationContext, IndicatorRequest, Registry,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Barrier;
use std::thread;
use std::time::Duration;

const THREADS: usize = 8;

fn make_test_bars(n: usize) -> Vec<Bar> {
    let base = NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let mut price = 100.0;
    (0..n)
        .map(|i| {
            let seed = (i as u64).wrapping_mul(6364136223846793005).wrapping_add(1);
            price += ((seed % 200) as f64 - 100.0) * 0.05;
            price = f64::max(price, 10.0);
            Bar {
                timestamp: base + chrono::Duration::days(i as i64),
                open: price - 0.5,
                high: price + 2.0,
                low: price - 2.0,
                close: price + 0.3,
                volume: 1000.0 + i as f64 * 10.0,
            }
        })
        .collect()
}

#[test]
fn same_key_runs_factory_once_across_threads() {
    let cache = DependencyCache::new(None);
    let calls = AtomicUsize::new(0);
    let barrier = Barrier::new(THREADS);
    let source = SeriesId::of_values("close", &[1.0, 2.0, 3.0]);

    let results: Vec<_> = thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                s.spawn(|| {
                    barrier.wait();
                    cache.get_or_compute(CacheKey::new("slow").int(3).source(source), || {
                        calls.fetch_add(1, Ordering::SeqCst);
                        thread::sleep(Duration::from_millis(20));
                        vec![1.0, 2.0, 3.0]
                    })
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(results.windows(2).all(|w| w[0].ptr_eq(&w[1])));
    let stats = cache.stats();
    assert_eq!(stats.entries, 1);
    assert_eq!(stats.hits + stats.misses, THREADS as u64);
}

#[test]
fn distinct_keys_compute_independently() {
    let cache = DependencyCache::new(None);
    let calls = AtomicUsize::new(0);
    let barrier = Barrier::new(THREADS);

    thread::scope(|s| {
        for t in 0..THREADS {
            let (cache, calls, barrier) = (&cache, &calls, &barrier);
            s.spawn(move || {
                barrier.wait();
                let out = cache.get_or_compute(CacheKey::new("period").int(t), || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    vec![t as f64]
                });
                assert_eq!(out.values(), &[t as f64]);
            });
        }
    });

    assert_eq!(calls.load(Ordering::SeqCst), THREADS);
    assert_eq!(cache.len(), THREADS);
}

#[test]
fn concurrent_composites_share_intermediates() {
    let ctx = EvaluationContext::new(make_test_bars(300), EngineConfig::default());
    let registry = Registry::with_defaults();
    let barrier = Barrier::new(THREADS);

    let requests = [
        IndicatorRequest::new("macd")
            .param("fast", 12i64)
            .param("slow", 26i64)
            .input(PriceField::Close),
        IndicatorRequest::new("macd_signal")
            .param("fast", 12i64)
            .param("slow", 26i64)
            .param("signal", 9i64)
            .input(PriceField::Close),
        IndicatorRequest::new("adx").param("period", 14i64),
        IndicatorRequest::new("ichimoku").param("line", "cloud_up"),
    ];

    let outputs: Vec<Vec<_>> = thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                s.spawn(|| {
                    barrier.wait();
                    requests
                        .iter()
                        .map(|r| registry.evaluate(&ctx, r).unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for per_thread in &outputs[1..] {
        for (a, b) in per_thread.iter().zip(&outputs[0]) {
            assert!(a.ptr_eq(b));
        }
    }

    // The serial path afterwards is all hits
    let before = ctx.cache_stats();
    let close = ctx.source(PriceField::Close);
    let _ = ctx.ema(&close, 12);
    let _ = ctx.atr(14);
    let after = ctx.cache_stats();
    assert_eq!(after.misses, before.misses);
    assert_eq!(after.entries, before.entries);
}

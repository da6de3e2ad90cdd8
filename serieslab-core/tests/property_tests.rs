//! Property tests for indicator invariants.
//!
//! Uses proptest to verify:
//! 1. Rolling extremes match a naive window scan for every period
//! 2. EMA follows its recurrence exactly, seeded with the first value
//! 3. MACD equals the pointwise difference of its two EMAs
//! 4. Degenerate periods (0) behave as period 1
//! 5. Cached context results equal the pure functions

use chrono::NaiveDate;
use proptest::prelude::*;
use serieslab_core::domain::{Bar, PriceField};
use serieslab_core::engine::{EngineConfig, EvaluationContext};
use serieslab_core::indicators;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_series() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(1.0..500.0_f64, 1..80)
}

fn arb_period() -> impl Strategy<Value = usize> {
    1usize..30
}

fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
    let base = NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Bar {
            timestamp: base + chrono::Duration::days(i as i64),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1000.0 + i as f64,
        })
        .collect()
}

fn naive_window(values: &[f64], i: usize, period: usize) -> &[f64] {
    &values[(i + 1).saturating_sub(period)..=i]
}

// ── 1. Rolling extremes ──────────────────────────────────────────────

proptest! {
    #[test]
    fn highest_matches_naive_scan(values in arb_series(), period in arb_period()) {
        let out = indicators::highest(&values, period);
        prop_assert_eq!(out.len(), values.len());
        for (i, &h) in out.iter().enumerate() {
            let expected = naive_window(&values, i, period)
                .iter()
                .copied()
                .fold(f64::NEG_INFINITY, f64::max);
            prop_assert_eq!(h, expected);
        }
    }

    #[test]
    fn lowest_matches_naive_scan(values in arb_series(), period in arb_period()) {
        let out = indicators::lowest(&values, period);
        for (i, &l) in out.iter().enumerate() {
            let expected = naive_window(&values, i, period)
                .iter()
                .copied()
                .fold(f64::INFINITY, f64::min);
            prop_assert_eq!(l, expected);
        }
    }

    #[test]
    fn sum_for_matches_naive_scan(values in arb_series(), period in arb_period()) {
        let out = indicators::sum_for(&values, period);
        for (i, &s) in out.iter().enumerate() {
            let expected: f64 = naive_window(&values, i, period).iter().sum();
            prop_assert!((s - expected).abs() < 1e-6, "bar {}: {} vs {}", i, s, expected);
        }
    }
}

// ── 2. EMA recurrence ────────────────────────────────────────────────

proptest! {
    #[test]
    fn ema_follows_recurrence(values in arb_series(), period in arb_period()) {
        let out = indicators::ema(&values, period);
        let alpha = 2.0 / (period as f64 + 1.0);
        prop_assert_eq!(out[0], values[0]);
        for i in 1..out.len() {
            let expected = out[i - 1] + alpha * (values[i] - out[i - 1]);
            prop_assert!((out[i] - expected).abs() < 1e-9);
        }
    }
}

// ── 3. MACD consistency ──────────────────────────────────────────────

proptest! {
    #[test]
    fn macd_is_ema_difference(values in arb_series(), fast in arb_period(), slow in arb_period()) {
        let line = indicators::macd(&values, fast, slow);
        let f = indicators::ema(&values, fast);
        let s = indicators::ema(&values, slow);
        for i in 0..values.len() {
            prop_assert!((line[i] - (f[i] - s[i])).abs() < 1e-12);
        }
    }
}

// ── 4. Degenerate periods ────────────────────────────────────────────

proptest! {
    #[test]
    fn period_zero_behaves_as_one(values in arb_series()) {
        prop_assert_eq!(indicators::highest(&values, 0), indicators::highest(&values, 1));
        prop_assert_eq!(indicators::lowest(&values, 0), indicators::lowest(&values, 1));
        prop_assert_eq!(indicators::sma(&values, 0), indicators::sma(&values, 1));
        prop_assert_eq!(indicators::ema(&values, 0), indicators::ema(&values, 1));
        prop_assert_eq!(
            indicators::nbars_fall(&values, 0),
            indicators::nbars_fall(&values, 1)
        );
    }
}

// ── 5. Cached context matches pure functions ─────────────────────────

proptest! {
    #[test]
    fn context_matches_pure_functions(values in arb_series(), period in 0usize..30) {
        let ctx = EvaluationContext::new(bars_from_closes(&values), EngineConfig::default());
        let close = ctx.source(PriceField::Close);

        prop_assert_eq!(ctx.highest(&close, period).to_vec(), indicators::highest(&values, period));
        prop_assert_eq!(ctx.ema(&close, period).to_vec(), indicators::ema(&values, period));
        prop_assert_eq!(ctx.tema(&close, period).to_vec(), indicators::tema(&values, period));
        prop_assert_eq!(ctx.atr(period).to_vec(), indicators::atr(ctx.bars(), period));

        // Every lookup after the first is a hit on the same buffer
        let again = ctx.highest(&close, period);
        prop_assert!(again.ptr_eq(&ctx.highest(&close, period.max(1))));
    }
}

//! Worked scenarios with hand-checked values.
//!
//! Each test pins a small input whose output can be verified on paper, and
//! runs it both through the pure functions and through a cached context.

use chrono::NaiveDate;
use serieslab_core::domain::{Bar, PriceField};
use serieslab_core::engine::{EngineConfig, EvaluationContext, IndicatorRequest, Registry};
use serieslab_core::indicators;

fn bars_from_closes(closes: &[f64], volume: f64) -> Vec<Bar> {
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
            high: close,
            low: close,
            close,
            volume,
        })
        .collect()
}

fn round3(values: &[f64]) -> Vec<f64> {
    values.iter().map(|v| (v * 1000.0).round() / 1000.0).collect()
}

// ── Rolling extremes ─────────────────────────────────────────────────

#[test]
fn highest_and_lowest_period_two() {
    let closes = [10.0, 12.0, 11.0, 13.0, 9.0];
    assert_eq!(
        indicators::highest(&closes, 2),
        vec![10.0, 12.0, 12.0, 13.0, 13.0]
    );
    assert_eq!(
        indicators::lowest(&closes, 2),
        vec![10.0, 10.0, 11.0, 11.0, 9.0]
    );

    let ctx = EvaluationContext::new(bars_from_closes(&closes, 100.0), EngineConfig::default());
    let close = ctx.source(PriceField::Close);
    assert_eq!(ctx.highest(&close, 2).values(), &[10.0, 12.0, 12.0, 13.0, 13.0]);
    assert_eq!(ctx.lowest(&close, 2).values(), &[10.0, 10.0, 11.0, 11.0, 9.0]);
}

#[test]
fn highest_period_zero_is_identity() {
    let closes = [10.0, 12.0, 11.0, 13.0, 9.0];
    assert_eq!(indicators::highest(&closes, 0), closes.to_vec());
    assert_eq!(indicators::lowest(&closes, 0), closes.to_vec());
}

// ── EMA ──────────────────────────────────────────────────────────────

#[test]
fn ema_period_two() {
    let values = [1.0, 2.0, 3.0, 4.0, 5.0];
    let expected = vec![1.0, 1.667, 2.556, 3.519, 4.506];
    assert_eq!(round3(&indicators::ema(&values, 2)), expected);

    let ctx = EvaluationContext::new(bars_from_closes(&values, 100.0), EngineConfig::default());
    let req = IndicatorRequest::new("ema")
        .param("period", 2i64)
        .input(PriceField::Close);
    let out = Registry::with_defaults().evaluate(&ctx, &req).unwrap();
    assert_eq!(round3(&out), expected);
}

// ── Cumulative volume indicators ─────────────────────────────────────

#[test]
fn equal_closes_carry_cumulative_value_forward() {
    let closes = [10.0, 11.0, 11.0, 11.0, 10.0];
    let ctx = EvaluationContext::new(bars_from_closes(&closes, 500.0), EngineConfig::default());
    let close = ctx.source(PriceField::Close);
    let volume = ctx.source(PriceField::Volume);

    let obv = ctx.obv(&close, &volume);
    assert_eq!(obv.values(), &[0.0, 500.0, 500.0, 500.0, 0.0]);

    let pvt = ctx.pvt(&close, &volume);
    assert!(pvt.iter().all(|v| v.is_finite()));
    assert_eq!(pvt[2], pvt[1]);
    assert_eq!(pvt[3], pvt[1]);
    assert!((pvt[1] - 50.0).abs() < 1e-12);
}

// ── Streaks ──────────────────────────────────────────────────────────

#[test]
fn growth_streak_zero_bars_behaves_as_one() {
    let closes = [1.0, 2.0, 3.0, 2.0, 4.0];
    assert_eq!(
        indicators::nbars_growth(&closes, 0),
        indicators::nbars_growth(&closes, 1)
    );
    assert_eq!(
        indicators::nbars_growth(&closes, 2),
        vec![false, false, true, false, false]
    );
}

// ── Length mismatch ──────────────────────────────────────────────────

#[test]
fn mismatched_two_series_ops_return_empty() {
    let a = [1.0, 2.0, 3.0];
    let b = [1.0, 2.0];
    assert!(indicators::obv(&a, &b).is_empty());
    assert!(indicators::pvt(&a, &b).is_empty());
    assert!(indicators::force_index(&a, &b, 2).is_empty());
    assert!(indicators::highest_var(&a, &b).is_empty());
    assert!(indicators::midline(&a, &b).is_empty());
}

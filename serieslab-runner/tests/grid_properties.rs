//! Property tests for parameter grids and sweeps.
//!
//! 1. `ParamGrid::size` equals the number of generated combinations
//! 2. Every combination is distinct
//! 3. A sweep returns one outcome per combination, each equal to a direct
//!    evaluation in a fresh context

use chrono::NaiveDate;
use proptest::prelude::*;
use serieslab_core::domain::{Bar, PriceField};
use serieslab_core::engine::{EngineConfig, EvaluationContext, IndicatorRequest, Registry};
use serieslab_runner::{sweep, ParamGrid};
use std::collections::BTreeSet;

fn make_bars(closes: &[f64]) -> Vec<Bar> {
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
            volume: 1000.0,
        })
        .collect()
}

fn arb_axis() -> impl Strategy<Value = Vec<i64>> {
    prop::collection::btree_set(1i64..40, 0..5).prop_map(|s| s.into_iter().collect())
}

proptest! {
    #[test]
    fn size_matches_combinations(a in arb_axis(), b in arb_axis(), c in arb_axis()) {
        let grid = ParamGrid::default()
            .axis("a", a.clone())
            .axis("b", b.clone())
            .axis("c", c.clone());
        let combos = grid.combinations();
        prop_assert_eq!(grid.size(), a.len() * b.len() * c.len());
        prop_assert_eq!(combos.len(), grid.size());

        let distinct: BTreeSet<String> = combos.iter().map(|p| format!("{p:?}")).collect();
        prop_assert_eq!(distinct.len(), combos.len());
    }

    #[test]
    fn sweep_equals_direct_evaluation(
        closes in prop::collection::vec(1.0..200.0_f64, 5..60),
        fast in arb_axis(),
    ) {
        let bars = make_bars(&closes);
        let template = IndicatorRequest::new("macd")
            .param("slow", 26i64)
            .input(PriceField::Close);
        let grid = ParamGrid::default().axis("fast", fast.clone());
        let results = sweep(bars.clone(), &template, &grid, true).unwrap();
        prop_assert_eq!(results.len(), fast.len());

        let registry = Registry::with_defaults();
        for outcome in results.all() {
            let ctx = EvaluationContext::new(bars.clone(), EngineConfig::default());
            let direct = registry
                .evaluate(&ctx, &template.with_params(&outcome.params))
                .unwrap();
            prop_assert_eq!(outcome.series.to_vec(), direct.to_vec());
        }
    }
}

//! Pure series transforms.
//!
//! Every function here takes slices and returns a freshly allocated `Vec`
//! of the same length as its primary input. None of them fail: degenerate
//! parameters are coerced (period 0 behaves as period 1) and warm-up bars
//! get the partial-window value. Two-series operations with mismatched
//! lengths return an empty vector.
//!
//! The `engine::EvaluationContext` wraps each of these in the dependency
//! cache; call them directly only when memoization is not wanted.

pub mod adx;
pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod ichimoku;
pub mod kama;
pub mod macd;
pub mod mesa;
pub mod rolling;
pub mod shift;
pub mod sma;
pub mod streak;
pub mod volume;

pub use adx::{adx, directional_movement, AdxOutput};
pub use atr::{atr, true_range};
pub use bollinger::{bollinger, rolling_stddev, BollingerBand};
pub use ema::{ema, tema, wilder};
pub use ichimoku::{cloud, ichimoku, midline, midpoint, span_a_on_top, IchimokuLine, IchimokuParams};
pub use kama::kama;
pub use macd::{macd, macd_histogram, macd_signal};
pub use mesa::{fama, mama, mama_fama, MesaLimits};
pub use rolling::{
    highest, highest_bar_index, highest_var, lowest, lowest_bar_index, lowest_var, sum_for,
};
pub use shift::{shift_backward, shift_forward, ShiftFill};
pub use sma::sma;
pub use streak::{nbars_fall, nbars_growth};
pub use volume::{force_index, obv, pvt};

/// Coerce a window length: anything below 1 becomes 1.
pub fn normalize_period(period: usize) -> usize {
    period.max(1)
}

/// Window length from a floating driving value: rounded to nearest, floor 1.
///
/// NaN and infinities count as 1 so a broken driving series never panics.
pub fn effective_period(value: f64) -> usize {
    if !value.is_finite() || value < 1.0 {
        return 1;
    }
    // `as` saturates for values beyond usize::MAX
    (value.round() as usize).max(1)
}

/// Create synthetic bars from close prices for testing.
///
/// Generates plausible OHLV: open = prev_close (or close for first bar),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0, volume = 1000.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<crate::domain::Bar> {
    use crate::domain::Bar;
    let base = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                timestamp: base + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

/// Bars from explicit (open, high, low, close) tuples.
#[cfg(test)]
pub fn make_ohlc_bars(data: &[(f64, f64, f64, f64)]) -> Vec<crate::domain::Bar> {
    use crate::domain::Bar;
    let base = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    data.iter()
        .enumerate()
        .map(|(i, &(open, high, low, close))| Bar {
            timestamp: base + chrono::Duration::days(i as i64),
            open,
            high,
            low,
            close,
            volume: 1000.0,
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_period_floors_at_one() {
        assert_eq!(normalize_period(0), 1);
        assert_eq!(normalize_period(1), 1);
        assert_eq!(normalize_period(14), 14);
    }

    #[test]
    fn effective_period_rounds_and_floors() {
        assert_eq!(effective_period(2.4), 2);
        assert_eq!(effective_period(2.5), 3);
        assert_eq!(effective_period(0.2), 1);
        assert_eq!(effective_period(-7.0), 1);
        assert_eq!(effective_period(f64::NAN), 1);
        assert_eq!(effective_period(f64::INFINITY), 1);
    }
}

//! Simple Moving Average (SMA).
//!
//! Rolling mean over the trailing window. During warm-up the mean is taken
//! over the bars available so far (partial window).

use super::normalize_period;
use super::rolling::sum_for;

pub fn sma(values: &[f64], period: usize) -> Vec<f64> {
    let period = normalize_period(period);
    sum_for(values, period)
        .into_iter()
        .enumerate()
        .map(|(i, sum)| sum / (i + 1).min(period) as f64)
        .collect()
}

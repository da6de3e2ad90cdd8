//! Rolling window primitives: trailing extrema and sums.
//!
//! output[i] covers input[max(0, i-period+1) ..= i]. During warm-up the
//! window is simply shorter (partial-window value), never NaN.
//!
//! Fixed-period extrema use a monotonic deque (amortised O(n)).
//! Variable-period extrema take a driving series that supplies the window
//! length per bar; see `effective_period` for the rounding rule.

use super::{effective_period, normalize_period};
use std::collections::VecDeque;

/// First index of the trailing window ending at `i`.
fn window_start(i: usize, period: usize) -> usize {
    (i + 1).saturating_sub(period)
}

/// Index of the extremum in each trailing window.
///
/// `dominates(a, b)` is true when `a` should replace `b` at the back of the
/// deque. Using a non-strict comparison keeps the most recent bar on ties.
fn rolling_extreme_index(
    values: &[f64],
    period: usize,
    dominates: impl Fn(f64, f64) -> bool,
) -> Vec<usize> {
    let period = normalize_period(period);
    let mut out = Vec::with_capacity(values.len());
    let mut window: VecDeque<usize> = VecDeque::with_capacity(period.min(values.len()));

    for (i, &v) in values.iter().enumerate() {
        while let Some(&back) = window.back() {
            if dominates(v, values[back]) {
                window.pop_back();
            } else {
                break;
            }
        }
        window.push_back(i);

        let start = window_start(i, period);
        while let Some(&front) = window.front() {
            if front < start {
                window.pop_front();
            } else {
                break;
            }
        }

        // The deque always holds at least `i`
        out.push(window.front().copied().unwrap_or(i));
    }

    out
}

/// Highest value in the trailing window.
pub fn highest(values: &[f64], period: usize) -> Vec<f64> {
    rolling_extreme_index(values, period, |new, old| new >= old)
        .into_iter()
        .map(|idx| values[idx])
        .collect()
}

/// Lowest value in the trailing window.
pub fn lowest(values: &[f64], period: usize) -> Vec<f64> {
    rolling_extreme_index(values, period, |new, old| new <= old)
        .into_iter()
        .map(|idx| values[idx])
        .collect()
}

/// Absolute bar index of the highest value in the trailing window.
/// Ties resolve to the most recent bar.
pub fn highest_bar_index(values: &[f64], period: usize) -> Vec<f64> {
    rolling_extreme_index(values, period, |new, old| new >= old)
        .into_iter()
        .map(|idx| idx as f64)
        .collect()
}

/// Absolute bar index of the lowest value in the trailing window.
/// Ties resolve to the most recent bar.
pub fn lowest_bar_index(values: &[f64], period: usize) -> Vec<f64> {
    rolling_extreme_index(values, period, |new, old| new <= old)
        .into_iter()
        .map(|idx| idx as f64)
        .collect()
}

/// Trailing sum over the window.
///
/// Kept as a running add/subtract, so an infinity that enters and later
/// leaves the window turns every following sum into NaN (inf - inf).
pub fn sum_for(values: &[f64], period: usize) -> Vec<f64> {
    let period = normalize_period(period);
    let mut out = Vec::with_capacity(values.len());
    let mut sum = 0.0;

    for (i, &v) in values.iter().enumerate() {
        sum += v;
        if i >= period {
            sum -= values[i - period];
        }
        out.push(sum);
    }

    out
}

fn variable_extreme(values: &[f64], periods: &[f64], pick: fn(f64, f64) -> f64) -> Vec<f64> {
    if values.len() != periods.len() {
        return Vec::new();
    }

    values
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            let start = window_start(i, effective_period(periods[i]));
            values[start..i].iter().fold(v, |acc, &x| pick(acc, x))
        })
        .collect()
}

/// Highest value over a per-bar window length taken from `periods`.
///
/// Returns an empty vector when the two series differ in length.
pub fn highest_var(values: &[f64], periods: &[f64]) -> Vec<f64> {
    variable_extreme(values, periods, f64::max)
}

/// Lowest value over a per-bar window length taken from `periods`.
///
/// Returns an empty vector when the two series differ in length.
pub fn lowest_var(values: &[f64], periods: &[f64]) -> Vec<f64> {
    variable_extreme(values, periods, f64::min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    fn naive_max(values: &[f64], period: usize) -> Vec<f64> {
        let period = period.max(1);
        (0..values.len())
            .map(|i| {
                values[window_start(i, period)..=i]
                    .iter()
                    .copied()
                    .fold(f64::NEG_INFINITY, f64::max)
            })
            .collect()
    }

    #[test]
    fn highest_and_lowest_period_2() {
        let closes = [10.0, 12.0, 11.0, 13.0, 9.0];
        assert_eq!(highest(&closes, 2), vec![10.0, 12.0, 12.0, 13.0, 13.0]);
        assert_eq!(lowest(&closes, 2), vec![10.0, 10.0, 11.0, 11.0, 9.0]);
    }

    #[test]
    fn highest_matches_naive_scan() {
        let values = [5.0, 1.0, 4.0, 4.0, 2.0, 8.0, 3.0, 3.0, 7.0, 0.5];
        for period in 1..12 {
            assert_eq!(highest(&values, period), naive_max(&values, period), "period {period}");
        }
    }

    #[test]
    fn period_zero_behaves_as_one() {
        let values = [3.0, 1.0, 2.0];
        assert_eq!(highest(&values, 0), highest(&values, 1));
        assert_eq!(lowest(&values, 0), values.to_vec());
        assert_eq!(sum_for(&values, 0), values.to_vec());
    }

    #[test]
    fn empty_input() {
        assert!(highest(&[], 3).is_empty());
        assert!(sum_for(&[], 3).is_empty());
    }

    #[test]
    fn bar_index_prefers_most_recent_tie() {
        let values = [1.0, 3.0, 3.0, 2.0];
        assert_eq!(highest_bar_index(&values, 3), vec![0.0, 1.0, 2.0, 2.0]);
        let values = [2.0, 1.0, 1.0, 5.0];
        assert_eq!(lowest_bar_index(&values, 3), vec![0.0, 1.0, 2.0, 2.0]);
    }

    #[test]
    fn sum_for_trailing_window() {
        let result = sum_for(&[1.0, 2.0, 3.0, 4.0, 5.0], 3);
        let expected = [1.0, 3.0, 6.0, 9.0, 12.0];
        for (a, e) in result.iter().zip(expected) {
            assert_approx(*a, e, DEFAULT_EPSILON);
        }
    }

    #[test]
    fn sum_for_poisoned_after_infinity_leaves_window() {
        let result = sum_for(&[1.0, f64::INFINITY, 2.0, 3.0, 4.0], 2);
        assert_eq!(result[0], 1.0);
        assert_eq!(result[1], f64::INFINITY);
        assert_eq!(result[2], f64::INFINITY);
        assert!(result[3..].iter().all(|v| v.is_nan()));
    }

    #[test]
    fn variable_period_follows_driver() {
        let values = [10.0, 12.0, 11.0, 13.0, 9.0];
        let periods = [1.0, 1.0, 3.0, 0.0, 4.6];
        // bar 2: max(10,12,11)=12; bar 3: period 0 -> 1; bar 4: round(4.6)=5 -> whole history
        assert_eq!(highest_var(&values, &periods), vec![10.0, 12.0, 12.0, 13.0, 13.0]);
        assert_eq!(lowest_var(&values, &periods), vec![10.0, 12.0, 10.0, 13.0, 9.0]);
    }

    #[test]
    fn variable_period_constant_driver_matches_fixed() {
        let values = [5.0, 1.0, 4.0, 4.0, 2.0, 8.0, 3.0];
        let periods = vec![3.0; values.len()];
        assert_eq!(highest_var(&values, &periods), highest(&values, 3));
        assert_eq!(lowest_var(&values, &periods), lowest(&values, 3));
    }

    #[test]
    fn variable_period_length_mismatch_is_empty() {
        assert!(highest_var(&[1.0, 2.0], &[1.0]).is_empty());
        assert!(lowest_var(&[1.0], &[]).is_empty());
    }
}

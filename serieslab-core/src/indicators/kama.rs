//! Kaufman-style adaptive moving average driven by an efficiency ratio.
//!
//! ER[t]  = |x[t] - x[t-period]| / (1e-9 + sum of |x[j] - x[j-1]| over the last `period` steps)
//! sc[t]  = (ER * (fast_sc - slow_sc) + slow_sc)^2
//! out[t] = out[t-1] + sc * (x[t] - out[t-1])
//!
//! fast_sc = 2/(fast+1), slow_sc = 2/(slow+1). The recurrence is seeded with
//! x[0] and starts at bar `period + 2`; earlier bars stay 0.0.

use super::normalize_period;

/// Guards the efficiency ratio against a flat window.
const NOISE_FLOOR: f64 = 1e-9;

fn smoothing_constant(n: usize) -> f64 {
    2.0 / (normalize_period(n) as f64 + 1.0)
}

pub fn kama(values: &[f64], period: usize, fast: usize, slow: usize) -> Vec<f64> {
    let period = normalize_period(period);
    let n = values.len();
    let mut out = vec![0.0; n];
    // A saturated period (huge float from a sweep) can never fit the input
    let Some(start) = period.checked_add(2) else {
        return out;
    };
    if n < start {
        return out;
    }

    let fast_sc = smoothing_constant(fast);
    let slow_sc = smoothing_constant(slow);
    let mut prev = values[0];

    for i in start..n {
        let signal = (values[i] - values[i - period]).abs();
        let noise = NOISE_FLOOR
            + (0..period)
                .map(|j| (values[i - j] - values[i - j - 1]).abs())
                .sum::<f64>();
        let er = signal / noise;
        let sc = (er * (fast_sc - slow_sc) + slow_sc).powi(2);

        prev += sc * (values[i] - prev);
        out[i] = prev;
    }

    out
}

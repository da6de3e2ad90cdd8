//! N-bar growth/fall streak detectors.
//!
//! `nbars_growth(s, n)[i]` is true when each of the last `n` steps ending at
//! bar i strictly rose. Bars with fewer than `n` prior steps are false.

use super::normalize_period;

fn streak(values: &[f64], n: usize, step_ok: impl Fn(f64, f64) -> bool) -> Vec<bool> {
    let n = normalize_period(n);
    let mut run = 0usize;
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            run = if i > 0 && step_ok(values[i - 1], v) { run + 1 } else { 0 };
            run >= n
        })
        .collect()
}

pub fn nbars_growth(values: &[f64], n: usize) -> Vec<bool> {
    streak(values, n, |prev, cur| cur > prev)
}

pub fn nbars_fall(values: &[f64], n: usize) -> Vec<bool> {
    streak(values, n, |prev, cur| cur < prev)
}

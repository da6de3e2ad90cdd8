//! Exponential smoothing family: EMA, Wilder smoothing, TEMA.
//!
//! EMA[0] = x[0]
//! EMA[t] = EMA[t-1] + alpha * (x[t] - EMA[t-1]),  alpha = 2 / (period + 1)
//!
//! Wilder smoothing is the same recurrence with alpha = 1 / period.
//! TEMA = 3*E1 - 3*E2 + E3 where E2 = EMA(E1), E3 = EMA(E2).

use super::normalize_period;

/// Single-pole IIR filter seeded with the first input.
fn exp_smooth(values: &[f64], alpha: f64) -> Vec<f64> {
    let mut out = Vec::with_capacity(values.len());
    let mut iter = values.iter();

    let Some(&first) = iter.next() else {
        return out;
    };
    out.push(first);

    let mut prev = first;
    for &v in iter {
        prev += alpha * (v - prev);
        out.push(prev);
    }

    out
}

/// Exponential Moving Average.
pub fn ema(values: &[f64], period: usize) -> Vec<f64> {
    let period = normalize_period(period);
    exp_smooth(values, 2.0 / (period as f64 + 1.0))
}

/// Wilder smoothing (SMMA): EMA with alpha = 1/period.
pub fn wilder(values: &[f64], period: usize) -> Vec<f64> {
    let period = normalize_period(period);
    exp_smooth(values, 1.0 / period as f64)
}

/// Triple EMA.
pub fn tema(values: &[f64], period: usize) -> Vec<f64> {
    let e1 = ema(values, period);
    let e2 = ema(&e1, period);
    let e3 = ema(&e2, period);
    combine_tema(&e1, &e2, &e3)
}

/// 3*E1 - 3*E2 + E3, pointwise.
pub fn combine_tema(e1: &[f64], e2: &[f64], e3: &[f64]) -> Vec<f64> {
    e1.iter()
        .zip(e2)
        .zip(e3)
        .map(|((a, b), c)| 3.0 * a - 3.0 * b + c)
        .collect()
}

//! MACD: difference of two EMAs, its signal line, and the histogram.
//!
//! MACD[t]      = EMA(x, fast)[t] - EMA(x, slow)[t]
//! Signal[t]    = EMA(MACD, signal_period)[t]
//! Histogram[t] = MACD[t] - Signal[t]

use super::ema::ema;

/// Pointwise difference of two equal-length series; empty on length mismatch.
pub fn difference(a: &[f64], b: &[f64]) -> Vec<f64> {
    if a.len() != b.len() {
        return Vec::new();
    }
    a.iter().zip(b).map(|(x, y)| x - y).collect()
}

pub fn macd(values: &[f64], fast: usize, slow: usize) -> Vec<f64> {
    difference(&ema(values, fast), &ema(values, slow))
}

pub fn macd_signal(values: &[f64], fast: usize, slow: usize, signal: usize) -> Vec<f64> {
    ema(&macd(values, fast, slow), signal)
}

pub fn macd_histogram(values: &[f64], fast: usize, slow: usize, signal: usize) -> Vec<f64> {
    let line = macd(values, fast, slow);
    let sig = ema(&line, signal);
    difference(&line, &sig)
}

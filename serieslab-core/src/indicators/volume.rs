//! Volume-weighted series: Force Index, On-Balance Volume, Price-Volume Trend.
//!
//! All three take a price series and a volume series of the same length and
//! return an empty vector otherwise. OBV and PVT are cumulative: a bar whose
//! close equals the previous close carries the prior value forward.

use super::ema::ema;

/// Force Index[t] = volume[t] * (EMA(price)[t] - EMA(price)[t-1]); bar 0 is 0.
pub fn force_index(price: &[f64], volume: &[f64], period: usize) -> Vec<f64> {
    if price.len() != volume.len() {
        return Vec::new();
    }
    force_index_from_ema(&ema(price, period), volume)
}

/// Force Index from a precomputed EMA of price.
pub fn force_index_from_ema(price_ema: &[f64], volume: &[f64]) -> Vec<f64> {
    if price_ema.len() != volume.len() {
        return Vec::new();
    }
    (0..price_ema.len())
        .map(|i| {
            if i == 0 {
                0.0
            } else {
                volume[i] * (price_ema[i] - price_ema[i - 1])
            }
        })
        .collect()
}

/// On-Balance Volume, starting at 0.
pub fn obv(close: &[f64], volume: &[f64]) -> Vec<f64> {
    if close.len() != volume.len() {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(close.len());
    let mut acc = 0.0;
    for i in 0..close.len() {
        if i > 0 {
            if close[i] > close[i - 1] {
                acc += volume[i];
            } else if close[i] < close[i - 1] {
                acc -= volume[i];
            }
        }
        out.push(acc);
    }
    out
}

/// Price-Volume Trend, starting at 0.
///
/// PVT[t] = PVT[t-1] + volume[t] * (close[t] - close[t-1]) / close[t-1].
/// A zero previous close contributes nothing.
pub fn pvt(close: &[f64], volume: &[f64]) -> Vec<f64> {
    if close.len() != volume.len() {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(close.len());
    let mut acc = 0.0;
    for i in 0..close.len() {
        if i > 0 && close[i - 1] != 0.0 {
            acc += volume[i] * (close[i] - close[i - 1]) / close[i - 1];
        }
        out.push(acc);
    }
    out
}

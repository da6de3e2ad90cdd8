//! True Range and Average True Range (ATR).
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|).
//! The first bar has no previous close, so TR[0] = high[0] - low[0].
//! ATR is the Wilder-smoothed true range (alpha = 1/period).

use super::ema::wilder;
use crate::domain::Bar;

/// Compute the True Range series from bars.
pub fn true_range(bars: &[Bar]) -> Vec<f64> {
    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            let range = bar.high - bar.low;
            if i == 0 {
                return range;
            }
            let pc = bars[i - 1].close;
            range.max((bar.high - pc).abs()).max((bar.low - pc).abs())
        })
        .collect()
}

/// Average True Range.
pub fn atr(bars: &[Bar], period: usize) -> Vec<f64> {
    wilder(&true_range(bars), period)
}

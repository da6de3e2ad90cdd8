//! Bollinger Bands.
//!
//! Middle = SMA(period).
//! Upper/Lower = Middle ± k * population stddev over the same window.
//! During warm-up both use the partial window.

use super::normalize_period;
use super::sma::sma;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BollingerBand {
    Upper,
    Middle,
    Lower,
}

impl BollingerBand {
    /// The two-way selector hosts use: `true` is the upper band.
    pub fn from_upper_flag(upper: bool) -> Self {
        if upper {
            BollingerBand::Upper
        } else {
            BollingerBand::Lower
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BollingerBand::Upper => "upper",
            BollingerBand::Middle => "middle",
            BollingerBand::Lower => "lower",
        }
    }
}

/// Population standard deviation around a precomputed window mean.
pub fn rolling_stddev(values: &[f64], means: &[f64], period: usize) -> Vec<f64> {
    let period = normalize_period(period);
    means
        .iter()
        .take(values.len())
        .enumerate()
        .map(|(i, &mean)| {
            let window = &values[(i + 1).saturating_sub(period)..=i];
            let var = window.iter().map(|&x| (x - mean).powi(2)).sum::<f64>() / window.len() as f64;
            var.sqrt()
        })
        .collect()
}

pub fn bollinger(values: &[f64], period: usize, k: f64, band: BollingerBand) -> Vec<f64> {
    let middle = sma(values, period);
    if band == BollingerBand::Middle {
        return middle;
    }
    let dev = rolling_stddev(values, &middle, period);
    let sign = if band == BollingerBand::Upper { 1.0 } else { -1.0 };
    middle
        .iter()
        .zip(&dev)
        .map(|(&m, &sd)| m + sign * k * sd)
        .collect()
}

//! ADX: Average Directional Index (Wilder).
//!
//! Steps:
//! 1. Compute +DM and -DM from consecutive bars
//! 2. Smooth +DM, -DM, and TR using Wilder smoothing (alpha = 1/period)
//! 3. +DI = 100 * smoothed(+DM) / smoothed(TR)
//! 4. -DI = 100 * smoothed(-DM) / smoothed(TR)
//! 5. DX = 100 * |+DI - -DI| / (+DI + -DI)
//! 6. ADX = Wilder-smoothed DX
//!
//! ADXR[t] = (ADX[t] + ADX[t-interval]) / 2, or ADX[t] before `interval` bars exist.
//! Every zero denominator yields 0, never NaN.

use super::atr::true_range;
use super::ema::wilder;
use crate::domain::Bar;
use serde::{Deserialize, Serialize};

/// Which line of the directional system to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdxOutput {
    Adx,
    PlusDi,
    MinusDi,
    Adxr,
}

impl AdxOutput {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdxOutput::Adx => "adx",
            AdxOutput::PlusDi => "plus_di",
            AdxOutput::MinusDi => "minus_di",
            AdxOutput::Adxr => "adxr",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "adx" => Some(AdxOutput::Adx),
            "plus_di" => Some(AdxOutput::PlusDi),
            "minus_di" => Some(AdxOutput::MinusDi),
            "adxr" => Some(AdxOutput::Adxr),
            _ => None,
        }
    }
}

/// +DM and -DM per bar. Bar 0 has no previous bar and gets 0 for both.
///
/// Only the larger of the two moves survives; equal moves, or two
/// negative moves, zero both.
pub fn directional_movement(bars: &[Bar]) -> (Vec<f64>, Vec<f64>) {
    let n = bars.len();
    let mut plus_dm = vec![0.0; n];
    let mut minus_dm = vec![0.0; n];

    for i in 1..n {
        let mut up = bars[i].high - bars[i - 1].high;
        let mut down = bars[i - 1].low - bars[i].low;

        if (up < 0.0 && down < 0.0) || up == down {
            up = 0.0;
            down = 0.0;
        }
        if down > up {
            up = 0.0;
        }
        if up > down {
            down = 0.0;
        }

        plus_dm[i] = up;
        minus_dm[i] = down;
    }

    (plus_dm, minus_dm)
}

/// 100 * dm / tr, with tr == 0 giving 0.
pub fn directional_index(smoothed_dm: &[f64], smoothed_tr: &[f64]) -> Vec<f64> {
    smoothed_dm
        .iter()
        .zip(smoothed_tr)
        .map(|(&dm, &tr)| if tr == 0.0 { 0.0 } else { 100.0 * dm / tr })
        .collect()
}

/// DX from the two DI lines, with a zero sum giving 0.
pub fn dx(plus_di: &[f64], minus_di: &[f64]) -> Vec<f64> {
    plus_di
        .iter()
        .zip(minus_di)
        .map(|(&p, &m)| {
            let sum = p + m;
            if sum == 0.0 {
                0.0
            } else {
                100.0 * (p - m).abs() / sum
            }
        })
        .collect()
}

/// ADXR from an ADX line.
pub fn adxr(adx_line: &[f64], interval: usize) -> Vec<f64> {
    adx_line
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            if i < interval {
                v
            } else {
                (v + adx_line[i - interval]) / 2.0
            }
        })
        .collect()
}

/// Full directional system on bars.
pub fn adx(bars: &[Bar], period: usize, output: AdxOutput, adxr_interval: usize) -> Vec<f64> {
    let (plus_dm, minus_dm) = directional_movement(bars);
    let smooth_tr = wilder(&true_range(bars), period);
    let plus_di = directional_index(&wilder(&plus_dm, period), &smooth_tr);
    let minus_di = directional_index(&wilder(&minus_dm, period), &smooth_tr);

    match output {
        AdxOutput::PlusDi => plus_di,
        AdxOutput::MinusDi => minus_di,
        AdxOutput::Adx => wilder(&dx(&plus_di, &minus_di), period),
        AdxOutput::Adxr => adxr(&wilder(&dx(&plus_di, &minus_di), period), adxr_interval),
    }
}

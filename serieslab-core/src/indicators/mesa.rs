//! MESA Adaptive Moving Average (MAMA) and its Following line (FAMA).
//!
//! A Hilbert-transform style recurrence estimates the dominant cycle period
//! and the phase of the input. The smoothing constant for bar t is
//!
//!   alpha[t] = clamp(fast_limit / max(phase[t-1] - phase[t], 1), slow_limit, ..)
//!
//! MAMA[t] = alpha * x[t] + (1 - alpha) * MAMA[t-1]
//! FAMA[t] = 0.5 * alpha * MAMA[t] + (1 - 0.5 * alpha) * FAMA[t-1]
//!
//! The first six bars copy the input (the filters need six bars of history).
//! This is the classic approximate formulation and is reproduced exactly,
//! including the 0.075 * period + 0.54 amplitude correction and the
//! 6..=50 period clamp.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

const WARMUP: usize = 6;

/// Fast and slow alpha limits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MesaLimits {
    pub fast: f64,
    pub slow: f64,
}

impl Default for MesaLimits {
    fn default() -> Self {
        Self {
            fast: 0.5,
            slow: 0.05,
        }
    }
}

/// Four-tap Hilbert FIR used by every stage of the transform.
fn hilbert(buf: &[f64], j: usize, gain: f64) -> f64 {
    (0.0962 * buf[j] + 0.5769 * buf[j - 2] - 0.5769 * buf[j - 4] - 0.0962 * buf[j - 6]) * gain
}

/// Compute MAMA and FAMA together; both have the length of `price`.
pub fn mama_fama(price: &[f64], limits: MesaLimits) -> (Vec<f64>, Vec<f64>) {
    let n = price.len();
    let mut mama = price.to_vec();
    let mut fama = price.to_vec();
    if n <= WARMUP {
        return (mama, fama);
    }

    let mut smooth = vec![0.0; n];
    let mut detrender = vec![0.0; n];
    let mut i1 = vec![0.0; n];
    let mut q1 = vec![0.0; n];
    let mut i2 = vec![0.0; n];
    let mut q2 = vec![0.0; n];
    let mut period = vec![0.0; n];
    let mut phase = vec![0.0; n];
    let mut re = vec![0.0; n];
    let mut im = vec![0.0; n];

    for j in WARMUP..n {
        smooth[j] =
            (4.0 * price[j] + 3.0 * price[j - 1] + 2.0 * price[j - 2] + price[j - 3]) / 10.0;
        let gain = 0.075 * period[j - 1] + 0.54;

        detrender[j] = hilbert(&smooth, j, gain);
        q1[j] = hilbert(&detrender, j, gain);
        i1[j] = detrender[j - 3];

        let j_i = hilbert(&i1, j, gain);
        let j_q = hilbert(&q1, j, gain);

        i2[j] = i1[j] - j_q;
        q2[j] = q1[j] + j_i;
        i2[j] = 0.2 * i2[j] + 0.8 * i2[j - 1];
        q2[j] = 0.2 * q2[j] + 0.8 * q2[j - 1];

        re[j] = i2[j] * i2[j - 1] + q2[j] * q2[j - 1];
        im[j] = i2[j] * q2[j - 1] - q2[j] * i2[j - 1];
        re[j] = 0.2 * re[j] + 0.8 * re[j - 1];
        im[j] = 0.2 * im[j] + 0.8 * im[j - 1];

        if im[j] != 0.0 && re[j] != 0.0 {
            period[j] = 2.0 * PI / im[j].atan2(re[j]);
        }
        if period[j] > 1.5 * period[j - 1] {
            period[j] = 1.5 * period[j - 1];
        }
        if period[j] < 0.67 * period[j - 1] {
            period[j] = 0.67 * period[j - 1];
        }
        period[j] = period[j].clamp(6.0, 50.0);
        period[j] = 0.2 * period[j] + 0.8 * period[j - 1];

        if i1[j] != 0.0 {
            phase[j] = q1[j].atan2(i1[j]) * 180.0 / PI;
        }
        let delta_phase = (phase[j - 1] - phase[j]).max(1.0);
        let alpha = (limits.fast / delta_phase).max(limits.slow);

        mama[j] = alpha * price[j] + (1.0 - alpha) * mama[j - 1];
        fama[j] = 0.5 * alpha * mama[j] + (1.0 - 0.5 * alpha) * fama[j - 1];
    }

    (mama, fama)
}

pub fn mama(price: &[f64], limits: MesaLimits) -> Vec<f64> {
    mama_fama(price, limits).0
}

pub fn fama(price: &[f64], limits: MesaLimits) -> Vec<f64> {
    mama_fama(price, limits).1
}

//! Ichimoku Kinko Hyo lines.
//!
//! Tenkan  = midpoint(high, low, tenkan)
//! Kijun   = midpoint(high, low, kijun)
//! SenkouA = (Tenkan + Kijun) / 2, shifted forward by `kijun`
//! SenkouB = midpoint(high, low, senkou_b), shifted forward by `kijun`
//! Chinkou = close, shifted backward by `kijun`
//! Spread  = Tenkan - Kijun
//!
//! where midpoint(h, l, n) = (highest(h, n) + lowest(l, n)) / 2.
//!
//! The cloud lines pick span A or span B per bar. Span A is on top when
//! A > B, or when A == B on an even bar; on odd-bar ties B is on top. The
//! alternation decides which of two coincident segments a renderer draws.

use super::rolling::{highest, lowest};
use super::shift::{shift_backward, shift_forward, ShiftFill};
use crate::domain::{Bar, PriceField};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IchimokuLine {
    Tenkan,
    Kijun,
    SenkouA,
    SenkouB,
    Chinkou,
    CloudUp,
    CloudDown,
    Spread,
}

impl IchimokuLine {
    pub const ALL: [IchimokuLine; 8] = [
        IchimokuLine::Tenkan,
        IchimokuLine::Kijun,
        IchimokuLine::SenkouA,
        IchimokuLine::SenkouB,
        IchimokuLine::Chinkou,
        IchimokuLine::CloudUp,
        IchimokuLine::CloudDown,
        IchimokuLine::Spread,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IchimokuLine::Tenkan => "tenkan",
            IchimokuLine::Kijun => "kijun",
            IchimokuLine::SenkouA => "senkou_a",
            IchimokuLine::SenkouB => "senkou_b",
            IchimokuLine::Chinkou => "chinkou",
            IchimokuLine::CloudUp => "cloud_up",
            IchimokuLine::CloudDown => "cloud_down",
            IchimokuLine::Spread => "spread",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|line| line.as_str() == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct IchimokuParams {
    pub tenkan: usize,
    pub kijun: usize,
    pub senkou_b: usize,
}

impl Default for IchimokuParams {
    fn default() -> Self {
        Self {
            tenkan: 9,
            kijun: 26,
            senkou_b: 52,
        }
    }
}

/// Pointwise mean of two series; empty on length mismatch.
pub fn midline(upper: &[f64], lower: &[f64]) -> Vec<f64> {
    if upper.len() != lower.len() {
        return Vec::new();
    }
    upper
        .iter()
        .zip(lower)
        .map(|(&u, &l)| 0.5 * (u + l))
        .collect()
}

/// (highest(high, period) + lowest(low, period)) / 2.
pub fn midpoint(high: &[f64], low: &[f64], period: usize) -> Vec<f64> {
    midline(&highest(high, period), &lowest(low, period))
}

pub fn span_a_on_top(span_a: &[f64], span_b: &[f64]) -> Vec<bool> {
    if span_a.len() != span_b.len() {
        return Vec::new();
    }
    span_a
        .iter()
        .zip(span_b)
        .enumerate()
        .map(|(i, (&a, &b))| a > b || (a == b && i % 2 == 0))
        .collect()
}

/// The upper (`up == true`) or lower boundary of the cloud.
pub fn cloud(span_a: &[f64], span_b: &[f64], up: bool) -> Vec<f64> {
    span_a_on_top(span_a, span_b)
        .into_iter()
        .enumerate()
        .map(|(i, a_on_top)| {
            if a_on_top == up {
                span_a[i]
            } else {
                span_b[i]
            }
        })
        .collect()
}

/// One Ichimoku line computed straight from bars.
pub fn ichimoku(bars: &[Bar], params: IchimokuParams, line: IchimokuLine, fill: ShiftFill) -> Vec<f64> {
    let high = PriceField::High.extract(bars);
    let low = PriceField::Low.extract(bars);

    let tenkan = || midpoint(&high, &low, params.tenkan);
    let kijun = || midpoint(&high, &low, params.kijun);
    let span_a = || shift_forward(&midline(&tenkan(), &kijun()), params.kijun, fill);
    let span_b = || shift_forward(&midpoint(&high, &low, params.senkou_b), params.kijun, fill);

    match line {
        IchimokuLine::Tenkan => tenkan(),
        IchimokuLine::Kijun => kijun(),
        IchimokuLine::SenkouA => span_a(),
        IchimokuLine::SenkouB => span_b(),
        IchimokuLine::Chinkou => {
            shift_backward(&PriceField::Close.extract(bars), params.kijun, fill)
        }
        IchimokuLine::CloudUp => cloud(&span_a(), &span_b(), true),
        IchimokuLine::CloudDown => cloud(&span_a(), &span_b(), false),
        IchimokuLine::Spread => tenkan()
            .iter()
            .zip(kijun())
            .map(|(t, k)| t - k)
            .collect(),
    }
}

//! Evaluation context: one bar set, one dependency cache.
//!
//! Every method resolves its inputs through the cache first, then caches its
//! own output, so a composite (e.g. TEMA, ADX, Ichimoku) shares each
//! intermediate with any other consumer of the same (op, params, source).
//! Periods are normalized before keying: `highest(s, 0)` and `highest(s, 1)`
//! land on the same slot.

use super::cache::{CacheKey, CacheStats, DependencyCache};
use super::config::EngineConfig;
use crate::domain::{bools_to_series, Bar, PriceField, Series, SeriesId};
use crate::indicators::{
    self, adx, bollinger::rolling_stddev, ema::combine_tema, ichimoku, macd::difference, mesa,
    normalize_period, rolling, streak, volume::force_index_from_ema, AdxOutput, BollingerBand,
    IchimokuLine, IchimokuParams, MesaLimits,
};
use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};
use tracing::debug;

const FIELD_COUNT: usize = PriceField::ALL.len();

/// Scope of one evaluation pass over a fixed bar set.
///
/// `Send + Sync`: indicators may be requested from several threads at once
/// and still share one computation per key.
#[derive(Debug)]
pub struct EvaluationContext {
    bars: Arc<[Bar]>,
    config: EngineConfig,
    sources: [OnceLock<Series>; FIELD_COUNT],
    cache: DependencyCache,
}

impl EvaluationContext {
    pub fn new(bars: impl Into<Arc<[Bar]>>, config: EngineConfig) -> Self {
        let bars = bars.into();
        debug!(bars = bars.len(), ?config, "evaluation context created");
        Self {
            bars,
            config,
            sources: std::array::from_fn(|_| OnceLock::new()),
            cache: DependencyCache::new(config.max_cached_series),
        }
    }

    /// Swap in a new bar set. Every cached series from the old one is dropped.
    pub fn reset(&mut self, bars: impl Into<Arc<[Bar]>>) {
        let stats = self.cache.stats();
        self.bars = bars.into();
        self.sources = std::array::from_fn(|_| OnceLock::new());
        self.cache.clear();
        debug!(
            bars = self.bars.len(),
            dropped = stats.entries,
            "evaluation context reset"
        );
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn bar_count(&self) -> usize {
        self.bars.len()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn is_cached(&self, key: &CacheKey) -> bool {
        self.cache.contains(key)
    }

    /// Run `factory` once per key for the lifetime of this context.
    pub fn cached(&self, key: CacheKey, factory: impl FnOnce() -> Vec<f64>) -> Series {
        self.cache.get_or_compute(key, factory)
    }

    /// Source series for a bar field, identified by content.
    pub fn source(&self, field: PriceField) -> Series {
        self.sources[field as usize]
            .get_or_init(|| Series::from_values(field.as_str(), field.extract(&self.bars)))
            .clone()
    }

    fn source_id(&self, field: PriceField) -> SeriesId {
        self.source(field).id()
    }

    /// Key over the high/low/close sources, for operations that read bars.
    fn bar_key(&self, op: &'static str) -> CacheKey {
        CacheKey::new(op)
            .source(self.source_id(PriceField::High))
            .source(self.source_id(PriceField::Low))
            .source(self.source_id(PriceField::Close))
    }

    fn windowed(
        &self,
        op: &'static str,
        input: &Series,
        period: usize,
        f: fn(&[f64], usize) -> Vec<f64>,
    ) -> Series {
        let period = normalize_period(period);
        let key = CacheKey::new(op).int(period).source(input.id());
        self.cached(key, || f(input, period))
    }

    // ── Rolling window primitives ──

    pub fn highest(&self, input: &Series, period: usize) -> Series {
        self.windowed("highest", input, period, rolling::highest)
    }

    pub fn lowest(&self, input: &Series, period: usize) -> Series {
        self.windowed("lowest", input, period, rolling::lowest)
    }

    pub fn sum_for(&self, input: &Series, period: usize) -> Series {
        self.windowed("sum_for", input, period, rolling::sum_for)
    }

    pub fn highest_bar_index(&self, input: &Series, period: usize) -> Series {
        self.windowed("highest_bar_index", input, period, rolling::highest_bar_index)
    }

    pub fn lowest_bar_index(&self, input: &Series, period: usize) -> Series {
        self.windowed("lowest_bar_index", input, period, rolling::lowest_bar_index)
    }

    /// Highest over a per-bar window length read from `periods`.
    ///
    /// Each distinct effective period resolves to its own cached fixed-period
    /// series. Mismatched lengths give an empty series.
    pub fn highest_var(&self, input: &Series, periods: &Series) -> Series {
        self.variable_extreme("highest_var", input, periods, Self::highest)
    }

    pub fn lowest_var(&self, input: &Series, periods: &Series) -> Series {
        self.variable_extreme("lowest_var", input, periods, Self::lowest)
    }

    fn variable_extreme(
        &self,
        op: &'static str,
        input: &Series,
        periods: &Series,
        fixed: fn(&Self, &Series, usize) -> Series,
    ) -> Series {
        let key = CacheKey::new(op).source(input.id()).source(periods.id());
        self.cached(key, || {
            if input.len() != periods.len() {
                return Vec::new();
            }
            let mut by_period: BTreeMap<usize, Series> = BTreeMap::new();
            periods
                .iter()
                .enumerate()
                .map(|(i, &p)| {
                    let period = indicators::effective_period(p);
                    by_period
                        .entry(period)
                        .or_insert_with(|| fixed(self, input, period))[i]
                })
                .collect()
        })
    }

    pub fn true_range(&self) -> Series {
        self.cached(self.bar_key("true_range"), || indicators::true_range(&self.bars))
    }

    // ── Recurrence filters ──

    pub fn sma(&self, input: &Series, period: usize) -> Series {
        self.windowed("sma", input, period, indicators::sma)
    }

    pub fn ema(&self, input: &Series, period: usize) -> Series {
        self.windowed("ema", input, period, indicators::ema)
    }

    pub fn wilder(&self, input: &Series, period: usize) -> Series {
        self.windowed("wilder", input, period, indicators::wilder)
    }

    pub fn tema(&self, input: &Series, period: usize) -> Series {
        let period = normalize_period(period);
        let key = CacheKey::new("tema").int(period).source(input.id());
        self.cached(key, || {
            let e1 = self.ema(input, period);
            let e2 = self.ema(&e1, period);
            let e3 = self.ema(&e2, period);
            combine_tema(&e1, &e2, &e3)
        })
    }

    /// Pointwise `a - b`.
    pub fn difference(&self, a: &Series, b: &Series) -> Series {
        let key = CacheKey::new("difference").source(a.id()).source(b.id());
        self.cached(key, || difference(a, b))
    }

    /// Pointwise `(a + b) / 2`.
    pub fn midline(&self, a: &Series, b: &Series) -> Series {
        let key = CacheKey::new("midline").source(a.id()).source(b.id());
        self.cached(key, || ichimoku::midline(a, b))
    }

    pub fn macd(&self, input: &Series, fast: usize, slow: usize) -> Series {
        self.difference(&self.ema(input, fast), &self.ema(input, slow))
    }

    pub fn macd_signal(&self, input: &Series, fast: usize, slow: usize, signal: usize) -> Series {
        self.ema(&self.macd(input, fast, slow), signal)
    }

    pub fn macd_histogram(&self, input: &Series, fast: usize, slow: usize, signal: usize) -> Series {
        let line = self.macd(input, fast, slow);
        self.difference(&line, &self.ema(&line, signal))
    }

    pub fn force_index(&self, price: &Series, volume: &Series, period: usize) -> Series {
        let period = normalize_period(period);
        let key = CacheKey::new("force_index")
            .int(period)
            .source(price.id())
            .source(volume.id());
        self.cached(key, || {
            if price.len() != volume.len() {
                return Vec::new();
            }
            force_index_from_ema(&self.ema(price, period), volume)
        })
    }

    pub fn atr(&self, period: usize) -> Series {
        self.wilder(&self.true_range(), period)
    }

    fn directional_movement(&self, plus: bool) -> Series {
        let op = if plus { "plus_dm" } else { "minus_dm" };
        self.cached(self.bar_key(op), || {
            let (plus_dm, minus_dm) = adx::directional_movement(&self.bars);
            if plus {
                plus_dm
            } else {
                minus_dm
            }
        })
    }

    fn directional_index(&self, period: usize, plus: bool) -> Series {
        let dm = self.wilder(&self.directional_movement(plus), period);
        let tr = self.atr(period);
        let op = if plus { "plus_di" } else { "minus_di" };
        let key = CacheKey::new(op).source(dm.id()).source(tr.id());
        self.cached(key, || adx::directional_index(&dm, &tr))
    }

    fn adx_line(&self, period: usize) -> Series {
        let plus = self.directional_index(period, true);
        let minus = self.directional_index(period, false);
        let key = CacheKey::new("dx").source(plus.id()).source(minus.id());
        let dx = self.cached(key, || adx::dx(&plus, &minus));
        self.wilder(&dx, period)
    }

    pub fn adx(&self, period: usize, output: AdxOutput, adxr_interval: usize) -> Series {
        let period = normalize_period(period);
        match output {
            AdxOutput::PlusDi => self.directional_index(period, true),
            AdxOutput::MinusDi => self.directional_index(period, false),
            AdxOutput::Adx => self.adx_line(period),
            AdxOutput::Adxr => {
                let line = self.adx_line(period);
                let key = CacheKey::new("adxr").int(adxr_interval).source(line.id());
                self.cached(key, || adx::adxr(&line, adxr_interval))
            }
        }
    }

    pub fn mama(&self, input: &Series, limits: MesaLimits) -> Series {
        let key = CacheKey::new("mama")
            .float(limits.fast)
            .float(limits.slow)
            .source(input.id());
        self.cached(key, || mesa::mama(input, limits))
    }

    pub fn fama(&self, input: &Series, limits: MesaLimits) -> Series {
        let key = CacheKey::new("fama")
            .float(limits.fast)
            .float(limits.slow)
            .source(input.id());
        self.cached(key, || mesa::fama(input, limits))
    }

    pub fn kama(&self, input: &Series, period: usize, fast: usize, slow: usize) -> Series {
        let (period, fast, slow) = (
            normalize_period(period),
            normalize_period(fast),
            normalize_period(slow),
        );
        let key = CacheKey::new("kama")
            .int(period)
            .int(fast)
            .int(slow)
            .source(input.id());
        self.cached(key, || indicators::kama(input, period, fast, slow))
    }

    pub fn obv(&self, close: &Series, volume: &Series) -> Series {
        let key = CacheKey::new("obv").source(close.id()).source(volume.id());
        self.cached(key, || indicators::obv(close, volume))
    }

    pub fn pvt(&self, close: &Series, volume: &Series) -> Series {
        let key = CacheKey::new("pvt").source(close.id()).source(volume.id());
        self.cached(key, || indicators::pvt(close, volume))
    }

    /// 1.0 where the last `n` steps all rose, else 0.0.
    pub fn nbars_growth(&self, input: &Series, n: usize) -> Series {
        let n = normalize_period(n);
        let key = CacheKey::new("nbars_growth").int(n).source(input.id());
        self.cached(key, || bools_to_series(&streak::nbars_growth(input, n)))
    }

    /// 1.0 where the last `n` steps all fell, else 0.0.
    pub fn nbars_fall(&self, input: &Series, n: usize) -> Series {
        let n = normalize_period(n);
        let key = CacheKey::new("nbars_fall").int(n).source(input.id());
        self.cached(key, || bools_to_series(&streak::nbars_fall(input, n)))
    }

    // ── Composites ──

    pub fn bollinger(&self, input: &Series, period: usize, k: f64, band: BollingerBand) -> Series {
        let period = normalize_period(period);
        let middle = self.sma(input, period);
        if band == BollingerBand::Middle {
            return middle;
        }

        let dev_key = CacheKey::new("stddev").int(period).source(input.id());
        let dev = self.cached(dev_key, || rolling_stddev(input, &middle, period));
        let sign = if band == BollingerBand::Upper { 1.0 } else { -1.0 };

        let key = CacheKey::new("bollinger")
            .int(period)
            .float(k)
            .text(band.as_str())
            .source(input.id());
        self.cached(key, || {
            middle
                .iter()
                .zip(dev.iter())
                .map(|(&m, &sd)| m + sign * k * sd)
                .collect()
        })
    }

    /// output[i] = input[i - n]; vacated bars follow `EngineConfig::shift_fill`.
    pub fn shift_forward(&self, input: &Series, n: usize) -> Series {
        let fill = self.config.shift_fill;
        let key = CacheKey::new("shift_forward")
            .int(n)
            .text(fill.as_str())
            .source(input.id());
        self.cached(key, || indicators::shift_forward(input, n, fill))
    }

    /// output[i] = input[i + n]; vacated bars follow `EngineConfig::shift_fill`.
    pub fn shift_backward(&self, input: &Series, n: usize) -> Series {
        let fill = self.config.shift_fill;
        let key = CacheKey::new("shift_backward")
            .int(n)
            .text(fill.as_str())
            .source(input.id());
        self.cached(key, || indicators::shift_backward(input, n, fill))
    }

    /// (highest(high, period) + lowest(low, period)) / 2.
    pub fn midpoint(&self, period: usize) -> Series {
        let high = self.highest(&self.source(PriceField::High), period);
        let low = self.lowest(&self.source(PriceField::Low), period);
        self.midline(&high, &low)
    }

    fn senkou_spans(&self, params: IchimokuParams) -> (Series, Series) {
        let tenkan = self.midpoint(params.tenkan);
        let kijun = self.midpoint(params.kijun);
        let span_a = self.shift_forward(&self.midline(&tenkan, &kijun), params.kijun);
        let span_b = self.shift_forward(&self.midpoint(params.senkou_b), params.kijun);
        (span_a, span_b)
    }

    pub fn ichimoku(&self, params: IchimokuParams, line: IchimokuLine) -> Series {
        match line {
            IchimokuLine::Tenkan => self.midpoint(params.tenkan),
            IchimokuLine::Kijun => self.midpoint(params.kijun),
            IchimokuLine::SenkouA => self.senkou_spans(params).0,
            IchimokuLine::SenkouB => self.senkou_spans(params).1,
            IchimokuLine::Chinkou => {
                self.shift_backward(&self.source(PriceField::Close), params.kijun)
            }
            IchimokuLine::CloudUp => self.cloud(params, true),
            IchimokuLine::CloudDown => self.cloud(params, false),
            IchimokuLine::Spread => self.difference(
                &self.midpoint(params.tenkan),
                &self.midpoint(params.kijun),
            ),
        }
    }

    fn cloud(&self, params: IchimokuParams, up: bool) -> Series {
        let (a, b) = self.senkou_spans(params);
        let key = CacheKey::new("cloud").flag(up).source(a.id()).source(b.id());
        self.cached(key, || ichimoku::cloud(&a, &b, up))
    }

    /// 1.0 on bars where Senkou span A is the upper cloud boundary.
    pub fn span_a_on_top(&self, params: IchimokuParams) -> Series {
        let (a, b) = self.senkou_spans(params);
        let key = CacheKey::new("span_a_on_top").source(a.id()).source(b.id());
        self.cached(key, || bools_to_series(&ichimoku::span_a_on_top(&a, &b)))
    }
}

//! Operation registry: name -> pure evaluator over cached series.
//!
//! Every operation the context exposes is reachable by a stable name. The
//! registry checks input arity and parameter names, resolves inputs
//! bottom-up, and hands them to the evaluator, which calls the matching
//! cached `EvaluationContext` method. A request and a direct method call with
//! the same arguments therefore share one cache slot.

use super::context::EvaluationContext;
use super::error::EngineError;
use super::request::{IndicatorRequest, ParamValue, Params, RequestInput};
use crate::domain::Series;
use crate::indicators::{
    effective_period, AdxOutput, BollingerBand, IchimokuLine, IchimokuParams, MesaLimits,
};
use std::collections::BTreeMap;
use tracing::trace;

/// Typed access to one request's parameters.
pub struct Args<'a> {
    op: &'a str,
    params: &'a Params,
}

impl<'a> Args<'a> {
    pub fn new(op: &'a str, params: &'a Params) -> Self {
        Self { op, params }
    }

    fn as_usize(&self, name: &str, value: &ParamValue) -> Result<usize, EngineError> {
        match value {
            // Negative and fractional periods are coerced, never rejected
            ParamValue::Int(i) => Ok(usize::try_from(*i).unwrap_or(0)),
            ParamValue::Float(f) if f.is_finite() && *f >= 0.5 => Ok(effective_period(*f)),
            ParamValue::Float(_) => Ok(0),
            other => Err(EngineError::invalid_param(
                self.op,
                name,
                format!("expected an integer, got {}", other.kind()),
            )),
        }
    }

    pub fn usize(&self, name: &str) -> Result<usize, EngineError> {
        let value = self
            .params
            .get(name)
            .ok_or_else(|| EngineError::missing_param(self.op, name))?;
        self.as_usize(name, value)
    }

    pub fn usize_or(&self, name: &str, default: usize) -> Result<usize, EngineError> {
        match self.params.get(name) {
            Some(value) => self.as_usize(name, value),
            None => Ok(default),
        }
    }

    pub fn f64_or(&self, name: &str, default: f64) -> Result<f64, EngineError> {
        match self.params.get(name) {
            None => Ok(default),
            Some(ParamValue::Int(i)) => Ok(*i as f64),
            Some(ParamValue::Float(f)) => Ok(*f),
            Some(other) => Err(EngineError::invalid_param(
                self.op,
                name,
                format!("expected a number, got {}", other.kind()),
            )),
        }
    }

    pub fn bool_or(&self, name: &str, default: bool) -> Result<bool, EngineError> {
        match self.params.get(name) {
            None => Ok(default),
            Some(ParamValue::Bool(b)) => Ok(*b),
            Some(other) => Err(EngineError::invalid_param(
                self.op,
                name,
                format!("expected a bool, got {}", other.kind()),
            )),
        }
    }

    pub fn text(&self, name: &str) -> Result<Option<&'a str>, EngineError> {
        match self.params.get(name) {
            None => Ok(None),
            Some(ParamValue::Text(s)) => Ok(Some(s.as_str())),
            Some(other) => Err(EngineError::invalid_param(
                self.op,
                name,
                format!("expected text, got {}", other.kind()),
            )),
        }
    }

    fn adx_output(&self) -> Result<AdxOutput, EngineError> {
        match self.text("output")? {
            None => Ok(AdxOutput::Adx),
            Some(s) => AdxOutput::parse(s).ok_or_else(|| {
                EngineError::invalid_param(self.op, "output", format!("unknown output '{s}'"))
            }),
        }
    }

    fn bollinger_band(&self) -> Result<BollingerBand, EngineError> {
        match self.text("band")? {
            None => Ok(BollingerBand::from_upper_flag(self.bool_or("upper", true)?)),
            Some("upper") => Ok(BollingerBand::Upper),
            Some("middle") => Ok(BollingerBand::Middle),
            Some("lower") => Ok(BollingerBand::Lower),
            Some(s) => Err(EngineError::invalid_param(
                self.op,
                "band",
                format!("unknown band '{s}'"),
            )),
        }
    }

    fn ichimoku_params(&self) -> Result<IchimokuParams, EngineError> {
        let d = IchimokuParams::default();
        Ok(IchimokuParams {
            tenkan: self.usize_or("tenkan", d.tenkan)?,
            kijun: self.usize_or("kijun", d.kijun)?,
            senkou_b: self.usize_or("senkou_b", d.senkou_b)?,
        })
    }

    fn ichimoku_line(&self) -> Result<IchimokuLine, EngineError> {
        let name = self
            .text("line")?
            .ok_or_else(|| EngineError::missing_param(self.op, "line"))?;
        IchimokuLine::parse(name).ok_or_else(|| {
            EngineError::invalid_param(self.op, "line", format!("unknown line '{name}'"))
        })
    }

    fn mesa_limits(&self) -> Result<MesaLimits, EngineError> {
        let d = MesaLimits::default();
        Ok(MesaLimits {
            fast: self.f64_or("fast_limit", d.fast)?,
            slow: self.f64_or("slow_limit", d.slow)?,
        })
    }
}

pub type Evaluator = fn(&EvaluationContext, &Args<'_>, &[Series]) -> Result<Series, EngineError>;

/// One registered operation.
#[derive(Clone, Copy)]
pub struct OpSpec {
    pub name: &'static str,
    /// Number of series inputs. Bar-based operations take 0.
    pub arity: usize,
    /// Accepted parameter names.
    pub params: &'static [&'static str],
    evaluator: Evaluator,
}

impl OpSpec {
    pub fn new(
        name: &'static str,
        arity: usize,
        params: &'static [&'static str],
        evaluator: Evaluator,
    ) -> Self {
        Self {
            name,
            arity,
            params,
            evaluator,
        }
    }

    /// Arity and parameter-name check for one node.
    fn check(&self, request: &IndicatorRequest) -> Result<(), EngineError> {
        if request.inputs.len() != self.arity {
            return Err(EngineError::Arity {
                op: self.name.to_string(),
                expected: self.arity,
                actual: request.inputs.len(),
            });
        }
        let accepted = |name: &str| self.params.iter().any(|p| *p == name);
        if let Some(unknown) = request.params.keys().find(|k| !accepted(k.as_str())) {
            return Err(EngineError::invalid_param(
                self.name,
                unknown,
                "is not accepted by this operation",
            ));
        }
        Ok(())
    }
}

impl std::fmt::Debug for OpSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpSpec")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .field("params", &self.params)
            .finish()
    }
}

const PERIOD: &[&str] = &["period"];
const NONE: &[&str] = &[];

#[derive(Debug, Clone)]
pub struct Registry {
    ops: BTreeMap<&'static str, OpSpec>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            ops: BTreeMap::new(),
        }
    }

    pub fn register(&mut self, spec: OpSpec) {
        self.ops.insert(spec.name, spec);
    }

    pub fn get(&self, name: &str) -> Option<&OpSpec> {
        self.ops.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.ops.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.ops.keys().copied()
    }

    fn spec(&self, name: &str) -> Result<&OpSpec, EngineError> {
        self.get(name)
            .ok_or_else(|| EngineError::UnknownOperation(name.to_string()))
    }

    /// Check a whole request tree without computing anything.
    pub fn validate(&self, request: &IndicatorRequest) -> Result<(), EngineError> {
        let spec = self.spec(&request.op)?;
        spec.check(request)?;
        let args = Args::new(spec.name, &request.params);
        for name in spec.params {
            if let Some(value) = request.params.get(*name) {
                if matches!(value, ParamValue::Float(f) if f.is_nan()) {
                    return Err(EngineError::invalid_param(spec.name, name, "is NaN"));
                }
            }
        }
        // Enum-valued params are parsed here so a typo fails before any work.
        match spec.name {
            "adx" => args.adx_output().map(|_| ())?,
            "bollinger" => args.bollinger_band().map(|_| ())?,
            "ichimoku" => args.ichimoku_line().map(|_| ())?,
            _ => {}
        }
        for input in &request.inputs {
            if let RequestInput::Request(inner) = input {
                self.validate(inner)?;
            }
        }
        Ok(())
    }

    /// Evaluate a request tree against `ctx`.
    ///
    /// Inputs resolve bottom-up; every node goes through the context cache.
    pub fn evaluate(
        &self,
        ctx: &EvaluationContext,
        request: &IndicatorRequest,
    ) -> Result<Series, EngineError> {
        let spec = self.spec(&request.op)?;
        spec.check(request)?;

        let inputs = request
            .inputs
            .iter()
            .map(|input| match input {
                RequestInput::Field(field) => Ok(ctx.source(*field)),
                RequestInput::Request(inner) => self.evaluate(ctx, inner),
            })
            .collect::<Result<Vec<_>, _>>()?;

        trace!(op = spec.name, inputs = inputs.len(), "evaluating request node");
        (spec.evaluator)(ctx, &Args::new(spec.name, &request.params), &inputs)
    }

    /// Every operation the engine ships with.
    pub fn with_defaults() -> Self {
        let mut r = Self::new();

        // Rolling window primitives
        r.register(OpSpec::new("highest", 1, PERIOD, |ctx, a, s| {
            Ok(ctx.highest(&s[0], a.usize("period")?))
        }));
        r.register(OpSpec::new("lowest", 1, PERIOD, |ctx, a, s| {
            Ok(ctx.lowest(&s[0], a.usize("period")?))
        }));
        r.register(OpSpec::new("sum_for", 1, PERIOD, |ctx, a, s| {
            Ok(ctx.sum_for(&s[0], a.usize("period")?))
        }));
        r.register(OpSpec::new("highest_bar_index", 1, PERIOD, |ctx, a, s| {
            Ok(ctx.highest_bar_index(&s[0], a.usize("period")?))
        }));
        r.register(OpSpec::new("lowest_bar_index", 1, PERIOD, |ctx, a, s| {
            Ok(ctx.lowest_bar_index(&s[0], a.usize("period")?))
        }));
        r.register(OpSpec::new("highest_var", 2, NONE, |ctx, _, s| {
            Ok(ctx.highest_var(&s[0], &s[1]))
        }));
        r.register(OpSpec::new("lowest_var", 2, NONE, |ctx, _, s| {
            Ok(ctx.lowest_var(&s[0], &s[1]))
        }));
        r.register(OpSpec::new("true_range", 0, NONE, |ctx, _, _| {
            Ok(ctx.true_range())
        }));

        // Recurrence filters
        r.register(OpSpec::new("sma", 1, PERIOD, |ctx, a, s| {
            Ok(ctx.sma(&s[0], a.usize("period")?))
        }));
        r.register(OpSpec::new("ema", 1, PERIOD, |ctx, a, s| {
            Ok(ctx.ema(&s[0], a.usize("period")?))
        }));
        r.register(OpSpec::new("wilder", 1, PERIOD, |ctx, a, s| {
            Ok(ctx.wilder(&s[0], a.usize("period")?))
        }));
        r.register(OpSpec::new("tema", 1, PERIOD, |ctx, a, s| {
            Ok(ctx.tema(&s[0], a.usize("period")?))
        }));
        r.register(OpSpec::new("macd", 1, &["fast", "slow"], |ctx, a, s| {
            Ok(ctx.macd(&s[0], a.usize("fast")?, a.usize("slow")?))
        }));
        r.register(OpSpec::new(
            "macd_signal",
            1,
            &["fast", "slow", "signal"],
            |ctx, a, s| {
                Ok(ctx.macd_signal(&s[0], a.usize("fast")?, a.usize("slow")?, a.usize("signal")?))
            },
        ));
        r.register(OpSpec::new(
            "macd_histogram",
            1,
            &["fast", "slow", "signal"],
            |ctx, a, s| {
                Ok(ctx.macd_histogram(
                    &s[0],
                    a.usize("fast")?,
                    a.usize("slow")?,
                    a.usize("signal")?,
                ))
            },
        ));
        r.register(OpSpec::new("force_index", 2, PERIOD, |ctx, a, s| {
            Ok(ctx.force_index(&s[0], &s[1], a.usize("period")?))
        }));
        r.register(OpSpec::new("atr", 0, PERIOD, |ctx, a, _| {
            Ok(ctx.atr(a.usize("period")?))
        }));
        r.register(OpSpec::new(
            "adx",
            0,
            &["period", "output", "interval"],
            |ctx, a, _| {
                Ok(ctx.adx(a.usize("period")?, a.adx_output()?, a.usize_or("interval", 2)?))
            },
        ));
        r.register(OpSpec::new(
            "mama",
            1,
            &["fast_limit", "slow_limit"],
            |ctx, a, s| Ok(ctx.mama(&s[0], a.mesa_limits()?)),
        ));
        r.register(OpSpec::new(
            "fama",
            1,
            &["fast_limit", "slow_limit"],
            |ctx, a, s| Ok(ctx.fama(&s[0], a.mesa_limits()?)),
        ));
        r.register(OpSpec::new(
            "kama",
            1,
            &["period", "fast", "slow"],
            |ctx, a, s| {
                Ok(ctx.kama(
                    &s[0],
                    a.usize_or("period", 20)?,
                    a.usize_or("fast", 2)?,
                    a.usize_or("slow", 30)?,
                ))
            },
        ));
        r.register(OpSpec::new("obv", 2, NONE, |ctx, _, s| Ok(ctx.obv(&s[0], &s[1]))));
        r.register(OpSpec::new("pvt", 2, NONE, |ctx, _, s| Ok(ctx.pvt(&s[0], &s[1]))));
        r.register(OpSpec::new("nbars_growth", 1, &["bars"], |ctx, a, s| {
            Ok(ctx.nbars_growth(&s[0], a.usize_or("bars", 1)?))
        }));
        r.register(OpSpec::new("nbars_fall", 1, &["bars"], |ctx, a, s| {
            Ok(ctx.nbars_fall(&s[0], a.usize_or("bars", 1)?))
        }));

        // Composites and helpers
        r.register(OpSpec::new(
            "bollinger",
            1,
            &["period", "k", "upper", "band"],
            |ctx, a, s| {
                Ok(ctx.bollinger(
                    &s[0],
                    a.usize("period")?,
                    a.f64_or("k", 2.0)?,
                    a.bollinger_band()?,
                ))
            },
        ));
        r.register(OpSpec::new(
            "ichimoku",
            0,
            &["tenkan", "kijun", "senkou_b", "line"],
            |ctx, a, _| Ok(ctx.ichimoku(a.ichimoku_params()?, a.ichimoku_line()?)),
        ));
        r.register(OpSpec::new(
            "span_a_on_top",
            0,
            &["tenkan", "kijun", "senkou_b"],
            |ctx, a, _| Ok(ctx.span_a_on_top(a.ichimoku_params()?)),
        ));
        r.register(OpSpec::new("midpoint", 0, PERIOD, |ctx, a, _| {
            Ok(ctx.midpoint(a.usize("period")?))
        }));
        r.register(OpSpec::new("shift_forward", 1, &["bars"], |ctx, a, s| {
            Ok(ctx.shift_forward(&s[0], a.usize("bars")?))
        }));
        r.register(OpSpec::new("shift_backward", 1, &["bars"], |ctx, a, s| {
            Ok(ctx.shift_backward(&s[0], a.usize("bars")?))
        }));
        r.register(OpSpec::new("difference", 2, NONE, |ctx, _, s| {
            Ok(ctx.difference(&s[0], &s[1]))
        }));
        r.register(OpSpec::new("midline", 2, NONE, |ctx, _, s| {
            Ok(ctx.midline(&s[0], &s[1]))
        }));

        r
    }
}

//! Handler catalog: host-facing metadata as plain TOML data.
//!
//! A handler is a display name and category bound to one registry operation,
//! its bar-field inputs, and a default parameter set with documented ranges.
//! The catalog builds requests; it never computes anything itself.

use crate::domain::PriceField;
use crate::engine::{EngineError, IndicatorRequest, ParamValue, Params, Registry};
use serde::{Deserialize, Serialize};

const BUILTIN: &str = include_str!("../assets/catalog.toml");

/// Largest number of values `ParamSpec::sweep_values` will produce.
const MAX_SWEEP_VALUES: usize = 10_000;

fn optimizable() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    pub default: ParamValue,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(default)]
    pub step: Option<f64>,
    /// False for selectors (output line, band side) a sweep should not vary.
    #[serde(default = "optimizable")]
    pub optimize: bool,
}

impl ParamSpec {
    /// Values from `min` to `max` inclusive in `step` increments.
    ///
    /// Integer defaults produce integer values. Without a usable range, or
    /// for a non-optimizable parameter, the result is just the default.
    pub fn sweep_values(&self) -> Vec<ParamValue> {
        let (Some(min), Some(max), Some(step)) = (self.min, self.max, self.step) else {
            return vec![self.default.clone()];
        };
        if !self.optimize || step.is_nan() || step <= 0.0 || min > max {
            return vec![self.default.clone()];
        }

        let count = (((max - min) / step + 1e-9).floor() as usize + 1).min(MAX_SWEEP_VALUES);
        (0..count)
            .map(|i| {
                let v = min + step * i as f64;
                match self.default {
                    ParamValue::Int(_) => ParamValue::Int(v.round() as i64),
                    _ => ParamValue::Float((v * 1e9).round() / 1e9),
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandlerSpec {
    pub name: String,
    pub category: String,
    pub op: String,
    #[serde(default)]
    pub inputs: Vec<PriceField>,
    #[serde(default)]
    pub params: Vec<ParamSpec>,
}

impl HandlerSpec {
    pub fn default_params(&self) -> Params {
        self.params
            .iter()
            .map(|p| (p.name.clone(), p.default.clone()))
            .collect()
    }

    pub fn param(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Request for this handler with its default parameters.
    pub fn request(&self) -> IndicatorRequest {
        let mut request = IndicatorRequest::new(self.op.clone());
        request.params = self.default_params();
        for field in &self.inputs {
            request = request.input(*field);
        }
        request
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default, rename = "handler")]
    pub handlers: Vec<HandlerSpec>,
}

impl Catalog {
    /// The catalog shipped with the crate.
    pub fn builtin() -> Result<Self, EngineError> {
        Self::from_toml_str(BUILTIN)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, EngineError> {
        Ok(toml::from_str(s)?)
    }

    pub fn handler(&self, name: &str) -> Option<&HandlerSpec> {
        self.handlers.iter().find(|h| h.name == name)
    }

    pub fn request_for(&self, name: &str) -> Result<IndicatorRequest, EngineError> {
        self.handler(name)
            .map(HandlerSpec::request)
            .ok_or_else(|| EngineError::UnknownHandler(name.to_string()))
    }

    pub fn in_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a HandlerSpec> {
        self.handlers.iter().filter(move |h| h.category == category)
    }

    /// Distinct categories in first-seen order.
    pub fn categories(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for h in &self.handlers {
            if !out.contains(&h.category.as_str()) {
                out.push(&h.category);
            }
        }
        out
    }

    /// Every handler's default request must be accepted by `registry`.
    pub fn validate(&self, registry: &Registry) -> Result<(), EngineError> {
        self.handlers
            .iter()
            .try_for_each(|h| registry.validate(&h.request()))
    }
}

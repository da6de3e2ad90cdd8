//! Serializable indicator requests.
//!
//! A request names an operation, its parameters, and its inputs. Inputs are
//! either bar fields or nested requests, so a whole dependency graph can be
//! written as one TOML/JSON value:
//!
//! ```toml
//! op = "macd_signal"
//! params = { fast = 12, slow = 26, signal = 9 }
//! inputs = ["close"]
//! ```

use crate::domain::PriceField;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl ParamValue {
    /// Tagged string form (`i:14`, `f:2.5`, `b:true`, `s:close`).
    pub fn canonical(&self) -> String {
        match self {
            ParamValue::Bool(b) => format!("b:{b}"),
            ParamValue::Int(i) => format!("i:{i}"),
            ParamValue::Float(f) => format!("f:{f}"),
            ParamValue::Text(s) => format!("s:{s}"),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ParamValue::Bool(_) => "bool",
            ParamValue::Int(_) => "integer",
            ParamValue::Float(_) => "float",
            ParamValue::Text(_) => "text",
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(b) => write!(f, "{b}"),
            ParamValue::Int(i) => write!(f, "{i}"),
            ParamValue::Float(x) => write!(f, "{x}"),
            ParamValue::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Int(v.into())
    }
}

impl From<usize> for ParamValue {
    fn from(v: usize) -> Self {
        ParamValue::Int(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Text(v)
    }
}

/// Named parameters, ordered by name.
pub type Params = BTreeMap<String, ParamValue>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestInput {
    Field(PriceField),
    Request(Box<IndicatorRequest>),
}

impl From<PriceField> for RequestInput {
    fn from(field: PriceField) -> Self {
        RequestInput::Field(field)
    }
}

impl From<IndicatorRequest> for RequestInput {
    fn from(request: IndicatorRequest) -> Self {
        RequestInput::Request(Box::new(request))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRequest {
    pub op: String,
    #[serde(default)]
    pub params: Params,
    #[serde(default)]
    pub inputs: Vec<RequestInput>,
}

impl IndicatorRequest {
    pub fn new(op: impl Into<String>) -> Self {
        Self {
            op: op.into(),
            params: Params::new(),
            inputs: Vec::new(),
        }
    }

    pub fn param(mut self, name: &str, value: impl Into<ParamValue>) -> Self {
        self.params.insert(name.to_string(), value.into());
        self
    }

    pub fn input(mut self, input: impl Into<RequestInput>) -> Self {
        self.inputs.push(input.into());
        self
    }

    /// Copy of this request with `params` merged over the existing ones.
    pub fn with_params(&self, params: &Params) -> Self {
        let mut out = self.clone();
        out.params
            .extend(params.iter().map(|(k, v)| (k.clone(), v.clone())));
        out
    }

    /// Number of nodes in the request tree, this one included.
    pub fn node_count(&self) -> usize {
        1 + self
            .inputs
            .iter()
            .map(|input| match input {
                RequestInput::Field(_) => 0,
                RequestInput::Request(inner) => inner.node_count(),
            })
            .sum::<usize>()
    }

    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }
}

impl fmt::Display for IndicatorRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.op)?;
        let mut first = true;
        for input in &self.inputs {
            if !first {
                write!(f, ", ")?;
            }
            first = false;
            match input {
                RequestInput::Field(field) => write!(f, "{}", field.as_str())?,
                RequestInput::Request(inner) => write!(f, "{inner}")?,
            }
        }
        for (name, value) in &self.params {
            if !first {
                write!(f, ", ")?;
            }
            first = false;
            write!(f, "{name}={value}")?;
        }
        write!(f, ")")
    }
}

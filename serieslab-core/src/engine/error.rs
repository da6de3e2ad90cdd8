//! Errors at the request / registry / config boundary.
//!
//! Numeric operations never fail; these only surface when a request names
//! something that does not exist or carries the wrong kind of parameter.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("unknown operation: {0}")]
    UnknownOperation(String),

    #[error("unknown handler: {0}")]
    UnknownHandler(String),

    #[error("operation {op} requires parameter '{param}'")]
    MissingParam { op: String, param: String },

    #[error("operation {op}: parameter '{param}' {reason}")]
    InvalidParam {
        op: String,
        param: String,
        reason: String,
    },

    #[error("operation {op} takes {expected} input(s), got {actual}")]
    Arity {
        op: String,
        expected: usize,
        actual: usize,
    },

    #[error("malformed configuration: {0}")]
    Catalog(#[from] toml::de::Error),
}

impl EngineError {
    pub fn invalid_param(op: &str, param: &str, reason: impl Into<String>) -> Self {
        EngineError::InvalidParam {
            op: op.to_string(),
            param: param.to_string(),
            reason: reason.into(),
        }
    }

    pub fn missing_param(op: &str, param: &str) -> Self {
        EngineError::MissingParam {
            op: op.to_string(),
            param: param.to_string(),
        }
    }
}

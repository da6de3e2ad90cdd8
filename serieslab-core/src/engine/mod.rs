//! Evaluation engine: dependency cache, context, requests, registry.
//!
//! The flow for one indicator request:
//!
//! 1. The registry looks up the operation and checks arity and params
//! 2. Inputs resolve bottom-up (bar fields, then nested requests)
//! 3. The context method builds a structured cache key from the op, the
//!    normalized params, and the input series ids
//! 4. The cache returns the stored series or runs the pure function once

pub mod cache;
pub mod config;
pub mod context;
pub mod error;
pub mod registry;
pub mod request;

pub use cache::{CacheKey, CacheStats, DependencyCache};
pub use config::EngineConfig;
pub use context::EvaluationContext;
pub use error::EngineError;
pub use registry::{Args, Evaluator, OpSpec, Registry};
pub use request::{IndicatorRequest, ParamValue, Params, RequestInput};

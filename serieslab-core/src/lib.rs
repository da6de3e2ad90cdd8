//! SeriesLab Core: bar-series transforms with a memoized dependency cache.
//!
//! This crate contains the indicator engine a strategy host evaluates against:
//! - Domain types (bars, price fields, series with stable identities, positions)
//! - Pure indicator functions: rolling windows, recurrence filters, composites
//! - Per-dataset evaluation context with an at-most-once dependency cache
//! - Operation registry and declarative indicator requests
//! - Handler catalog loaded from TOML
//! - Read-only trade-state queries over the host's position history

pub mod catalog;
pub mod domain;
pub mod engine;
pub mod indicators;
pub mod trade_state;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: everything shared across worker threads is Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        // Domain types
        require_send::<domain::Bar>();
        require_sync::<domain::Bar>();
        require_send::<domain::Series>();
        require_sync::<domain::Series>();
        require_send::<domain::SeriesId>();
        require_sync::<domain::SeriesId>();
        require_send::<domain::Position>();
        require_sync::<domain::Position>();

        // Engine types
        require_send::<engine::EvaluationContext>();
        require_sync::<engine::EvaluationContext>();
        require_send::<engine::DependencyCache>();
        require_sync::<engine::DependencyCache>();
        require_send::<engine::Registry>();
        require_sync::<engine::Registry>();
        require_send::<engine::IndicatorRequest>();
        require_sync::<engine::IndicatorRequest>();

        require_send::<catalog::Catalog>();
        require_sync::<catalog::Catalog>();
    }

    /// The context hands out shared references only, so concurrent readers
    /// can borrow one context from scoped threads.
    #[test]
    fn context_is_shareable_across_scoped_threads() {
        let bars = indicators::make_bars(&[1.0, 2.0, 3.0, 4.0]);
        let ctx = engine::EvaluationContext::new(bars, engine::EngineConfig::default());
        let close = ctx.source(domain::PriceField::Close);
        std::thread::scope(|s| {
            let a = s.spawn(|| ctx.sma(&close, 2));
            let b = s.spawn(|| ctx.sma(&close, 2));
            let (a, b) = (a.join().unwrap(), b.join().unwrap());
            assert!(a.ptr_eq(&b));
        });
    }
}

//! Domain types: bars, series, identities, and the read-only position view.

pub mod bar;
pub mod ids;
pub mod position;
pub mod series;

pub use bar::{Bar, PriceField};
pub use ids::SeriesId;
pub use position::{Position, PositionSide};
pub use series::{bools_to_series, series_to_bools, Series};

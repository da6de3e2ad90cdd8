//! Read-only queries over the host's position history.
//!
//! Every function takes positions ordered by entry bar, as the host records
//! them, and looks only at what is known at `bar`: a position counts as
//! closed once its exit bar is at or before `bar`.

use crate::domain::{Position, PositionSide};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SideFilter {
    #[default]
    Any,
    Long,
    Short,
}

impl SideFilter {
    pub fn matches(&self, position: &Position) -> bool {
        match self {
            SideFilter::Any => true,
            SideFilter::Long => position.side == PositionSide::Long,
            SideFilter::Short => position.side == PositionSide::Short,
        }
    }
}

/// The position with the latest exit at or before `bar`.
pub fn last_exit(positions: &[Position], bar: usize, side: SideFilter) -> Option<&Position> {
    positions
        .iter()
        .filter(|p| side.matches(p) && p.is_closed_by(bar))
        .max_by_key(|p| p.exit_bar)
}

/// Bars elapsed since the most recent exit at or before `bar`.
pub fn bars_since_last_exit(positions: &[Position], bar: usize, side: SideFilter) -> Option<usize> {
    last_exit(positions, bar, side)
        .and_then(|p| p.exit_bar)
        .map(|exit| bar - exit)
}

/// `bars_since_last_exit` for every bar. A bar with no prior exit gets `bar + 1`.
pub fn bars_since_last_exit_series(
    positions: &[Position],
    bar_count: usize,
    side: SideFilter,
) -> Vec<f64> {
    let mut exits: Vec<usize> = positions
        .iter()
        .filter(|p| side.matches(p))
        .filter_map(|p| p.exit_bar)
        .collect();
    exits.sort_unstable();

    let mut next = 0;
    let mut last: Option<usize> = None;
    (0..bar_count)
        .map(|bar| {
            while next < exits.len() && exits[next] <= bar {
                last = Some(exits[next]);
                next += 1;
            }
            match last {
                Some(exit) => (bar - exit) as f64,
                None => (bar + 1) as f64,
            }
        })
        .collect()
}

/// Up to `n` positions closed at or before `bar`, most recent exit first.
pub fn last_closed(positions: &[Position], bar: usize, n: usize) -> Vec<&Position> {
    let mut closed: Vec<&Position> = positions.iter().filter(|p| p.is_closed_by(bar)).collect();
    // stable sort keeps entry order among equal exits; reverse puts the latest first
    closed.sort_by_key(|p| p.exit_bar);
    closed.into_iter().rev().take(n).collect()
}

/// True when the last `n` trades closed by `bar` all satisfy `predicate`.
///
/// Fewer than `n` closed trades is false. `n == 0` behaves as `n == 1`.
pub fn last_n_closed_match(
    positions: &[Position],
    bar: usize,
    n: usize,
    predicate: impl Fn(&Position) -> bool,
) -> bool {
    let n = n.max(1);
    let last = last_closed(positions, bar, n);
    last.len() == n && last.into_iter().all(predicate)
}

/// The most recently entered position active during `bar`.
pub fn active_position(positions: &[Position], bar: usize) -> Option<&Position> {
    positions.iter().rev().find(|p| p.is_active_for_bar(bar))
}

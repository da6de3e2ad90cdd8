use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PositionSide {
    Long,
    Short,
}

/// Read-only view of one position from the host's trade bookkeeping.
///
/// The engine never opens, closes, or resizes positions; it only answers
/// queries over a time-sorted slice of them (see `trade_state`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub side: PositionSide,
    pub signal_name: String,

    // ── Entry ──
    pub entry_bar: usize,
    pub entry_price: f64,

    // ── Exit (None while open) ──
    pub exit_bar: Option<usize>,
    pub exit_price: Option<f64>,

    pub quantity: f64,
}

impl Position {
    pub fn is_long(&self) -> bool {
        self.side == PositionSide::Long
    }

    pub fn is_short(&self) -> bool {
        self.side == PositionSide::Short
    }

    pub fn is_closed(&self) -> bool {
        self.exit_bar.is_some()
    }

    /// Closed at or before `bar`.
    pub fn is_closed_by(&self, bar: usize) -> bool {
        self.exit_bar.is_some_and(|exit| exit <= bar)
    }

    /// Open during `bar`: entered at or before it and not yet exited.
    ///
    /// A position exiting on `bar` is still active for that bar.
    pub fn is_active_for_bar(&self, bar: usize) -> bool {
        self.entry_bar <= bar && self.exit_bar.map_or(true, |exit| bar <= exit)
    }

    fn direction(&self) -> f64 {
        match self.side {
            PositionSide::Long => 1.0,
            PositionSide::Short => -1.0,
        }
    }

    /// Realized profit; 0.0 while the position is open.
    pub fn profit(&self) -> f64 {
        match self.exit_price {
            Some(exit) if self.is_closed() => {
                self.direction() * (exit - self.entry_price) * self.quantity
            }
            _ => 0.0,
        }
    }

    /// Mark-to-market profit at `price`. Closed positions return their realized profit.
    pub fn open_profit(&self, price: f64) -> f64 {
        if self.is_closed() {
            return self.profit();
        }
        self.direction() * (price - self.entry_price) * self.quantity
    }

    pub fn is_winner(&self) -> bool {
        self.profit() > 0.0
    }

    pub fn is_loser(&self) -> bool {
        self.is_closed() && self.profit() < 0.0
    }
}

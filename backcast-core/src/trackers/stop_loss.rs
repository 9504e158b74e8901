//! Stop-loss tracker — fixed or trailing.
//!
//! Fixed LONG: level = entry * (1 - r) or entry - a.
//! Trailing LONG: level follows the peak price since entry; the peak only
//! ratchets up, so the level is monotonically non-decreasing. Shorts mirror
//! with the trough. Once triggered, the tracker stays triggered.

use super::LevelOffset;
use crate::domain::TradeDirection;

#[derive(Debug, Clone)]
pub struct StopLossTracker {
    direction: TradeDirection,
    offset: LevelOffset,
    trailing: bool,
    entry_price: f64,
    /// Peak since entry for longs, trough for shorts. Equals the entry
    /// price until the first favorable move.
    extreme: f64,
    triggered: bool,
}

impl StopLossTracker {
    pub fn new(
        direction: TradeDirection,
        offset: LevelOffset,
        trailing: bool,
        entry_price: f64,
    ) -> Self {
        Self {
            direction,
            offset,
            trailing,
            entry_price,
            extreme: entry_price,
            triggered: false,
        }
    }

    /// Current stop level.
    pub fn level(&self) -> f64 {
        let reference = if self.trailing {
            self.extreme
        } else {
            self.entry_price
        };
        match (self.direction, self.offset) {
            (TradeDirection::Long, LevelOffset::Rel(r)) => reference * (1.0 - r),
            (TradeDirection::Long, LevelOffset::Abs(a)) => reference - a,
            (TradeDirection::Short, LevelOffset::Rel(r)) => reference * (1.0 + r),
            (TradeDirection::Short, LevelOffset::Abs(a)) => reference + a,
        }
    }

    /// Ratchet the favorable extreme. No-op for fixed stops.
    pub fn update_extreme(&mut self, price: f64) {
        if !self.trailing {
            return;
        }
        self.extreme = match self.direction {
            TradeDirection::Long => self.extreme.max(price),
            TradeDirection::Short => self.extreme.min(price),
        };
    }

    /// Check `price` against the level; latches on hit.
    pub fn check(&mut self, price: f64) -> bool {
        if !self.triggered {
            let hit = match self.direction {
                TradeDirection::Long => price <= self.level(),
                TradeDirection::Short => price >= self.level(),
            };
            if hit {
                self.triggered = true;
            }
        }
        self.triggered
    }

    /// Extreme-then-check in one step, for per-close observation.
    pub fn observe(&mut self, price: f64) -> bool {
        self.update_extreme(price);
        self.check(price)
    }

    pub fn is_triggered(&self) -> bool {
        self.triggered
    }

    pub fn is_trailing(&self) -> bool {
        self.trailing
    }

    pub fn extreme(&self) -> f64 {
        self.extreme
    }
}

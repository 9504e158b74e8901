//! Take-profit tracker — fixed only.
//!
//! LONG: level = entry * (1 + r) or entry + a; hit when price >= level.
//! SHORT mirrors. Once triggered, stays triggered.

use super::LevelOffset;
use crate::domain::TradeDirection;

#[derive(Debug, Clone)]
pub struct TakeProfitTracker {
    direction: TradeDirection,
    offset: LevelOffset,
    entry_price: f64,
    triggered: bool,
}

impl TakeProfitTracker {
    pub fn new(direction: TradeDirection, offset: LevelOffset, entry_price: f64) -> Self {
        Self {
            direction,
            offset,
            entry_price,
            triggered: false,
        }
    }

    pub fn level(&self) -> f64 {
        match (self.direction, self.offset) {
            (TradeDirection::Long, LevelOffset::Rel(r)) => self.entry_price * (1.0 + r),
            (TradeDirection::Long, LevelOffset::Abs(a)) => self.entry_price + a,
            (TradeDirection::Short, LevelOffset::Rel(r)) => self.entry_price * (1.0 - r),
            (TradeDirection::Short, LevelOffset::Abs(a)) => self.entry_price - a,
        }
    }

    /// Check `price` against the level; latches on hit.
    pub fn check(&mut self, price: f64) -> bool {
        if !self.triggered {
            let hit = match self.direction {
                TradeDirection::Long => price >= self.level(),
                TradeDirection::Short => price <= self.level(),
            };
            if hit {
                self.triggered = true;
            }
        }
        self.triggered
    }

    pub fn is_triggered(&self) -> bool {
        self.triggered
    }
}

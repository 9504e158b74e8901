//! Simulator configuration, mutable state, and result types.

use crate::domain::{
    EquityPoint, EventId, ExitReason, PositionState, Swap, Trade, TradeDirection,
};
use crate::event::ConditionKind;
use crate::trackers::{BalanceTracker, StopLossTracker, TakeProfitTracker};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Configuration for a single simulation, assembled by the runner from
/// `AlgoParams` + `RunSettings`.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Starting cash after the capital scaler is applied.
    pub starting_cash_usd: f64,
    pub fee_bps: f64,
    pub slippage_bps: f64,
    pub trades_limit: Option<usize>,
    /// Bars to wait after a trade closes before the next entry.
    pub cooldown_bars: Option<usize>,
    pub close_position_on_exit: bool,
}

/// Why an entry signal was not acted upon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SkipReason {
    Warmup,
    Cooldown,
    TradesLimit,
    PositionOpen,
    /// Position sizing resolved to zero (e.g. a DYN factor of 0 or no cash).
    NoCapital,
}

/// Simulator-side events: what the state machine did and why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlgoEventKind {
    ConditionTriggered { condition: ConditionKind },
    PositionOpened { direction: TradeDirection },
    PositionClosed {
        direction: TradeDirection,
        reason: ExitReason,
    },
    EntrySkipped { reason: SkipReason },
}

/// A time-stamped record of a simulator action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlgoEvent {
    pub id: EventId,
    pub bucket: i64,
    pub bar_index: usize,
    pub kind: AlgoEventKind,
}

/// The currently open trade and its exclusively-owned trackers.
#[derive(Debug)]
pub struct OpenPosition {
    pub direction: TradeDirection,
    pub entry_bar: usize,
    pub entry_bucket: i64,
    pub balance: BalanceTracker,
    pub stop: Option<StopLossTracker>,
    pub take_profit: Option<TakeProfitTracker>,
    pub entry_swap: Swap,
}

/// Mutable simulator state.
#[derive(Debug)]
pub struct SimState {
    pub cash_usd: f64,
    pub open: Option<OpenPosition>,
    pub trades_completed: usize,
    /// First bar on which a new entry is allowed again.
    pub cooldown_expires_at: Option<usize>,
    pub bars_flat: usize,
    pub bars_long: usize,
    pub bars_short: usize,
}

impl SimState {
    pub fn new(starting_cash_usd: f64) -> Self {
        Self {
            cash_usd: starting_cash_usd,
            open: None,
            trades_completed: 0,
            cooldown_expires_at: None,
            bars_flat: 0,
            bars_long: 0,
            bars_short: 0,
        }
    }

    pub fn position(&self) -> PositionState {
        match &self.open {
            None => PositionState::Flat,
            Some(pos) => pos.direction.into(),
        }
    }
}

/// Everything the simulator produced, before metric aggregation.
#[derive(Debug, Default)]
pub struct SimResult {
    pub swaps: Vec<Swap>,
    pub trades: Vec<Trade>,
    pub equity: Vec<EquityPoint>,
    pub algo_events: Vec<AlgoEvent>,
    pub bars_processed: usize,
    pub bars_flat: usize,
    pub bars_long: usize,
    pub bars_short: usize,
    pub condition_trigger_counts: HashMap<ConditionKind, usize>,
    pub exit_reason_counts: HashMap<ExitReason, usize>,
    pub final_cash_usd: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_state_is_flat() {
        let state = SimState::new(10_000.0);
        assert_eq!(state.position(), PositionState::Flat);
        assert_eq!(state.cash_usd, 10_000.0);
        assert_eq!(state.trades_completed, 0);
    }

    #[test]
    fn algo_event_serialization_roundtrip() {
        let ev = AlgoEvent {
            id: EventId(3),
            bucket: 120,
            bar_index: 2,
            kind: AlgoEventKind::PositionClosed {
                direction: TradeDirection::Long,
                reason: ExitReason::StopLoss,
            },
        };
        let json = serde_json::to_string(&ev).unwrap();
        let deser: AlgoEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(ev, deser);
    }
}

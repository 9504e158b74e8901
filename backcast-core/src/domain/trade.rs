//! Trade — a completed entry/exit swap pair with computed PnL.

use super::ids::TradeId;
use super::swap::Swap;
use serde::{Deserialize, Serialize};

/// Direction of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeDirection {
    Long,
    Short,
}

/// Why a trade was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExitReason {
    ExitSignal,
    StopLoss,
    TakeProfit,
    TrailingStop,
    EndOfBacktest,
}

/// A complete round-trip trade: entry swap → exit swap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: TradeId,
    pub direction: TradeDirection,
    pub entry_swap: Swap,
    pub exit_swap: Swap,
    pub pnl_usd: f64,
    /// PnL as a fraction of the entry USD notional.
    pub pnl_pct: f64,
    pub duration_bars: usize,
    pub duration_secs: i64,
    pub exit_reason: ExitReason,
    /// Worst unrealized loss observed while the trade was open (USD, <= 0).
    pub max_drawdown_usd: f64,
    /// Best unrealized gain observed while the trade was open (USD, >= 0).
    pub max_runup_usd: f64,
}

impl Trade {
    pub fn is_winner(&self) -> bool {
        self.pnl_usd > 0.0
    }

    /// Total fees paid across both legs.
    pub fn total_fees_usd(&self) -> f64 {
        self.entry_swap.fee_usd + self.exit_swap.fee_usd
    }
}

//! Swap — one executed leg of asset exchange (USD ↔ asset).

use super::ids::SwapId;
use super::trade::TradeDirection;
use serde::{Deserialize, Serialize};

/// The two sides of every swap in a single-symbol run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Asset {
    Usd,
    Base,
}

/// A single executed leg: entry or exit of a trade.
///
/// Amount invariant: `to_amount / from_amount` is consistent with `price`
/// net of fees and slippage. For a long entry, `from_amount` is the full USD
/// cost (notional plus entry fee) and `to_amount` the asset quantity; the
/// exit leg reverses the assets and nets the exit fee out of the USD
/// proceeds. Shorts mirror this with the asset leg first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Swap {
    pub id: SwapId,
    pub bar_index: usize,
    /// Seconds since epoch of the bar on which the leg executed.
    pub bucket: i64,
    pub from_asset: Asset,
    pub to_asset: Asset,
    pub from_amount: f64,
    pub to_amount: f64,
    /// Effective fill price after slippage.
    pub price: f64,
    pub is_entry: bool,
    pub direction: TradeDirection,
    pub fee_usd: f64,
    pub slippage_usd: f64,
}

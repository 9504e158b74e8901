//! Backtest output assembly.

use crate::metrics::{AlgoMetrics, SwapMetrics};
use backcast_core::config::BacktestInput;
use backcast_core::domain::{EquityPoint, RunId, Swap, Trade};
use backcast_core::sim::AlgoEvent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Bumped whenever the serialized output shape changes incompatibly.
pub const SCHEMA_VERSION: u32 = 1;

/// Echo of the input parameters a result was produced from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigEcho {
    pub algo_id: String,
    pub version: String,
    pub symbol: String,
    pub start_time: i64,
    pub end_time: i64,
    pub starting_capital_usd: f64,
    pub capital_scaler: f64,
    pub fee_bps: f64,
    pub slippage_bps: f64,
}

impl ConfigEcho {
    pub fn from_input(input: &BacktestInput) -> Self {
        Self {
            algo_id: input.algo.algo_id.clone(),
            version: input.algo.version.clone(),
            symbol: input.run.symbol.clone(),
            start_time: input.run.start_time,
            end_time: input.run.end_time,
            starting_capital_usd: input.algo.starting_capital_usd,
            capital_scaler: input.run.capital_scaler,
            fee_bps: input.run.fee_bps,
            slippage_bps: input.run.slippage_bps,
        }
    }
}

/// The two event streams a run produces.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RunEvents {
    pub swap_events: Vec<Swap>,
    pub algo_events: Vec<AlgoEvent>,
}

/// Complete result of a backtest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestOutput {
    pub schema_version: u32,
    /// Content-addressable id of the input.
    pub run_id: RunId,
    pub config: ConfigEcho,
    pub events: RunEvents,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
    pub swap_metrics: SwapMetrics,
    pub algo_metrics: AlgoMetrics,
    /// True when no candles fell inside the requested range.
    pub is_empty: bool,
    pub completed_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub total_bars_processed: usize,
    /// Non-fatal notes: mip-map memory overhead, inexact indicator
    /// resolution matches.
    pub warnings: Vec<String>,
}

impl BacktestOutput {
    /// The well-formed output for a run whose window contained no candles.
    pub fn empty(input: &BacktestInput, duration_ms: u64) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            run_id: input.run_id(),
            config: ConfigEcho::from_input(input),
            events: RunEvents::default(),
            trades: Vec::new(),
            equity_curve: Vec::new(),
            swap_metrics: SwapMetrics::compute(&[], &[], input.algo.starting_capital_usd),
            algo_metrics: AlgoMetrics::default(),
            is_empty: true,
            completed_at: Utc::now(),
            duration_ms,
            total_bars_processed: 0,
            warnings: Vec::new(),
        }
    }
}

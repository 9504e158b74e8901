//! Performance metrics — pure functions over trades and the equity curve.
//!
//! Metric conventions:
//! - `win_rate` = wins / total trades (0 when no trades).
//! - `profit_factor` = gross profit / |gross loss|; +∞ when there are
//!   profits and no losses, 0 when both are zero.
//! - `sharpe_ratio` / `sortino_ratio` use the per-trade convention:
//!   mean(trade PnL %) / stddev · √(trade count), with the sample standard
//!   deviation; Sortino's denominator is the sample deviation of the
//!   negative subset.
//! - `max_drawdown_pct` = max over the curve of (running max − equity) /
//!   running max.
//! - `calmar_ratio` = total return / max drawdown pct (0 without drawdown).

use backcast_core::domain::{EquityPoint, Trade, TradeDirection};
use backcast_core::sim::SimResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-direction trade breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DirectionBreakdown {
    pub trades: usize,
    pub wins: usize,
    pub win_rate: f64,
    pub pnl_usd: f64,
}

/// Trade duration statistics.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DurationStats {
    pub avg_bars: f64,
    pub max_bars: usize,
    pub avg_secs: f64,
    pub max_secs: i64,
}

/// Aggregate trade and equity metrics for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapMetrics {
    pub total_trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub win_rate: f64,
    pub gross_profit_usd: f64,
    pub gross_loss_usd: f64,
    pub total_pnl_usd: f64,
    pub total_return_pct: f64,
    pub profit_factor: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub max_drawdown_pct: f64,
    pub max_drawdown_usd: f64,
    pub calmar_ratio: f64,
    pub long: DirectionBreakdown,
    pub short: DirectionBreakdown,
    pub duration: DurationStats,
    pub total_fees_usd: f64,
}

impl SwapMetrics {
    /// Compute all metrics from the trade list and equity curve.
    pub fn compute(trades: &[Trade], equity_curve: &[EquityPoint], starting_capital_usd: f64) -> Self {
        let total_trades = trades.len();
        let wins = trades.iter().filter(|t| t.is_winner()).count();
        let losses = trades.iter().filter(|t| t.pnl_usd < 0.0).count();

        let gross_profit_usd: f64 = trades
            .iter()
            .filter(|t| t.pnl_usd > 0.0)
            .map(|t| t.pnl_usd)
            .sum();
        let gross_loss_usd: f64 = trades
            .iter()
            .filter(|t| t.pnl_usd < 0.0)
            .map(|t| t.pnl_usd.abs())
            .sum();
        let total_pnl_usd: f64 = trades.iter().map(|t| t.pnl_usd).sum();

        let (max_drawdown_pct, max_drawdown_usd) = max_drawdown(equity_curve);
        let total_return_pct = if starting_capital_usd > 0.0 {
            total_pnl_usd / starting_capital_usd
        } else {
            0.0
        };

        Self {
            total_trades,
            wins,
            losses,
            win_rate: win_rate(trades),
            gross_profit_usd,
            gross_loss_usd,
            total_pnl_usd,
            total_return_pct,
            profit_factor: profit_factor(gross_profit_usd, gross_loss_usd),
            sharpe_ratio: sharpe_ratio(trades),
            sortino_ratio: sortino_ratio(trades),
            max_drawdown_pct,
            max_drawdown_usd,
            calmar_ratio: calmar_ratio(total_return_pct, max_drawdown_pct),
            long: direction_breakdown(trades, TradeDirection::Long),
            short: direction_breakdown(trades, TradeDirection::Short),
            duration: duration_stats(trades),
            total_fees_usd: trades.iter().map(|t| t.total_fees_usd()).sum(),
        }
    }
}

/// Simulator state distribution and trigger counts.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AlgoMetrics {
    /// Fraction of simulation bars spent flat / long / short.
    pub pct_flat: f64,
    pub pct_long: f64,
    pub pct_short: f64,
    pub exit_reason_counts: BTreeMap<String, usize>,
    pub condition_trigger_counts: BTreeMap<String, usize>,
    pub entries_skipped: usize,
}

impl AlgoMetrics {
    pub fn compute(sim: &SimResult) -> Self {
        let bars = sim.bars_processed.max(1) as f64;
        let entries_skipped = sim
            .algo_events
            .iter()
            .filter(|e| {
                matches!(
                    e.kind,
                    backcast_core::sim::AlgoEventKind::EntrySkipped { .. }
                )
            })
            .count();
        Self {
            pct_flat: sim.bars_flat as f64 / bars,
            pct_long: sim.bars_long as f64 / bars,
            pct_short: sim.bars_short as f64 / bars,
            exit_reason_counts: sim
                .exit_reason_counts
                .iter()
                .map(|(reason, &count)| (format!("{reason:?}"), count))
                .collect(),
            condition_trigger_counts: sim
                .condition_trigger_counts
                .iter()
                .map(|(kind, &count)| (format!("{kind:?}"), count))
                .collect(),
            entries_skipped,
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Fraction of trades that were winners. 0 when there are no trades.
pub fn win_rate(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    trades.iter().filter(|t| t.is_winner()).count() as f64 / trades.len() as f64
}

/// Gross profit over absolute gross loss.
///
/// +∞ when there is profit and no loss; 0 when both are zero.
pub fn profit_factor(gross_profit: f64, gross_loss: f64) -> f64 {
    if gross_loss == 0.0 {
        if gross_profit > 0.0 {
            f64::INFINITY
        } else {
            0.0
        }
    } else {
        gross_profit / gross_loss
    }
}

/// Per-trade Sharpe: mean(PnL %) / sample stddev(PnL %) · √N.
///
/// 0 with fewer than two trades or zero variance.
pub fn sharpe_ratio(trades: &[Trade]) -> f64 {
    let pcts: Vec<f64> = trades.iter().map(|t| t.pnl_pct).collect();
    if pcts.len() < 2 {
        return 0.0;
    }
    let std = std_dev(&pcts);
    if std < 1e-15 {
        return 0.0;
    }
    mean(&pcts) / std * (pcts.len() as f64).sqrt()
}

/// Per-trade Sortino: mean(PnL %) / sample stddev(negative PnL %) · √N.
///
/// 0 when fewer than two losing trades exist (the downside deviation is
/// undefined).
pub fn sortino_ratio(trades: &[Trade]) -> f64 {
    let pcts: Vec<f64> = trades.iter().map(|t| t.pnl_pct).collect();
    if pcts.len() < 2 {
        return 0.0;
    }
    let negatives: Vec<f64> = pcts.iter().copied().filter(|p| *p < 0.0).collect();
    if negatives.len() < 2 {
        return 0.0;
    }
    let downside = std_dev(&negatives);
    if downside < 1e-15 {
        return 0.0;
    }
    mean(&pcts) / downside * (pcts.len() as f64).sqrt()
}

/// Max drawdown over the equity curve as (fraction, USD).
pub fn max_drawdown(equity_curve: &[EquityPoint]) -> (f64, f64) {
    let mut running_max = f64::MIN;
    let mut max_pct = 0.0_f64;
    let mut max_usd = 0.0_f64;
    for point in equity_curve {
        running_max = running_max.max(point.equity);
        let dd_usd = running_max - point.equity;
        if dd_usd > max_usd {
            max_usd = dd_usd;
        }
        if running_max > 0.0 {
            let dd_pct = dd_usd / running_max;
            if dd_pct > max_pct {
                max_pct = dd_pct;
            }
        }
    }
    (max_pct, max_usd)
}

/// Total return over max drawdown. 0 when there was no drawdown.
pub fn calmar_ratio(total_return_pct: f64, max_drawdown_pct: f64) -> f64 {
    if max_drawdown_pct <= 0.0 {
        return 0.0;
    }
    total_return_pct / max_drawdown_pct
}

fn direction_breakdown(trades: &[Trade], direction: TradeDirection) -> DirectionBreakdown {
    let subset: Vec<&Trade> = trades.iter().filter(|t| t.direction == direction).collect();
    let wins = subset.iter().filter(|t| t.is_winner()).count();
    DirectionBreakdown {
        trades: subset.len(),
        wins,
        win_rate: if subset.is_empty() {
            0.0
        } else {
            wins as f64 / subset.len() as f64
        },
        pnl_usd: subset.iter().map(|t| t.pnl_usd).sum(),
    }
}

fn duration_stats(trades: &[Trade]) -> DurationStats {
    if trades.is_empty() {
        return DurationStats::default();
    }
    let n = trades.len() as f64;
    DurationStats {
        avg_bars: trades.iter().map(|t| t.duration_bars).sum::<usize>() as f64 / n,
        max_bars: trades.iter().map(|t| t.duration_bars).max().unwrap_or(0),
        avg_secs: trades.iter().map(|t| t.duration_secs).sum::<i64>() as f64 / n,
        max_secs: trades.iter().map(|t| t.duration_secs).max().unwrap_or(0),
    }
}

// ─── Helpers ────────────────────────────────────────────────────────

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use backcast_core::domain::{Asset, ExitReason, Swap, SwapId, TradeId};

    fn make_trade(direction: TradeDirection, pnl_usd: f64, bars: usize) -> Trade {
        let notional = 10_000.0;
        let entry = Swap {
            id: SwapId(0),
            bar_index: 0,
            bucket: 0,
            from_asset: Asset::Usd,
            to_asset: Asset::Base,
            from_amount: notional,
            to_amount: 100.0,
            price: 100.0,
            is_entry: true,
            direction,
            fee_usd: 1.0,
            slippage_usd: 0.0,
        };
        let exit = Swap {
            id: SwapId(1),
            bar_index: bars,
            bucket: bars as i64 * 60,
            from_asset: Asset::Base,
            to_asset: Asset::Usd,
            from_amount: 100.0,
            to_amount: notional + pnl_usd,
            price: 100.0 + pnl_usd / 100.0,
            is_entry: false,
            direction,
            fee_usd: 1.0,
            slippage_usd: 0.0,
        };
        Trade {
            id: TradeId(2),
            direction,
            entry_swap: entry,
            exit_swap: exit,
            pnl_usd,
            pnl_pct: pnl_usd / notional,
            duration_bars: bars,
            duration_secs: bars as i64 * 60,
            exit_reason: ExitReason::ExitSignal,
            max_drawdown_usd: pnl_usd.min(0.0),
            max_runup_usd: pnl_usd.max(0.0),
        }
    }

    fn equity_points(values: &[f64]) -> Vec<EquityPoint> {
        values
            .iter()
            .enumerate()
            .map(|(i, &equity)| EquityPoint {
                bucket: i as i64 * 60,
                bar_index: i,
                equity,
                drawdown_pct: 0.0,
            })
            .collect()
    }

    // ── Win rate ──

    #[test]
    fn win_rate_mixed() {
        let trades = vec![
            make_trade(TradeDirection::Long, 500.0, 3),
            make_trade(TradeDirection::Long, -200.0, 2),
            make_trade(TradeDirection::Short, 300.0, 5),
            make_trade(TradeDirection::Short, -100.0, 1),
        ];
        assert!((win_rate(&trades) - 0.5).abs() < 1e-10);
    }

    #[test]
    fn win_rate_empty() {
        assert_eq!(win_rate(&[]), 0.0);
    }

    // ── Profit factor ──

    #[test]
    fn profit_factor_mixed() {
        assert!((profit_factor(800.0, 200.0) - 4.0).abs() < 1e-10);
    }

    #[test]
    fn profit_factor_no_losses_is_infinite() {
        assert!(profit_factor(800.0, 0.0).is_infinite());
    }

    #[test]
    fn profit_factor_no_trades_is_zero() {
        assert_eq!(profit_factor(0.0, 0.0), 0.0);
    }

    // ── Sharpe / Sortino ──

    #[test]
    fn sharpe_zero_for_single_trade() {
        let trades = vec![make_trade(TradeDirection::Long, 500.0, 3)];
        assert_eq!(sharpe_ratio(&trades), 0.0);
    }

    #[test]
    fn sharpe_positive_for_mostly_winners() {
        let trades = vec![
            make_trade(TradeDirection::Long, 500.0, 3),
            make_trade(TradeDirection::Long, 300.0, 2),
            make_trade(TradeDirection::Long, -100.0, 1),
            make_trade(TradeDirection::Long, 400.0, 4),
        ];
        assert!(sharpe_ratio(&trades) > 0.0);
    }

    #[test]
    fn sharpe_zero_for_identical_pnls() {
        let trades = vec![
            make_trade(TradeDirection::Long, 200.0, 1),
            make_trade(TradeDirection::Long, 200.0, 1),
        ];
        assert_eq!(sharpe_ratio(&trades), 0.0);
    }

    #[test]
    fn sortino_needs_two_losers() {
        let trades = vec![
            make_trade(TradeDirection::Long, 500.0, 3),
            make_trade(TradeDirection::Long, -100.0, 1),
        ];
        assert_eq!(sortino_ratio(&trades), 0.0);

        let trades = vec![
            make_trade(TradeDirection::Long, 500.0, 3),
            make_trade(TradeDirection::Long, -100.0, 1),
            make_trade(TradeDirection::Long, -300.0, 2),
        ];
        assert!(sortino_ratio(&trades) != 0.0);
    }

    // ── Drawdown ──

    #[test]
    fn max_drawdown_known_curve() {
        let curve = equity_points(&[100_000.0, 110_000.0, 90_000.0, 95_000.0]);
        let (pct, usd) = max_drawdown(&curve);
        assert!((pct - 20_000.0 / 110_000.0).abs() < 1e-10);
        assert!((usd - 20_000.0).abs() < 1e-10);
    }

    #[test]
    fn max_drawdown_monotone_curve_is_zero() {
        let curve = equity_points(&[100.0, 110.0, 120.0]);
        let (pct, usd) = max_drawdown(&curve);
        assert_eq!(pct, 0.0);
        assert_eq!(usd, 0.0);
    }

    #[test]
    fn max_drawdown_empty_curve() {
        assert_eq!(max_drawdown(&[]), (0.0, 0.0));
    }

    // ── Calmar ──

    #[test]
    fn calmar_known_values() {
        assert!((calmar_ratio(0.30, 0.10) - 3.0).abs() < 1e-10);
        assert_eq!(calmar_ratio(0.30, 0.0), 0.0);
    }

    // ── Aggregates ──

    #[test]
    fn compute_no_trades_is_zeroed() {
        let metrics = SwapMetrics::compute(&[], &equity_points(&[10_000.0; 5]), 10_000.0);
        assert_eq!(metrics.total_trades, 0);
        assert_eq!(metrics.win_rate, 0.0);
        assert_eq!(metrics.profit_factor, 0.0);
        assert_eq!(metrics.total_pnl_usd, 0.0);
        assert_eq!(metrics.duration.max_bars, 0);
        assert!(metrics.sharpe_ratio.is_finite());
    }

    #[test]
    fn compute_direction_breakdowns() {
        let trades = vec![
            make_trade(TradeDirection::Long, 500.0, 3),
            make_trade(TradeDirection::Long, -200.0, 2),
            make_trade(TradeDirection::Short, 300.0, 5),
        ];
        let metrics = SwapMetrics::compute(&trades, &equity_points(&[10_000.0; 5]), 10_000.0);
        assert_eq!(metrics.long.trades, 2);
        assert_eq!(metrics.long.wins, 1);
        assert!((metrics.long.pnl_usd - 300.0).abs() < 1e-10);
        assert_eq!(metrics.short.trades, 1);
        assert!((metrics.short.win_rate - 1.0).abs() < 1e-10);
    }

    #[test]
    fn compute_total_pnl_matches_trade_sum() {
        let trades = vec![
            make_trade(TradeDirection::Long, 500.0, 3),
            make_trade(TradeDirection::Short, -120.0, 2),
            make_trade(TradeDirection::Long, 75.5, 1),
        ];
        let metrics = SwapMetrics::compute(&trades, &equity_points(&[10_000.0; 3]), 10_000.0);
        let sum: f64 = trades.iter().map(|t| t.pnl_usd).sum();
        assert!((metrics.total_pnl_usd - sum).abs() <= 1e-6 * sum.abs());
    }

    #[test]
    fn compute_duration_stats() {
        let trades = vec![
            make_trade(TradeDirection::Long, 100.0, 2),
            make_trade(TradeDirection::Long, 100.0, 6),
        ];
        let metrics = SwapMetrics::compute(&trades, &equity_points(&[10_000.0; 8]), 10_000.0);
        assert!((metrics.duration.avg_bars - 4.0).abs() < 1e-10);
        assert_eq!(metrics.duration.max_bars, 6);
        assert_eq!(metrics.duration.max_secs, 360);
    }

    #[test]
    fn compute_fees_sum_both_legs() {
        let trades = vec![make_trade(TradeDirection::Long, 100.0, 2)];
        let metrics = SwapMetrics::compute(&trades, &equity_points(&[10_000.0; 3]), 10_000.0);
        assert!((metrics.total_fees_usd - 2.0).abs() < 1e-10);
    }
}

//! Event-driven simulator — Stage 7.
//!
//! The event heap is the sole source of time progression for signal
//! handling; the per-bar walk exists to scan price triggers for the open
//! position and to mark equity. Within a bar the ordering contract is:
//!
//! 1. price-level triggers (SL / TP / trailing), resolved in sub-bar order —
//!    they fired intra-bar, before any close-of-bar signal;
//! 2. signal events in event-id order (the extractor's emission order);
//! 3. end-of-stream close, when configured, on the final bar;
//! 4. equity mark at the bar close.
//!
//! A position opened at the close of bar `b` is first exposed to price
//! triggers on bar `b + 1`.

use crate::config::{AlgoParams, Condition, ValueConfig, ValueKind};
use crate::domain::{
    Asset, Candle, EquityPoint, ExitReason, IdGen, PositionState, Swap, Trade, TradeDirection,
};
use crate::error::BacktestError;
use crate::event::{ConditionKind, Event, EventHeap, EventKind};
use crate::signal::ResampledSignalCache;
use crate::sim::scanner::scan_bar;
use crate::sim::state::{
    AlgoEvent, AlgoEventKind, OpenPosition, SimConfig, SimResult, SimState, SkipReason,
};
use crate::subbar::SubBarSource;
use crate::trackers::{
    dyn_factor, position_size_usd, BalanceTracker, LevelOffset, StopLossTracker,
    TakeProfitTracker,
};

const BPS: f64 = 10_000.0;

/// Borrowed inputs for one simulation.
pub struct SimInputs<'a> {
    pub sim_candles: &'a [Candle],
    pub sub_bars: SubBarSource<'a>,
    pub events: EventHeap,
    pub resampled: &'a ResampledSignalCache,
    pub algo: &'a AlgoParams,
    /// Simulation bars during which entries are suppressed.
    pub warmup_bars: usize,
    pub config: SimConfig,
}

/// Run the position state machine over the event heap.
pub fn simulate(inputs: SimInputs<'_>, id_gen: &mut IdGen) -> Result<SimResult, BacktestError> {
    let SimInputs {
        sim_candles,
        sub_bars,
        mut events,
        resampled,
        algo,
        warmup_bars,
        config,
    } = inputs;

    let n = sim_candles.len();
    let mut state = SimState::new(config.starting_cash_usd);
    let mut result = SimResult::default();
    let mut running_max = f64::MIN;

    let mut next_event = events.pop();

    for bar in 0..n {
        let candle = &sim_candles[bar];

        // Phase 1: price triggers for the open position.
        let trigger = match state.open.as_mut() {
            Some(pos) if bar > pos.entry_bar => scan_bar(candle, sub_bars.sub_bars(bar), pos),
            _ => None,
        };
        if let Some(trigger) = trigger {
            close_position(
                &mut state,
                &mut result,
                id_gen,
                bar,
                trigger.bucket,
                trigger.price,
                trigger.reason,
                &config,
            )?;
        }

        // Phase 2: signal events for this bar, in event-id order.
        while next_event.as_ref().is_some_and(|e| e.bar_index <= bar) {
            let ev = next_event.take().unwrap();
            debug_assert_eq!(ev.bar_index, bar, "event heap lagged the bar cursor");
            service_event(
                &ev,
                candle,
                bar,
                &mut state,
                &mut result,
                id_gen,
                resampled,
                algo,
                warmup_bars,
                &config,
            )?;
            next_event = events.pop();
        }

        // Phase 3: end-of-stream close before the final equity mark.
        if bar + 1 == n && config.close_position_on_exit && state.open.is_some() {
            close_position(
                &mut state,
                &mut result,
                id_gen,
                bar,
                candle.bucket,
                candle.close,
                ExitReason::EndOfBacktest,
                &config,
            )?;
        }

        // Phase 4: per-bar bookkeeping and the equity mark.
        match state.position() {
            PositionState::Flat => state.bars_flat += 1,
            PositionState::Long => state.bars_long += 1,
            PositionState::Short => state.bars_short += 1,
        }
        if let Some(pos) = state.open.as_mut() {
            pos.balance.observe(candle.close);
        }

        let equity = mark_equity(&state, candle.close);
        if !equity.is_finite() {
            return Err(BacktestError::NumericInvalid {
                context: format!("equity became non-finite at bar {bar}"),
            });
        }
        running_max = running_max.max(equity);
        let drawdown_pct = if running_max > 0.0 {
            ((running_max - equity) / running_max).max(0.0)
        } else {
            0.0
        };
        result.equity.push(EquityPoint {
            bucket: candle.bucket,
            bar_index: bar,
            equity,
            drawdown_pct,
        });
    }

    result.bars_processed = n;
    result.bars_flat = state.bars_flat;
    result.bars_long = state.bars_long;
    result.bars_short = state.bars_short;
    result.final_cash_usd = state.cash_usd;
    Ok(result)
}

/// Cash plus mark-to-market of the open position, gross of exit costs.
fn mark_equity(state: &SimState, close: f64) -> f64 {
    match &state.open {
        None => state.cash_usd,
        Some(pos) => {
            let qty = pos.balance.qty();
            match pos.direction {
                TradeDirection::Long => state.cash_usd + qty * close,
                TradeDirection::Short => {
                    state.cash_usd + qty * (2.0 * pos.balance.effective_entry() - close)
                }
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn service_event(
    ev: &Event,
    candle: &Candle,
    bar: usize,
    state: &mut SimState,
    result: &mut SimResult,
    id_gen: &mut IdGen,
    resampled: &ResampledSignalCache,
    algo: &AlgoParams,
    warmup_bars: usize,
    config: &SimConfig,
) -> Result<(), BacktestError> {
    if ev.kind != EventKind::ConditionMet {
        // Crossings and condition-unmet events carry no transition of their
        // own; they exist for diagnostics and event-stream consumers.
        return Ok(());
    }

    *result
        .condition_trigger_counts
        .entry(ev.condition)
        .or_default() += 1;
    push_algo_event(
        result,
        id_gen,
        bar,
        ev.bucket,
        AlgoEventKind::ConditionTriggered {
            condition: ev.condition,
        },
    );

    match ev.condition {
        ConditionKind::LongEntry => {
            if let Some(cond) = algo.long_entry.as_ref() {
                try_open(
                    TradeDirection::Long,
                    cond,
                    candle,
                    bar,
                    state,
                    result,
                    id_gen,
                    resampled,
                    algo,
                    warmup_bars,
                    config,
                )?;
            }
        }
        ConditionKind::ShortEntry => {
            if let Some(cond) = algo.short_entry.as_ref() {
                try_open(
                    TradeDirection::Short,
                    cond,
                    candle,
                    bar,
                    state,
                    result,
                    id_gen,
                    resampled,
                    algo,
                    warmup_bars,
                    config,
                )?;
            }
        }
        ConditionKind::LongExit => {
            if state.position() == PositionState::Long {
                close_position(
                    state,
                    result,
                    id_gen,
                    bar,
                    candle.bucket,
                    candle.close,
                    ExitReason::ExitSignal,
                    config,
                )?;
            }
        }
        ConditionKind::ShortExit => {
            if state.position() == PositionState::Short {
                close_position(
                    state,
                    result,
                    id_gen,
                    bar,
                    candle.bucket,
                    candle.close,
                    ExitReason::ExitSignal,
                    config,
                )?;
            }
        }
    }
    Ok(())
}

/// The normalized DYN factor for a value config at the entry bar; 1.0 for
/// ABS/REL configs.
fn entry_factor(cfg: &ValueConfig, resampled: &ResampledSignalCache, bar: usize) -> f64 {
    match (cfg.kind, &cfg.value_factor) {
        (ValueKind::Dyn, Some(factor)) => {
            dyn_factor(resampled.value(&factor.cache_key(), bar), cfg.inverted)
        }
        _ => 1.0,
    }
}

#[allow(clippy::too_many_arguments)]
fn try_open(
    direction: TradeDirection,
    entry_cond: &Condition,
    candle: &Candle,
    bar: usize,
    state: &mut SimState,
    result: &mut SimResult,
    id_gen: &mut IdGen,
    resampled: &ResampledSignalCache,
    algo: &AlgoParams,
    warmup_bars: usize,
    config: &SimConfig,
) -> Result<(), BacktestError> {
    let skip = if state.open.is_some() {
        Some(SkipReason::PositionOpen)
    } else if bar < warmup_bars {
        Some(SkipReason::Warmup)
    } else if state.cooldown_expires_at.is_some_and(|at| bar < at) {
        Some(SkipReason::Cooldown)
    } else if config
        .trades_limit
        .is_some_and(|limit| state.trades_completed >= limit)
    {
        Some(SkipReason::TradesLimit)
    } else {
        None
    };
    if let Some(reason) = skip {
        push_algo_event(
            result,
            id_gen,
            bar,
            candle.bucket,
            AlgoEventKind::EntrySkipped { reason },
        );
        return Ok(());
    }

    let entry_price = candle.close;
    let size_factor = entry_factor(&algo.position_size, resampled, bar);
    let fee_rate = config.fee_bps / BPS;
    let size_usd = position_size_usd(&algo.position_size, state.cash_usd, size_factor)
        .min(state.cash_usd / (1.0 + fee_rate));
    if !size_usd.is_finite() || size_usd <= 0.0 {
        push_algo_event(
            result,
            id_gen,
            bar,
            candle.bucket,
            AlgoEventKind::EntrySkipped {
                reason: SkipReason::NoCapital,
            },
        );
        return Ok(());
    }

    let balance = BalanceTracker::new(
        direction,
        entry_price,
        size_usd,
        config.fee_bps,
        config.slippage_bps,
    );

    let stop = entry_cond.stop_loss.as_ref().map(|cfg| {
        let offset = LevelOffset::resolve(cfg, entry_factor(cfg, resampled, bar));
        StopLossTracker::new(direction, offset, entry_cond.trailing_sl, entry_price)
    });
    let take_profit = entry_cond.take_profit.as_ref().map(|cfg| {
        let offset = LevelOffset::resolve(cfg, entry_factor(cfg, resampled, bar));
        TakeProfitTracker::new(direction, offset, entry_price)
    });

    let entry_swap = match direction {
        TradeDirection::Long => {
            let total_cost = size_usd + balance.entry_fee_usd();
            state.cash_usd -= total_cost;
            Swap {
                id: id_gen.next_swap_id(),
                bar_index: bar,
                bucket: candle.bucket,
                from_asset: Asset::Usd,
                to_asset: Asset::Base,
                from_amount: total_cost,
                to_amount: balance.qty(),
                price: balance.effective_entry(),
                is_entry: true,
                direction,
                fee_usd: balance.entry_fee_usd(),
                slippage_usd: balance.entry_slippage_usd(),
            }
        }
        TradeDirection::Short => {
            // Collateral for the short leg is reserved from cash; the USD
            // value of the sold asset (net of fee) is the swap's out-leg.
            state.cash_usd -= size_usd + balance.entry_fee_usd();
            Swap {
                id: id_gen.next_swap_id(),
                bar_index: bar,
                bucket: candle.bucket,
                from_asset: Asset::Base,
                to_asset: Asset::Usd,
                from_amount: balance.qty(),
                to_amount: size_usd - balance.entry_fee_usd(),
                price: balance.effective_entry(),
                is_entry: true,
                direction,
                fee_usd: balance.entry_fee_usd(),
                slippage_usd: balance.entry_slippage_usd(),
            }
        }
    };
    if !state.cash_usd.is_finite() {
        return Err(BacktestError::NumericInvalid {
            context: format!("cash became non-finite opening a trade at bar {bar}"),
        });
    }

    result.swaps.push(entry_swap.clone());
    push_algo_event(
        result,
        id_gen,
        bar,
        candle.bucket,
        AlgoEventKind::PositionOpened { direction },
    );
    state.open = Some(OpenPosition {
        direction,
        entry_bar: bar,
        entry_bucket: candle.bucket,
        balance,
        stop,
        take_profit,
        entry_swap,
    });
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn close_position(
    state: &mut SimState,
    result: &mut SimResult,
    id_gen: &mut IdGen,
    bar: usize,
    bucket: i64,
    price: f64,
    reason: ExitReason,
    config: &SimConfig,
) -> Result<(), BacktestError> {
    let pos = state
        .open
        .take()
        .ok_or_else(|| BacktestError::invariant("close_position with no open position"))?;

    let exit = pos.balance.realized(price);
    if !exit.pnl_usd.is_finite() {
        return Err(BacktestError::NumericInvalid {
            context: format!("realized PnL became non-finite at bar {bar}"),
        });
    }
    let qty = pos.balance.qty();

    let exit_swap = match pos.direction {
        TradeDirection::Long => {
            state.cash_usd += exit.notional_usd - exit.fee_usd;
            Swap {
                id: id_gen.next_swap_id(),
                bar_index: bar,
                bucket,
                from_asset: Asset::Base,
                to_asset: Asset::Usd,
                from_amount: qty,
                to_amount: exit.notional_usd - exit.fee_usd,
                price: exit.effective_price,
                is_entry: false,
                direction: pos.direction,
                fee_usd: exit.fee_usd,
                slippage_usd: exit.slippage_usd,
            }
        }
        TradeDirection::Short => {
            state.cash_usd +=
                qty * (2.0 * pos.balance.effective_entry() - exit.effective_price) - exit.fee_usd;
            Swap {
                id: id_gen.next_swap_id(),
                bar_index: bar,
                bucket,
                from_asset: Asset::Usd,
                to_asset: Asset::Base,
                from_amount: exit.notional_usd + exit.fee_usd,
                to_amount: qty,
                price: exit.effective_price,
                is_entry: false,
                direction: pos.direction,
                fee_usd: exit.fee_usd,
                slippage_usd: exit.slippage_usd,
            }
        }
    };
    if !state.cash_usd.is_finite() {
        return Err(BacktestError::NumericInvalid {
            context: format!("cash became non-finite closing a trade at bar {bar}"),
        });
    }

    let trade = Trade {
        id: id_gen.next_trade_id(),
        direction: pos.direction,
        entry_swap: pos.entry_swap.clone(),
        exit_swap: exit_swap.clone(),
        pnl_usd: exit.pnl_usd,
        pnl_pct: exit.pnl_usd / pos.balance.entry_notional_usd(),
        duration_bars: bar - pos.entry_bar,
        duration_secs: bucket - pos.entry_bucket,
        exit_reason: reason,
        // The closes the balance tracker observed may miss the exit fill
        // itself (an SL fill can be worse than any close), so the realized
        // PnL expands the range too.
        max_drawdown_usd: pos.balance.max_drawdown_usd().min(exit.pnl_usd.min(0.0)),
        max_runup_usd: pos.balance.max_runup_usd().max(exit.pnl_usd.max(0.0)),
    };

    state.trades_completed += 1;
    if let Some(cooldown) = config.cooldown_bars {
        state.cooldown_expires_at = Some(bar + cooldown);
    }

    *result.exit_reason_counts.entry(reason).or_default() += 1;
    push_algo_event(
        result,
        id_gen,
        bar,
        bucket,
        AlgoEventKind::PositionClosed {
            direction: pos.direction,
            reason,
        },
    );
    result.swaps.push(exit_swap);
    result.trades.push(trade);
    Ok(())
}

fn push_algo_event(
    result: &mut SimResult,
    id_gen: &mut IdGen,
    bar: usize,
    bucket: i64,
    kind: AlgoEventKind,
) {
    result.algo_events.push(AlgoEvent {
        id: id_gen.next_event_id(),
        bucket,
        bar_index: bar,
        kind,
    });
}

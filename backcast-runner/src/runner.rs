//! Pipeline orchestration — validates the input and drives stages 1–8.
//!
//! Each stage is a pure function of the previous stages' outputs and runs to
//! completion before the next starts:
//!
//! 1. candle filtering and validation (`loader`)
//! 2. mip-map construction
//! 3. sub-bar source (lazy view over the base candles)
//! 4. indicator pre-calculation
//! 5. resampling to the simulation resolution
//! 6. event extraction
//! 7. the event-driven simulation
//! 8. metric aggregation and output assembly

use crate::loader;
use crate::metrics::{AlgoMetrics, SwapMetrics};
use crate::result::{BacktestOutput, ConfigEcho, RunEvents, SCHEMA_VERSION};
use backcast_core::config::{BacktestInput, Condition};
use backcast_core::domain::{Candle, IdGen};
use backcast_core::error::BacktestError;
use backcast_core::event::{extract_events, ConditionKind};
use backcast_core::mipmap::MipMap;
use backcast_core::signal::{precalculate, resample, simulation_resolution};
use backcast_core::sim::{simulate, SimConfig, SimInputs};
use backcast_core::subbar::SubBarSource;
use chrono::Utc;
use std::time::Instant;

/// Run a complete backtest over `candles` with the given input.
///
/// `candles` is the full loaded series; the runner filters it to
/// `[start - warmup, end]`. An empty window yields a well-formed empty
/// output, not an error.
pub fn run_backtest(
    candles: &[Candle],
    input: &BacktestInput,
) -> Result<BacktestOutput, BacktestError> {
    let started = Instant::now();

    // Stage 0: validation. Fails before any data is touched.
    input.validate()?;

    let indicators = input.algo.indicators();
    let warmup_secs = indicators
        .iter()
        .map(|ind| ind.warmup() as i64 * ind.resolution_secs())
        .max()
        .unwrap_or(0);

    // Stage 1: filter to the run window and locate the trading start.
    let loaded = match loader::prepare_candles(candles, &input.run, warmup_secs)? {
        Some(loaded) => loaded,
        None => return Ok(BacktestOutput::empty(input, elapsed_ms(started))),
    };
    let base_res = loaded.base_resolution_secs;

    // Stage 2: mip-map over every resolution the run needs.
    let resolutions: Vec<i64> = indicators.iter().map(|ind| ind.resolution_secs()).collect();
    let sim_res = simulation_resolution(&resolutions, base_res);
    let mut requested = resolutions;
    requested.push(sim_res);
    let mipmap = MipMap::build(&loaded.candles, base_res, &requested)?;

    // Stage 4: pre-calculate unique indicators.
    let cache = precalculate(&mipmap, &indicators)?;

    // Stage 5: align everything to the simulation timeline.
    let sim_candles = mipmap
        .level(sim_res)
        .ok_or_else(|| BacktestError::invariant("simulation level missing from mip-map"))?;
    let sim_buckets: Vec<i64> = sim_candles.iter().map(|c| c.bucket).collect();
    let resampled = resample(&cache, &sim_buckets, sim_res, warmup_secs);

    // Trading start on the simulation timeline.
    let trading_start_index = sim_buckets
        .iter()
        .position(|&b| b >= input.run.start_time)
        .unwrap_or(sim_buckets.len());

    // Stage 6: extract the event heap. Entry kinds precede exit kinds in the
    // tie-break order, longs before shorts.
    let conditions: Vec<(ConditionKind, &Condition)> = [
        (ConditionKind::LongEntry, input.algo.long_entry.as_ref()),
        (ConditionKind::ShortEntry, input.algo.short_entry.as_ref()),
        (ConditionKind::LongExit, input.algo.long_exit.as_ref()),
        (ConditionKind::ShortExit, input.algo.short_exit.as_ref()),
    ]
    .into_iter()
    .filter_map(|(kind, cond)| cond.map(|c| (kind, c)))
    .collect();

    let mut id_gen = IdGen::default();
    let events = extract_events(
        &conditions,
        &resampled,
        &sim_buckets,
        trading_start_index,
        &mut id_gen,
    );

    // Stages 3 + 7: simulate with the lazy sub-bar view.
    let sim_config = SimConfig {
        starting_cash_usd: input.algo.starting_capital_usd * input.run.capital_scaler,
        fee_bps: input.run.fee_bps,
        slippage_bps: input.run.slippage_bps,
        trades_limit: input.run.trades_limit,
        cooldown_bars: input.algo.cooldown_bars,
        close_position_on_exit: input.run.close_position_on_exit,
    };
    let sim_result = simulate(
        SimInputs {
            sim_candles,
            sub_bars: SubBarSource::new(&loaded.candles, base_res, sim_res),
            events,
            resampled: &resampled,
            algo: &input.algo,
            warmup_bars: resampled.warmup_bars(),
            config: sim_config,
        },
        &mut id_gen,
    )?;

    // Stage 8: metrics and assembly.
    let starting_cash = input.algo.starting_capital_usd * input.run.capital_scaler;
    let swap_metrics = SwapMetrics::compute(&sim_result.trades, &sim_result.equity, starting_cash);
    let algo_metrics = AlgoMetrics::compute(&sim_result);

    let mut warnings = mipmap.warnings().to_vec();
    warnings.extend(cache.notes().iter().cloned());

    Ok(BacktestOutput {
        schema_version: SCHEMA_VERSION,
        run_id: input.run_id(),
        config: ConfigEcho::from_input(input),
        events: RunEvents {
            swap_events: sim_result.swaps,
            algo_events: sim_result.algo_events,
        },
        trades: sim_result.trades,
        equity_curve: sim_result.equity,
        swap_metrics,
        algo_metrics,
        is_empty: false,
        completed_at: Utc::now(),
        duration_ms: elapsed_ms(started),
        total_bars_processed: sim_result.bars_processed,
        warnings,
    })
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

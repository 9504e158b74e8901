//! Criterion benchmarks for the engine hot paths.
//!
//! Benchmarks:
//! 1. Mip-map build (candle pyramid folding)
//! 2. Indicator pre-calculation + resampling
//! 3. Full event-driven simulation

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use backcast_core::config::{AlgoParams, Condition, DirectionMode, OrderStyle, ValueConfig};
use backcast_core::domain::{Candle, IdGen};
use backcast_core::event::{extract_events, ConditionKind};
use backcast_core::indicators::IndicatorConfig;
use backcast_core::mipmap::MipMap;
use backcast_core::signal::{precalculate, resample, simulation_resolution};
use backcast_core::sim::{simulate, SimConfig, SimInputs};
use backcast_core::subbar::SubBarSource;

// ── Helpers ──────────────────────────────────────────────────────────

fn make_candles(n: usize) -> Vec<Candle> {
    (0..n)
        .map(|i| {
            let close = 100.0 + (i as f64 * 0.05).sin() * 10.0;
            let open = close - 0.3;
            Candle {
                bucket: i as i64 * 60,
                open,
                high: open.max(close) + 1.5,
                low: open.min(close) - 1.5,
                close,
                volume: 1_000.0 + (i % 500) as f64,
            }
        })
        .collect()
}

fn bench_algo() -> AlgoParams {
    AlgoParams {
        algo_id: "bench".into(),
        version: "1".into(),
        direction: DirectionMode::Long,
        long_entry: Some(Condition {
            required: vec![IndicatorConfig::EmaCross {
                fast_period: 9,
                slow_period: 21,
                resolution_secs: 300,
                bearish: false,
            }],
            optional: vec![],
            stop_loss: Some(ValueConfig::rel(0.05)),
            take_profit: Some(ValueConfig::rel(0.10)),
            trailing_sl: false,
        }),
        long_exit: Some(Condition {
            required: vec![IndicatorConfig::EmaCross {
                fast_period: 9,
                slow_period: 21,
                resolution_secs: 300,
                bearish: true,
            }],
            optional: vec![],
            stop_loss: None,
            take_profit: None,
            trailing_sl: false,
        }),
        short_entry: None,
        short_exit: None,
        position_size: ValueConfig::rel(1.0),
        starting_capital_usd: 100_000.0,
        cooldown_bars: None,
        order_style: OrderStyle::default(),
    }
}

// ── 1. Mip-map build ─────────────────────────────────────────────────

fn bench_mipmap(c: &mut Criterion) {
    let mut group = c.benchmark_group("mipmap_build");

    for &bar_count in &[10_000, 50_000] {
        let candles = make_candles(bar_count);
        group.bench_with_input(
            BenchmarkId::new("three_levels", bar_count),
            &bar_count,
            |b, _| {
                b.iter(|| MipMap::build(black_box(&candles), 60, &[300, 900, 3_600]).unwrap());
            },
        );
    }

    group.finish();
}

// ── 2. Pre-calculation + resampling ──────────────────────────────────

fn bench_precalc_resample(c: &mut Criterion) {
    let mut group = c.benchmark_group("precalc_resample");

    for &bar_count in &[10_000, 50_000] {
        let candles = make_candles(bar_count);
        let algo = bench_algo();
        let indicators = algo.indicators();
        let resolutions: Vec<i64> = indicators.iter().map(|i| i.resolution_secs()).collect();
        let sim_res = simulation_resolution(&resolutions, 60);
        let mut requested = resolutions.clone();
        requested.push(sim_res);
        let mip = MipMap::build(&candles, 60, &requested).unwrap();
        let buckets: Vec<i64> = mip.level(sim_res).unwrap().iter().map(|c| c.bucket).collect();

        group.bench_with_input(
            BenchmarkId::new("ema_cross_pair", bar_count),
            &bar_count,
            |b, _| {
                b.iter(|| {
                    let cache = precalculate(black_box(&mip), black_box(&indicators)).unwrap();
                    resample(&cache, &buckets, sim_res, 0)
                });
            },
        );
    }

    group.finish();
}

// ── 3. Full simulation ───────────────────────────────────────────────

fn bench_simulation(c: &mut Criterion) {
    let mut group = c.benchmark_group("simulation");

    for &bar_count in &[10_000, 50_000] {
        let candles = make_candles(bar_count);
        let algo = bench_algo();
        let indicators = algo.indicators();
        let resolutions: Vec<i64> = indicators.iter().map(|i| i.resolution_secs()).collect();
        let sim_res = simulation_resolution(&resolutions, 60);
        let mut requested = resolutions.clone();
        requested.push(sim_res);
        let mip = MipMap::build(&candles, 60, &requested).unwrap();
        let cache = precalculate(&mip, &indicators).unwrap();
        let sim_candles = mip.level(sim_res).unwrap();
        let buckets: Vec<i64> = sim_candles.iter().map(|c| c.bucket).collect();
        let resampled = resample(&cache, &buckets, sim_res, 0);

        let conditions: Vec<(ConditionKind, &Condition)> = vec![
            (ConditionKind::LongEntry, algo.long_entry.as_ref().unwrap()),
            (ConditionKind::LongExit, algo.long_exit.as_ref().unwrap()),
        ];

        group.bench_with_input(
            BenchmarkId::new("ema_cross_long", bar_count),
            &bar_count,
            |b, _| {
                b.iter(|| {
                    let mut id_gen = IdGen::default();
                    let events =
                        extract_events(&conditions, &resampled, &buckets, 0, &mut id_gen);
                    simulate(
                        SimInputs {
                            sim_candles: black_box(sim_candles),
                            sub_bars: SubBarSource::new(&candles, 60, sim_res),
                            events,
                            resampled: &resampled,
                            algo: &algo,
                            warmup_bars: 0,
                            config: SimConfig {
                                starting_cash_usd: 100_000.0,
                                fee_bps: 10.0,
                                slippage_bps: 5.0,
                                trades_limit: None,
                                cooldown_bars: None,
                                close_position_on_exit: true,
                            },
                        },
                        &mut id_gen,
                    )
                    .unwrap()
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_mipmap, bench_precalc_resample, bench_simulation);
criterion_main!(benches);

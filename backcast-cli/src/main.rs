//! Backcast CLI — run and synth commands.
//!
//! - `run` — execute a backtest from a candle CSV and a strategy TOML,
//!   writing the JSON result (and optional CSV artifacts)
//! - `synth` — generate a deterministic synthetic candle CSV for demos

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;

use backcast_core::config::BacktestInput;
use backcast_runner::export::{export_equity_csv, export_json, export_trades_csv};
use backcast_runner::loader::parse_candles_csv;
use backcast_runner::synthetic::generate_candles;
use backcast_runner::run_backtest;

#[derive(Parser)]
#[command(name = "backcast", about = "Deterministic candle backtesting engine", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a backtest: candle CSV in, JSON result out.
    Run {
        /// Candle CSV: time_us,open,high,low,close,volume,...
        #[arg(long)]
        candles: PathBuf,

        /// Strategy + run settings as TOML.
        #[arg(long)]
        config: PathBuf,

        /// Write the JSON result here (stdout when omitted).
        #[arg(long)]
        output: Option<PathBuf>,

        /// Also write the trade tape as CSV.
        #[arg(long)]
        trades_csv: Option<PathBuf>,

        /// Also write the equity curve as CSV.
        #[arg(long)]
        equity_csv: Option<PathBuf>,
    },

    /// Generate a synthetic candle CSV (deterministic per symbol).
    Synth {
        #[arg(long)]
        symbol: String,

        #[arg(long, default_value_t = 1_000)]
        bars: usize,

        /// Candle resolution in seconds.
        #[arg(long, default_value_t = 60)]
        resolution: i64,

        /// Bucket of the first candle (seconds since epoch).
        #[arg(long, default_value_t = 0)]
        start: i64,

        #[arg(long)]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    match Cli::parse().command {
        Command::Run {
            candles,
            config,
            output,
            trades_csv,
            equity_csv,
        } => run(candles, config, output, trades_csv, equity_csv),
        Command::Synth {
            symbol,
            bars,
            resolution,
            start,
            output,
        } => synth(&symbol, bars, resolution, start, output),
    }
}

fn run(
    candles_path: PathBuf,
    config_path: PathBuf,
    output: Option<PathBuf>,
    trades_csv: Option<PathBuf>,
    equity_csv: Option<PathBuf>,
) -> Result<()> {
    let file = fs::File::open(&candles_path)
        .with_context(|| format!("opening candle file {}", candles_path.display()))?;
    let candles = parse_candles_csv(file).context("parsing candle CSV")?;

    let config_text = fs::read_to_string(&config_path)
        .with_context(|| format!("reading config {}", config_path.display()))?;
    let input: BacktestInput =
        toml::from_str(&config_text).context("parsing strategy config TOML")?;

    let result = run_backtest(&candles, &input).context("backtest failed")?;

    eprintln!(
        "{}: {} bars, {} trades, pnl {:.2} USD, win rate {:.1}%, max drawdown {:.1}%{}",
        input.algo.algo_id,
        result.total_bars_processed,
        result.swap_metrics.total_trades,
        result.swap_metrics.total_pnl_usd,
        result.swap_metrics.win_rate * 100.0,
        result.swap_metrics.max_drawdown_pct * 100.0,
        if result.is_empty { " (empty range)" } else { "" },
    );
    for warning in &result.warnings {
        eprintln!("WARNING: {warning}");
    }

    let json = export_json(&result)?;
    match output {
        Some(path) => fs::write(&path, json)
            .with_context(|| format!("writing result to {}", path.display()))?,
        None => println!("{json}"),
    }

    if let Some(path) = trades_csv {
        fs::write(&path, export_trades_csv(&result.trades)?)
            .with_context(|| format!("writing trades CSV to {}", path.display()))?;
    }
    if let Some(path) = equity_csv {
        fs::write(&path, export_equity_csv(&result.equity_curve)?)
            .with_context(|| format!("writing equity CSV to {}", path.display()))?;
    }

    Ok(())
}

fn synth(
    symbol: &str,
    bars: usize,
    resolution: i64,
    start: i64,
    output: PathBuf,
) -> Result<()> {
    let candles = generate_candles(symbol, bars, resolution, start);

    let mut out = String::with_capacity(bars * 64);
    for c in &candles {
        let time_us = c.bucket * 1_000_000;
        let close_time_us = (c.bucket + resolution) * 1_000_000 - 1;
        out.push_str(&format!(
            "{},{:.8},{:.8},{:.8},{:.8},{:.8},{}\n",
            time_us, c.open, c.high, c.low, c.close, c.volume, close_time_us
        ));
    }

    fs::write(&output, out).with_context(|| format!("writing candles to {}", output.display()))?;
    eprintln!(
        "wrote {} candles for {symbol} at {resolution}s to {}",
        candles.len(),
        output.display()
    );
    Ok(())
}

//! Candle loading — Stage 1 of the pipeline.
//!
//! Input rows are comma-separated:
//! `time_us, open, high, low, close, volume, close_time, …`
//! Timestamps are microseconds since epoch and convert to second buckets
//! (`bucket = time_us / 1_000_000`); trailing columns beyond `volume` are
//! ignored.
//!
//! `prepare_candles` filters to `[start - warmup, end]`, validates the
//! series (sane OHLC, strictly ascending equispaced buckets), detects the
//! base resolution, and computes the trading start. An empty window is not
//! an error — the runner returns a well-formed empty output.

use backcast_core::config::RunSettings;
use backcast_core::domain::{detect_resolution, Candle};
use backcast_core::error::BacktestError;
use std::io::Read;

/// Candles ready for the pipeline.
#[derive(Debug, Clone)]
pub struct LoadedCandles {
    pub candles: Vec<Candle>,
    pub base_resolution_secs: i64,
    /// First base-candle index at or after `start_time`; bars before it are
    /// the pre-warming region.
    pub trading_start_index: usize,
}

/// Parse candle CSV from any reader.
pub fn parse_candles_csv<R: Read>(reader: R) -> Result<Vec<Candle>, BacktestError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut candles = Vec::new();
    for (i, record) in csv_reader.records().enumerate() {
        let line = i + 1;
        let record = record.map_err(|e| BacktestError::CandleFormatInvalid {
            line,
            reason: e.to_string(),
        })?;
        if record.len() < 6 {
            return Err(BacktestError::CandleFormatInvalid {
                line,
                reason: format!("expected at least 6 columns, got {}", record.len()),
            });
        }

        let time_us: i64 = parse_field(&record, 0, "time_us", line)?;
        let candle = Candle {
            bucket: time_us.div_euclid(1_000_000),
            open: parse_field(&record, 1, "open", line)?,
            high: parse_field(&record, 2, "high", line)?,
            low: parse_field(&record, 3, "low", line)?,
            close: parse_field(&record, 4, "close", line)?,
            volume: parse_field(&record, 5, "volume", line)?,
        };
        if !candle.is_sane() {
            return Err(BacktestError::CandleFormatInvalid {
                line,
                reason: "OHLC invariant violated (low <= open/close <= high, prices > 0)".into(),
            });
        }
        candles.push(candle);
    }
    Ok(candles)
}

fn parse_field<T: std::str::FromStr>(
    record: &csv::StringRecord,
    index: usize,
    name: &str,
    line: usize,
) -> Result<T, BacktestError> {
    record
        .get(index)
        .ok_or_else(|| BacktestError::CandleFormatInvalid {
            line,
            reason: format!("missing column `{name}`"),
        })?
        .parse()
        .map_err(|_| BacktestError::CandleFormatInvalid {
            line,
            reason: format!("column `{name}` is not numeric"),
        })
}

/// Filter candles to the run window (including the warmup prefix), validate
/// the series, and locate the trading start.
///
/// Returns `Ok(None)` when fewer than two candles fall inside
/// `[start - warmup, end]` — the resolution of a shorter series is
/// undefined, and the run degenerates to the empty output.
pub fn prepare_candles(
    all: &[Candle],
    run: &RunSettings,
    warmup_secs: i64,
) -> Result<Option<LoadedCandles>, BacktestError> {
    let window_start = run.start_time - warmup_secs;
    let candles: Vec<Candle> = all
        .iter()
        .filter(|c| c.bucket >= window_start && c.bucket <= run.end_time)
        .copied()
        .collect();

    if candles.len() < 2 {
        return Ok(None);
    }

    for (i, candle) in candles.iter().enumerate() {
        if !candle.is_sane() {
            return Err(BacktestError::CandleFormatInvalid {
                line: i + 1,
                reason: "OHLC invariant violated in filtered window".into(),
            });
        }
    }

    let base_resolution_secs = match detect_resolution(&candles) {
        Some(res) => res,
        None => {
            // Locate the first violating pair for the error context.
            let line = candles
                .windows(2)
                .position(|w| w[1].bucket - w[0].bucket != candles[1].bucket - candles[0].bucket)
                .map(|i| i + 2)
                .unwrap_or(2);
            return Err(BacktestError::CandleFormatInvalid {
                line,
                reason: "buckets are not strictly ascending and equispaced".into(),
            });
        }
    };

    let trading_start_index = candles
        .iter()
        .position(|c| c.bucket >= run.start_time)
        .unwrap_or(candles.len());

    Ok(Some(LoadedCandles {
        candles,
        base_resolution_secs,
        trading_start_index,
    }))
}

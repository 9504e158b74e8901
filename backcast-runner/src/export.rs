//! Result export — JSON round-trip and CSV artifacts.
//!
//! JSON carries the full `BacktestOutput` with its `schema_version`; newer
//! versions than this build understands are rejected on import. CSV covers
//! the trade tape and the equity curve for external analysis tools.

use anyhow::{bail, Context, Result};
use backcast_core::domain::{EquityPoint, Trade};

use crate::result::{BacktestOutput, SCHEMA_VERSION};

// ─── JSON ───────────────────────────────────────────────────────────

/// Serialize a `BacktestOutput` to pretty JSON.
pub fn export_json(output: &BacktestOutput) -> Result<String> {
    serde_json::to_string_pretty(output).context("failed to serialize BacktestOutput to JSON")
}

/// Deserialize a `BacktestOutput`, rejecting unknown newer schema versions.
pub fn import_json(json: &str) -> Result<BacktestOutput> {
    let output: BacktestOutput =
        serde_json::from_str(json).context("failed to deserialize BacktestOutput from JSON")?;
    if output.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            output.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(output)
}

// ─── CSV ────────────────────────────────────────────────────────────

/// Trade tape as CSV.
///
/// Columns: id, direction, entry_bar, entry_bucket, entry_price, exit_bar,
/// exit_bucket, exit_price, exit_reason, pnl_usd, pnl_pct, duration_bars,
/// duration_secs, fees_usd
pub fn export_trades_csv(trades: &[Trade]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "id",
        "direction",
        "entry_bar",
        "entry_bucket",
        "entry_price",
        "exit_bar",
        "exit_bucket",
        "exit_price",
        "exit_reason",
        "pnl_usd",
        "pnl_pct",
        "duration_bars",
        "duration_secs",
        "fees_usd",
    ])?;

    for t in trades {
        wtr.write_record([
            t.id.0.to_string(),
            format!("{:?}", t.direction),
            t.entry_swap.bar_index.to_string(),
            t.entry_swap.bucket.to_string(),
            format!("{:.8}", t.entry_swap.price),
            t.exit_swap.bar_index.to_string(),
            t.exit_swap.bucket.to_string(),
            format!("{:.8}", t.exit_swap.price),
            format!("{:?}", t.exit_reason),
            format!("{:.8}", t.pnl_usd),
            format!("{:.8}", t.pnl_pct),
            t.duration_bars.to_string(),
            t.duration_secs.to_string(),
            format!("{:.8}", t.total_fees_usd()),
        ])?;
    }

    let bytes = wtr.into_inner().context("flushing trade CSV writer")?;
    String::from_utf8(bytes).context("trade CSV is not valid UTF-8")
}

/// Equity curve as CSV: bucket, bar_index, equity, drawdown_pct.
pub fn export_equity_csv(equity_curve: &[EquityPoint]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(["bucket", "bar_index", "equity", "drawdown_pct"])?;
    for point in equity_curve {
        wtr.write_record([
            point.bucket.to_string(),
            point.bar_index.to_string(),
            format!("{:.8}", point.equity),
            format!("{:.8}", point.drawdown_pct),
        ])?;
    }

    let bytes = wtr.into_inner().context("flushing equity CSV writer")?;
    String::from_utf8(bytes).context("equity CSV is not valid UTF-8")
}

#[cfg(test)]
mod tests {
    use super::*;
    use backcast_core::config::{
        AlgoParams, BacktestInput, Condition, DirectionMode, OrderStyle, RunSettings, ValueConfig,
    };
    use backcast_core::indicators::IndicatorConfig;

    fn empty_output() -> BacktestOutput {
        let input = BacktestInput {
            algo: AlgoParams {
                algo_id: "x".into(),
                version: "1".into(),
                direction: DirectionMode::Long,
                long_entry: Some(Condition {
                    required: vec![IndicatorConfig::PriceLevel {
                        level: 0.0,
                        above: true,
                        resolution_secs: 60,
                    }],
                    optional: vec![],
                    stop_loss: None,
                    take_profit: None,
                    trailing_sl: false,
                }),
                long_exit: None,
                short_entry: None,
                short_exit: None,
                position_size: ValueConfig::rel(1.0),
                starting_capital_usd: 10_000.0,
                cooldown_bars: None,
                order_style: OrderStyle::default(),
            },
            run: RunSettings {
                symbol: "BTC-USD".into(),
                capital_scaler: 1.0,
                start_time: 0,
                end_time: 1_000,
                trades_limit: None,
                close_position_on_exit: false,
                fee_bps: 0.0,
                slippage_bps: 0.0,
            },
        };
        BacktestOutput::empty(&input, 0)
    }

    #[test]
    fn json_round_trip() {
        let out = empty_output();
        let json = export_json(&out).unwrap();
        let back = import_json(&json).unwrap();
        assert_eq!(back.run_id, out.run_id);
        assert!(back.is_empty);
    }

    #[test]
    fn newer_schema_version_is_rejected() {
        let mut out = empty_output();
        out.schema_version = SCHEMA_VERSION + 1;
        let json = export_json(&out).unwrap();
        let err = import_json(&json).unwrap_err();
        assert!(err.to_string().contains("unsupported schema version"));
    }

    #[test]
    fn trades_csv_has_header_only_when_empty() {
        let csv = export_trades_csv(&[]).unwrap();
        assert_eq!(csv.lines().count(), 1);
        assert!(csv.starts_with("id,direction"));
    }

    #[test]
    fn equity_csv_rows_match_points() {
        let points = vec![
            EquityPoint {
                bucket: 0,
                bar_index: 0,
                equity: 10_000.0,
                drawdown_pct: 0.0,
            },
            EquityPoint {
                bucket: 60,
                bar_index: 1,
                equity: 10_100.0,
                drawdown_pct: 0.0,
            },
        ];
        let csv = export_equity_csv(&points).unwrap();
        assert_eq!(csv.lines().count(), 3);
        assert!(csv.contains("10100.00000000"));
    }
}

//! Backtest configuration: strategy parameters, run settings, validation.
//!
//! All types serialize to JSON/TOML. `BacktestInput::run_id()` hashes the
//! canonical JSON of the whole input, so identical inputs share an id.
//!
//! Validation happens before any pipeline stage runs; every failure names
//! the offending field path.

use crate::domain::RunId;
use crate::error::BacktestError;
use crate::indicators::IndicatorConfig;
use serde::{Deserialize, Serialize};

/// Which directions the strategy may trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DirectionMode {
    Long,
    Short,
    Both,
}

/// How entry fills are priced.
///
/// Only `CloseOfSignalBar` is implemented: the event-driven engine fills at
/// the close of the bar whose signal triggered the entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStyle {
    #[default]
    CloseOfSignalBar,
}

/// How a `ValueConfig` magnitude is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValueKind {
    /// Fixed USD amount.
    Abs,
    /// Fraction of entry price (risk levels) or of capital (position size).
    Rel,
    /// `Rel` modulated at trade entry by an indicator value scaled to [0, 1].
    Dyn,
}

/// A configurable magnitude: stop distance, profit target, position size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueConfig {
    pub kind: ValueKind,
    pub value: f64,
    /// Factor indicator for `Dyn`; its value at the entry bar is normalized
    /// from [0, 100] to [0, 1].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_factor: Option<IndicatorConfig>,
    /// Use `1 - factor` instead of `factor`.
    #[serde(default)]
    pub inverted: bool,
}

impl ValueConfig {
    pub fn rel(value: f64) -> Self {
        Self {
            kind: ValueKind::Rel,
            value,
            value_factor: None,
            inverted: false,
        }
    }

    pub fn abs(value: f64) -> Self {
        Self {
            kind: ValueKind::Abs,
            value,
            value_factor: None,
            inverted: false,
        }
    }

    fn validate(&self, field: &str) -> Result<(), BacktestError> {
        if !self.value.is_finite() || self.value <= 0.0 {
            return Err(BacktestError::config(
                format!("{field}.value"),
                "must be a positive finite number",
            ));
        }
        match self.kind {
            ValueKind::Dyn => match &self.value_factor {
                Some(factor) => factor.validate(&format!("{field}.value_factor")),
                None => Err(BacktestError::config(
                    format!("{field}.value_factor"),
                    "required for kind DYN",
                )),
            },
            _ => Ok(()),
        }
    }
}

/// An entry or exit condition over indicator signals.
///
/// Evaluates TRUE iff all `required` signals are TRUE and (`optional` is
/// empty OR at least one `optional` signal is TRUE). Stop-loss, take-profit,
/// and the trailing flag are read from the *entry* condition of a direction;
/// exit conditions may be absent entirely, in which case only price-based
/// exits close trades.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(default)]
    pub required: Vec<IndicatorConfig>,
    #[serde(default)]
    pub optional: Vec<IndicatorConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_loss: Option<ValueConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub take_profit: Option<ValueConfig>,
    #[serde(default)]
    pub trailing_sl: bool,
}

impl Condition {
    fn validate(&self, field: &str) -> Result<(), BacktestError> {
        if self.required.is_empty() && self.optional.is_empty() {
            return Err(BacktestError::config(
                format!("{field}.required"),
                "condition needs at least one indicator",
            ));
        }
        for (i, ind) in self.required.iter().enumerate() {
            ind.validate(&format!("{field}.required[{i}]"))?;
        }
        for (i, ind) in self.optional.iter().enumerate() {
            ind.validate(&format!("{field}.optional[{i}]"))?;
        }
        if let Some(sl) = &self.stop_loss {
            sl.validate(&format!("{field}.stop_loss"))?;
        }
        if let Some(tp) = &self.take_profit {
            tp.validate(&format!("{field}.take_profit"))?;
        }
        if self.trailing_sl && self.stop_loss.is_none() {
            return Err(BacktestError::config(
                format!("{field}.trailing_sl"),
                "requires stop_loss to be set",
            ));
        }
        Ok(())
    }

    /// Every indicator referenced by this condition, including DYN factors.
    pub fn indicators(&self) -> impl Iterator<Item = &IndicatorConfig> {
        self.required
            .iter()
            .chain(self.optional.iter())
            .chain(self.stop_loss.iter().filter_map(|v| v.value_factor.as_ref()))
            .chain(
                self.take_profit
                    .iter()
                    .filter_map(|v| v.value_factor.as_ref()),
            )
    }
}

/// Strategy definition: direction mode, per-direction conditions, sizing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlgoParams {
    pub algo_id: String,
    pub version: String,
    pub direction: DirectionMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_entry: Option<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_exit: Option<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_entry: Option<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_exit: Option<Condition>,
    pub position_size: ValueConfig,
    pub starting_capital_usd: f64,
    /// Bars to wait after a trade closes before the next entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooldown_bars: Option<usize>,
    #[serde(default)]
    pub order_style: OrderStyle,
}

impl AlgoParams {
    /// Every indicator referenced anywhere in the strategy, including the
    /// position-size DYN factor. Duplicates are not removed here; the
    /// pre-calculator deduplicates by cache key.
    pub fn indicators(&self) -> Vec<&IndicatorConfig> {
        let mut out: Vec<&IndicatorConfig> = Vec::new();
        for cond in [
            &self.long_entry,
            &self.long_exit,
            &self.short_entry,
            &self.short_exit,
        ]
        .into_iter()
        .flatten()
        {
            out.extend(cond.indicators());
        }
        if let Some(factor) = &self.position_size.value_factor {
            out.push(factor);
        }
        out
    }
}

/// Per-run settings: symbol, window, costs, limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSettings {
    pub symbol: String,
    /// Multiplier applied to the starting capital.
    pub capital_scaler: f64,
    /// Window in seconds since epoch, `[start_time, end_time]`.
    pub start_time: i64,
    pub end_time: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trades_limit: Option<usize>,
    #[serde(default)]
    pub close_position_on_exit: bool,
    /// Fee per leg in basis points of notional.
    #[serde(default)]
    pub fee_bps: f64,
    /// Slippage per leg in basis points of price.
    #[serde(default)]
    pub slippage_bps: f64,
}

/// The complete input to `run_backtest`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestInput {
    pub algo: AlgoParams,
    pub run: RunSettings,
}

impl BacktestInput {
    /// Content-addressable identity of this input.
    pub fn run_id(&self) -> RunId {
        let json = serde_json::to_string(self).expect("BacktestInput serialization failed");
        RunId::from_bytes(json.as_bytes())
    }

    /// Validate the whole input. First failure wins; every error names the
    /// offending field path.
    pub fn validate(&self) -> Result<(), BacktestError> {
        let algo = &self.algo;
        if algo.algo_id.is_empty() {
            return Err(BacktestError::config("algo.algo_id", "must be non-empty"));
        }
        if algo.version.is_empty() {
            return Err(BacktestError::config("algo.version", "must be non-empty"));
        }

        match algo.direction {
            DirectionMode::Long => {
                if algo.long_entry.is_none() {
                    return Err(BacktestError::config(
                        "algo.long_entry",
                        "required for direction LONG",
                    ));
                }
            }
            DirectionMode::Short => {
                if algo.short_entry.is_none() {
                    return Err(BacktestError::config(
                        "algo.short_entry",
                        "required for direction SHORT",
                    ));
                }
            }
            DirectionMode::Both => {
                if algo.long_entry.is_none() || algo.short_entry.is_none() {
                    return Err(BacktestError::config(
                        "algo.long_entry",
                        "both entries required for direction BOTH",
                    ));
                }
            }
        }

        for (cond, field) in [
            (&algo.long_entry, "algo.long_entry"),
            (&algo.long_exit, "algo.long_exit"),
            (&algo.short_entry, "algo.short_entry"),
            (&algo.short_exit, "algo.short_exit"),
        ] {
            if let Some(c) = cond {
                c.validate(field)?;
            }
        }

        algo.position_size.validate("algo.position_size")?;
        if !algo.starting_capital_usd.is_finite() || algo.starting_capital_usd <= 0.0 {
            return Err(BacktestError::config(
                "algo.starting_capital_usd",
                "must be positive",
            ));
        }

        let run = &self.run;
        if run.symbol.is_empty() {
            return Err(BacktestError::config("run.symbol", "must be non-empty"));
        }
        if !run.capital_scaler.is_finite() || run.capital_scaler <= 0.0 {
            return Err(BacktestError::config(
                "run.capital_scaler",
                "must be positive",
            ));
        }
        if run.end_time <= run.start_time {
            return Err(BacktestError::config(
                "run.end_time",
                "must be after start_time",
            ));
        }
        for (bps, field) in [(run.fee_bps, "run.fee_bps"), (run.slippage_bps, "run.slippage_bps")] {
            if !bps.is_finite() || !(0.0..10_000.0).contains(&bps) {
                return Err(BacktestError::config(field, "must be within [0, 10000)"));
            }
        }

        Ok(())
    }
}

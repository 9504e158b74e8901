//! Error taxonomy for the backtest pipeline.
//!
//! Every error is fatal to the run — there is no partial result. Each variant
//! carries the context the host needs to surface a useful message: validation
//! errors name the offending field path, aggregation errors the resolutions,
//! indicator failures the cache key.
//!
//! Empty data (no candles in the requested range) is NOT an error; the runner
//! returns a well-formed empty output instead.

use thiserror::Error;

/// All the ways a backtest run can fail.
#[derive(Debug, Error)]
pub enum BacktestError {
    /// Configuration rejected before any stage runs.
    #[error("invalid config at `{field}`: {reason}")]
    ConfigInvalid { field: String, reason: String },

    /// A candle input row could not be parsed or violated the OHLC invariant.
    #[error("invalid candle data at line {line}: {reason}")]
    CandleFormatInvalid { line: usize, reason: String },

    /// A resolution finer than the loaded base candles was requested.
    #[error("resolution {requested_secs}s unavailable (base is {base_secs}s)")]
    ResolutionUnavailable { requested_secs: i64, base_secs: i64 },

    /// A requested resolution is not an integer multiple of the base.
    #[error("resolution {requested_secs}s does not aggregate evenly from base {base_secs}s")]
    UnalignedAggregation { requested_secs: i64, base_secs: i64 },

    /// An indicator evaluator returned an error or produced malformed output.
    #[error("indicator {cache_key} failed to evaluate: {reason}")]
    IndicatorEvaluationFailed { cache_key: String, reason: String },

    /// A NaN or infinity surfaced mid-simulation.
    #[error("numeric failure during simulation: {context}")]
    NumericInvalid { context: String },

    /// An internal invariant was violated — a bug, not a user error.
    #[error("internal invariant violated: {context}")]
    InternalInvariantViolated { context: String },
}

impl BacktestError {
    /// Stable machine-readable kind tag for hosts that dispatch on error class.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConfigInvalid { .. } => "CONFIG_INVALID",
            Self::CandleFormatInvalid { .. } => "CANDLE_FORMAT_INVALID",
            Self::ResolutionUnavailable { .. } => "RESOLUTION_UNAVAILABLE",
            Self::UnalignedAggregation { .. } => "UNALIGNED_AGGREGATION",
            Self::IndicatorEvaluationFailed { .. } => "INDICATOR_EVALUATION_FAILED",
            Self::NumericInvalid { .. } => "NUMERIC_INVALID",
            Self::InternalInvariantViolated { .. } => "INTERNAL_INVARIANT_VIOLATED",
        }
    }

    /// Shorthand for config validation failures.
    pub fn config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigInvalid {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for invariant violations.
    pub fn invariant(context: impl Into<String>) -> Self {
        Self::InternalInvariantViolated {
            context: context.into(),
        }
    }
}

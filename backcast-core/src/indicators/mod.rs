//! Indicator configurations and their pure evaluators.
//!
//! An indicator is identified by its canonical JSON serialization: two
//! configs with the same serialization share one `CacheKey` and are
//! evaluated once. Evaluation is pure — chart points in, a value series plus
//! a boolean signal series out — and happens at the indicator's native
//! resolution against the matching mip-map level.
//!
//! The numeric value series backs DYN value-config modulation (the factor
//! sampled at trade entry); the signal series feeds the resampler and event
//! extractor.

pub mod ema;
pub mod roc;
pub mod rsi;
pub mod sma;

pub use ema::ema_of_series;
pub use roc::roc_of_series;
pub use rsi::rsi_of_series;
pub use sma::sma_of_series;

use crate::domain::{CacheKey, Candle};
use crate::error::BacktestError;
use crate::signal::bits::BitSeries;
use serde::{Deserialize, Serialize};

/// The column view an indicator evaluates over, extracted once per mip-map
/// level.
#[derive(Debug, Clone, Default)]
pub struct ChartPoints {
    pub buckets: Vec<i64>,
    pub closes: Vec<f64>,
    pub volumes: Vec<f64>,
}

impl ChartPoints {
    pub fn from_candles(candles: &[Candle]) -> Self {
        Self {
            buckets: candles.iter().map(|c| c.bucket).collect(),
            closes: candles.iter().map(|c| c.close).collect(),
            volumes: candles.iter().map(|c| c.volume).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.closes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }
}

/// Result of evaluating one indicator: per-bar numeric values and the
/// boolean signal derived from them. Both have the chart's length.
#[derive(Debug, Clone)]
pub struct IndicatorSeries {
    pub values: Vec<f64>,
    pub signals: BitSeries,
}

/// Serializable indicator configuration.
///
/// Identity is structural: `cache_key()` hashes the canonical JSON, so two
/// configs with identical parameters deduplicate in the signal cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IndicatorConfig {
    /// Fast EMA above slow EMA (below, when `bearish`). Value: fast − slow
    /// spread.
    EmaCross {
        fast_period: usize,
        slow_period: usize,
        resolution_secs: i64,
        #[serde(default)]
        bearish: bool,
    },

    /// Fast SMA above slow SMA (below, when `bearish`). Value: fast − slow
    /// spread.
    SmaCross {
        fast_period: usize,
        slow_period: usize,
        resolution_secs: i64,
        #[serde(default)]
        bearish: bool,
    },

    /// RSI relative to a threshold. Value: raw RSI in [0, 100] — the
    /// canonical DYN value factor.
    RsiLevel {
        period: usize,
        threshold: f64,
        /// True: signal when RSI > threshold. False: signal when RSI < threshold.
        above: bool,
        resolution_secs: i64,
    },

    /// Rate-of-change above a percent threshold. Value: raw ROC percent.
    RocMomentum {
        period: usize,
        threshold_pct: f64,
        resolution_secs: i64,
    },

    /// Close relative to a fixed price level. Warmup-free. Value: raw close.
    PriceLevel {
        level: f64,
        /// True: signal when close > level. False: signal when close < level.
        above: bool,
        resolution_secs: i64,
    },
}

impl IndicatorConfig {
    /// Native resolution in seconds.
    pub fn resolution_secs(&self) -> i64 {
        match *self {
            Self::EmaCross { resolution_secs, .. }
            | Self::SmaCross { resolution_secs, .. }
            | Self::RsiLevel { resolution_secs, .. }
            | Self::RocMomentum { resolution_secs, .. }
            | Self::PriceLevel { resolution_secs, .. } => resolution_secs,
        }
    }

    /// Bars (at native resolution) before the first valid output.
    pub fn warmup(&self) -> usize {
        match *self {
            Self::EmaCross { slow_period, .. } | Self::SmaCross { slow_period, .. } => {
                slow_period.saturating_sub(1)
            }
            Self::RsiLevel { period, .. } | Self::RocMomentum { period, .. } => period,
            Self::PriceLevel { .. } => 0,
        }
    }

    /// Deduplication identity: BLAKE3 over canonical JSON.
    pub fn cache_key(&self) -> CacheKey {
        let json = serde_json::to_string(self).expect("IndicatorConfig serialization failed");
        CacheKey::from_bytes(json.as_bytes())
    }

    /// Short human-readable tag used in error contexts.
    pub fn label(&self) -> String {
        match *self {
            Self::EmaCross {
                fast_period,
                slow_period,
                ..
            } => format!("ema_cross_{fast_period}_{slow_period}"),
            Self::SmaCross {
                fast_period,
                slow_period,
                ..
            } => format!("sma_cross_{fast_period}_{slow_period}"),
            Self::RsiLevel {
                period, threshold, ..
            } => format!("rsi_{period}_at_{threshold}"),
            Self::RocMomentum {
                period,
                threshold_pct,
                ..
            } => format!("roc_{period}_at_{threshold_pct}"),
            Self::PriceLevel { level, above, .. } => {
                let side = if above { "above" } else { "below" };
                format!("price_{side}_{level}")
            }
        }
    }

    /// Parameter sanity, reported with the given config field path.
    pub fn validate(&self, field: &str) -> Result<(), BacktestError> {
        if self.resolution_secs() <= 0 {
            return Err(BacktestError::config(
                format!("{field}.resolution_secs"),
                "must be positive",
            ));
        }
        match *self {
            Self::EmaCross {
                fast_period,
                slow_period,
                ..
            }
            | Self::SmaCross {
                fast_period,
                slow_period,
                ..
            } => {
                if fast_period == 0 || slow_period == 0 {
                    return Err(BacktestError::config(
                        format!("{field}.fast_period"),
                        "periods must be >= 1",
                    ));
                }
                if fast_period >= slow_period {
                    return Err(BacktestError::config(
                        format!("{field}.fast_period"),
                        "fast period must be shorter than slow period",
                    ));
                }
            }
            Self::RsiLevel {
                period, threshold, ..
            } => {
                if period == 0 {
                    return Err(BacktestError::config(
                        format!("{field}.period"),
                        "must be >= 1",
                    ));
                }
                if !(0.0..=100.0).contains(&threshold) {
                    return Err(BacktestError::config(
                        format!("{field}.threshold"),
                        "must be within [0, 100]",
                    ));
                }
            }
            Self::RocMomentum { period, .. } => {
                if period == 0 {
                    return Err(BacktestError::config(
                        format!("{field}.period"),
                        "must be >= 1",
                    ));
                }
            }
            Self::PriceLevel { level, .. } => {
                if !level.is_finite() || level < 0.0 {
                    return Err(BacktestError::config(
                        format!("{field}.level"),
                        "must be a non-negative finite number",
                    ));
                }
            }
        }
        Ok(())
    }

    /// Evaluate against chart points at the indicator's native resolution.
    pub fn evaluate(&self, chart: &ChartPoints) -> Result<IndicatorSeries, BacktestError> {
        let n = chart.len();
        let (values, bools) = match *self {
            Self::EmaCross {
                fast_period,
                slow_period,
                bearish,
                ..
            } => {
                let fast = ema_of_series(&chart.closes, fast_period);
                let slow = ema_of_series(&chart.closes, slow_period);
                spread_signal(&fast, &slow, bearish)
            }
            Self::SmaCross {
                fast_period,
                slow_period,
                bearish,
                ..
            } => {
                let fast = sma_of_series(&chart.closes, fast_period);
                let slow = sma_of_series(&chart.closes, slow_period);
                spread_signal(&fast, &slow, bearish)
            }
            Self::RsiLevel {
                period,
                threshold,
                above,
                ..
            } => {
                let rsi = rsi_of_series(&chart.closes, period);
                let bools = threshold_signal(&rsi, threshold, above);
                (rsi, bools)
            }
            Self::RocMomentum {
                period,
                threshold_pct,
                ..
            } => {
                let roc = roc_of_series(&chart.closes, period);
                let bools = threshold_signal(&roc, threshold_pct, true);
                (roc, bools)
            }
            Self::PriceLevel { level, above, .. } => {
                let bools = threshold_signal(&chart.closes, level, above);
                (chart.closes.clone(), bools)
            }
        };

        if values.len() != n || bools.len() != n {
            return Err(BacktestError::IndicatorEvaluationFailed {
                cache_key: self.cache_key().to_string(),
                reason: format!(
                    "evaluator produced {} values for {} chart points",
                    values.len(),
                    n
                ),
            });
        }

        Ok(IndicatorSeries {
            values,
            signals: BitSeries::from_bools(&bools),
        })
    }
}

/// Signal: fast above slow (below when `bearish`) where both are valid.
/// Value: the spread.
fn spread_signal(fast: &[f64], slow: &[f64], bearish: bool) -> (Vec<f64>, Vec<bool>) {
    let values: Vec<f64> = fast.iter().zip(slow).map(|(f, s)| f - s).collect();
    let bools: Vec<bool> = fast
        .iter()
        .zip(slow)
        .map(|(f, s)| {
            if f.is_nan() || s.is_nan() {
                false
            } else if bearish {
                f < s
            } else {
                f > s
            }
        })
        .collect();
    (values, bools)
}

/// Signal: value strictly beyond a threshold in the configured direction.
/// NaN never signals.
fn threshold_signal(values: &[f64], threshold: f64, above: bool) -> Vec<bool> {
    values
        .iter()
        .map(|v| {
            if v.is_nan() {
                false
            } else if above {
                *v > threshold
            } else {
                *v < threshold
            }
        })
        .collect()
}

// ── Test helpers ─────────────────────────────────────────────────────

/// Create equispaced candles from close prices for testing.
///
/// Generates plausible OHLV: open = prev close (or close for the first bar),
/// high = max(open, close) + 1.0, low = min(open, close) - 1.0.
#[cfg(test)]
pub fn make_candles(closes: &[f64], resolution_secs: i64) -> Vec<Candle> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Candle {
                bucket: i as i64 * resolution_secs,
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;

#[cfg(test)]
mod tests {
    use super::*;

    fn ema_cross_9_21() -> IndicatorConfig {
        IndicatorConfig::EmaCross {
            fast_period: 9,
            slow_period: 21,
            resolution_secs: 60,
            bearish: false,
        }
    }

    #[test]
    fn cache_key_is_structural() {
        let a = ema_cross_9_21();
        let b = ema_cross_9_21();
        assert_eq!(a.cache_key(), b.cache_key());

        let c = IndicatorConfig::EmaCross {
            fast_period: 12,
            slow_period: 26,
            resolution_secs: 60,
            bearish: false,
        };
        assert_ne!(a.cache_key(), c.cache_key());
    }

    #[test]
    fn cache_key_differs_across_resolutions() {
        let a = ema_cross_9_21();
        let b = IndicatorConfig::EmaCross {
            fast_period: 9,
            slow_period: 21,
            resolution_secs: 300,
            bearish: false,
        };
        assert_ne!(a.cache_key(), b.cache_key());
    }

    #[test]
    fn warmup_follows_slowest_component() {
        assert_eq!(ema_cross_9_21().warmup(), 20);
        let rsi = IndicatorConfig::RsiLevel {
            period: 14,
            threshold: 70.0,
            above: true,
            resolution_secs: 60,
        };
        assert_eq!(rsi.warmup(), 14);
    }

    #[test]
    fn ema_cross_signals_on_uptrend() {
        // Monotone rising closes: fast EMA ends above slow EMA.
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        let chart = ChartPoints::from_candles(&make_candles(&closes, 60));
        let cfg = IndicatorConfig::EmaCross {
            fast_period: 3,
            slow_period: 9,
            resolution_secs: 60,
            bearish: false,
        };
        let series = cfg.evaluate(&chart).unwrap();
        assert_eq!(series.values.len(), 40);
        assert_eq!(series.signals.len(), 40);
        assert!(!series.signals.get(0)); // warmup region
        assert!(series.signals.get(39));
        assert!(series.values[39] > 0.0);
    }

    #[test]
    fn rsi_level_below_signals_in_downtrend() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 - i as f64 * 0.5).collect();
        let chart = ChartPoints::from_candles(&make_candles(&closes, 60));
        let cfg = IndicatorConfig::RsiLevel {
            period: 5,
            threshold: 30.0,
            above: false,
            resolution_secs: 60,
        };
        let series = cfg.evaluate(&chart).unwrap();
        assert!(series.signals.get(29));
        assert!(series.values[29] < 30.0);
    }

    #[test]
    fn validate_rejects_inverted_periods() {
        let cfg = IndicatorConfig::EmaCross {
            fast_period: 21,
            slow_period: 9,
            resolution_secs: 60,
            bearish: false,
        };
        let err = cfg.validate("algo.long_entry.required[0]").unwrap_err();
        assert!(err.to_string().contains("fast period"));
    }

    #[test]
    fn validate_rejects_zero_resolution() {
        let cfg = IndicatorConfig::RocMomentum {
            period: 10,
            threshold_pct: 1.0,
            resolution_secs: 0,
        };
        assert!(cfg.validate("x").is_err());
    }

    #[test]
    fn config_serialization_roundtrip() {
        let cfg = ema_cross_9_21();
        let json = serde_json::to_string(&cfg).unwrap();
        assert!(json.contains("EMA_CROSS"));
        let deser: IndicatorConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg, deser);
    }

    #[test]
    fn evaluate_on_empty_chart() {
        let chart = ChartPoints::default();
        let series = ema_cross_9_21().evaluate(&chart).unwrap();
        assert!(series.values.is_empty());
        assert!(series.signals.is_empty());
    }
}

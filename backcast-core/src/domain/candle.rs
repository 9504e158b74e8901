//! Candle — the fundamental market data unit.

use serde::{Deserialize, Serialize};

/// OHLCV candle at a fixed resolution.
///
/// `bucket` is the candle's start timestamp in seconds since epoch. A loaded
/// series is strictly ascending in `bucket` and equispaced at the base
/// resolution; the loader enforces both.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub bucket: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// OHLC sanity check: `low <= min(open, close) <= max(open, close) <= high`.
    pub fn is_sane(&self) -> bool {
        if self.open.is_nan() || self.high.is_nan() || self.low.is_nan() || self.close.is_nan() {
            return false;
        }
        self.low <= self.open.min(self.close)
            && self.open.max(self.close) <= self.high
            && self.open > 0.0
            && self.close > 0.0
    }

    /// True if the candle's range touches `price`.
    pub fn spans(&self, price: f64) -> bool {
        self.low <= price && price <= self.high
    }
}

/// Detect the base resolution of a candle series from consecutive buckets.
///
/// Returns `None` for series shorter than two candles (resolution is
/// undefined) or when the series is not strictly ascending and equispaced.
pub fn detect_resolution(candles: &[Candle]) -> Option<i64> {
    if candles.len() < 2 {
        return None;
    }
    let step = candles[1].bucket - candles[0].bucket;
    if step <= 0 {
        return None;
    }
    for pair in candles.windows(2) {
        if pair[1].bucket - pair[0].bucket != step {
            return None;
        }
    }
    Some(step)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_candle() -> Candle {
        Candle {
            bucket: 1_700_000_000,
            open: 100.0,
            high: 105.0,
            low: 98.0,
            close: 103.0,
            volume: 50_000.0,
        }
    }

    #[test]
    fn candle_is_sane() {
        assert!(sample_candle().is_sane());
    }

    #[test]
    fn candle_detects_inverted_range() {
        let mut c = sample_candle();
        c.high = 97.0; // below low
        assert!(!c.is_sane());
    }

    #[test]
    fn candle_detects_nan() {
        let mut c = sample_candle();
        c.close = f64::NAN;
        assert!(!c.is_sane());
    }

    #[test]
    fn spans_checks_inclusive_range() {
        let c = sample_candle();
        assert!(c.spans(98.0));
        assert!(c.spans(105.0));
        assert!(c.spans(100.0));
        assert!(!c.spans(97.9));
        assert!(!c.spans(105.1));
    }

    #[test]
    fn detect_resolution_equispaced() {
        let candles: Vec<Candle> = (0..5)
            .map(|i| Candle {
                bucket: i * 60,
                ..sample_candle()
            })
            .collect();
        assert_eq!(detect_resolution(&candles), Some(60));
    }

    #[test]
    fn detect_resolution_rejects_gaps() {
        let mut candles: Vec<Candle> = (0..5)
            .map(|i| Candle {
                bucket: i * 60,
                ..sample_candle()
            })
            .collect();
        candles[3].bucket += 60; // gap
        assert_eq!(detect_resolution(&candles), None);
    }

    #[test]
    fn detect_resolution_too_short() {
        assert_eq!(detect_resolution(&[sample_candle()]), None);
        assert_eq!(detect_resolution(&[]), None);
    }

    #[test]
    fn candle_serialization_roundtrip() {
        let c = sample_candle();
        let json = serde_json::to_string(&c).unwrap();
        let deser: Candle = serde_json::from_str(&json).unwrap();
        assert_eq!(c, deser);
    }
}

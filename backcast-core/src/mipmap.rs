//! Mip-map — the pyramid of candle resolutions aggregated up from the base.
//!
//! Each non-base level folds `k` consecutive base candles into one:
//! open = first.open, close = last.close, high = max(high), low = min(low),
//! volume = sum(volume). `k` must divide the requested resolution exactly.
//!
//! Requesting a resolution finer than the base fails with
//! `ResolutionUnavailable`; a non-integer aggregation factor fails with
//! `UnalignedAggregation`. Expected memory overhead across 3–5 levels is
//! roughly a third of the base; above ~50% a warning is recorded.

use crate::domain::Candle;
use crate::error::BacktestError;
use std::collections::BTreeMap;

/// Memory overhead threshold (fraction of base candle count) above which a
/// warning is recorded.
const MEMORY_OVERHEAD_WARN_THRESHOLD: f64 = 0.50;

/// Candle pyramid, one level per requested resolution plus the base.
#[derive(Debug, Clone)]
pub struct MipMap {
    base_resolution_secs: i64,
    /// Resolution (seconds) → candles at that resolution. BTreeMap keeps
    /// level iteration order deterministic.
    levels: BTreeMap<i64, Vec<Candle>>,
    warnings: Vec<String>,
}

impl MipMap {
    /// Build a pyramid over `base` candles for the given coarser resolutions.
    ///
    /// The base level is always present. Duplicate requests collapse; a
    /// request equal to the base resolution is satisfied by the base level.
    pub fn build(
        base: &[Candle],
        base_resolution_secs: i64,
        requested: &[i64],
    ) -> Result<Self, BacktestError> {
        if base_resolution_secs <= 0 {
            return Err(BacktestError::invariant(format!(
                "non-positive base resolution {base_resolution_secs}"
            )));
        }

        let mut levels = BTreeMap::new();
        levels.insert(base_resolution_secs, base.to_vec());

        for &res in requested {
            if res == base_resolution_secs || levels.contains_key(&res) {
                continue;
            }
            if res < base_resolution_secs {
                return Err(BacktestError::ResolutionUnavailable {
                    requested_secs: res,
                    base_secs: base_resolution_secs,
                });
            }
            if res % base_resolution_secs != 0 {
                return Err(BacktestError::UnalignedAggregation {
                    requested_secs: res,
                    base_secs: base_resolution_secs,
                });
            }
            let factor = (res / base_resolution_secs) as usize;
            levels.insert(res, fold_candles(base, factor));
        }

        let mut warnings = Vec::new();
        let base_len = base.len();
        if base_len > 0 {
            let overhead: usize = levels
                .iter()
                .filter(|(&res, _)| res != base_resolution_secs)
                .map(|(_, candles)| candles.len())
                .sum();
            let ratio = overhead as f64 / base_len as f64;
            if ratio > MEMORY_OVERHEAD_WARN_THRESHOLD {
                warnings.push(format!(
                    "mip-map overhead {:.0}% of base level exceeds {:.0}% threshold ({} levels)",
                    ratio * 100.0,
                    MEMORY_OVERHEAD_WARN_THRESHOLD * 100.0,
                    levels.len() - 1
                ));
            }
        }

        Ok(Self {
            base_resolution_secs,
            levels,
            warnings,
        })
    }

    pub fn base_resolution_secs(&self) -> i64 {
        self.base_resolution_secs
    }

    /// Candles at exactly `resolution_secs`, if that level exists.
    pub fn level(&self, resolution_secs: i64) -> Option<&[Candle]> {
        self.levels.get(&resolution_secs).map(|v| v.as_slice())
    }

    /// The level at `resolution_secs`, or the nearest coarser one.
    ///
    /// Returns the resolution actually served alongside the candles, so the
    /// caller can report inexact matches.
    pub fn level_or_coarser(&self, resolution_secs: i64) -> Option<(i64, &[Candle])> {
        if let Some(candles) = self.levels.get(&resolution_secs) {
            return Some((resolution_secs, candles.as_slice()));
        }
        self.levels
            .range(resolution_secs..)
            .next()
            .map(|(&res, candles)| (res, candles.as_slice()))
    }

    /// All resolutions present, ascending.
    pub fn resolutions(&self) -> Vec<i64> {
        self.levels.keys().copied().collect()
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }
}

/// Fold `factor` consecutive candles into one. The final window may be
/// partial; it aggregates whatever base candles remain.
fn fold_candles(base: &[Candle], factor: usize) -> Vec<Candle> {
    base.chunks(factor)
        .map(|chunk| {
            let first = &chunk[0];
            let last = &chunk[chunk.len() - 1];
            Candle {
                bucket: first.bucket,
                open: first.open,
                close: last.close,
                high: chunk.iter().map(|c| c.high).fold(f64::MIN, f64::max),
                low: chunk.iter().map(|c| c.low).fold(f64::MAX, f64::min),
                volume: chunk.iter().map(|c| c.volume).sum(),
            }
        })
        .collect()
}

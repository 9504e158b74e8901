//! Indicator pre-calculation — Stage 4 of the pipeline.
//!
//! Each unique indicator (by cache key) is evaluated exactly once at its
//! native resolution against the matching mip-map level. Results land in the
//! `SignalCache` with the warmup prefix forced FALSE.
//!
//! Evaluation is embarrassingly parallel: distinct cache keys share no
//! mutable state, so the work fans out over rayon. Determinism is preserved
//! by fanning out over the *sorted* key list and merging results in that
//! same order.

use crate::domain::CacheKey;
use crate::error::BacktestError;
use crate::indicators::{ChartPoints, IndicatorConfig, IndicatorSeries};
use crate::mipmap::MipMap;
use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap};

/// One pre-calculated indicator: its series at the resolution it was
/// actually served, plus alignment metadata for the resampler.
#[derive(Debug, Clone)]
pub struct PrecalcSeries {
    /// Resolution the indicator was evaluated at. Differs from the config's
    /// native resolution only when the exact level was absent and the
    /// nearest coarser one was served.
    pub resolution_secs: i64,
    /// Bucket of the first candle of the evaluated level.
    pub start_bucket: i64,
    /// Leading positions forced FALSE.
    pub warmup: usize,
    pub series: IndicatorSeries,
}

/// Map from indicator cache key to its pre-calculated series.
#[derive(Debug, Default)]
pub struct SignalCache {
    entries: HashMap<CacheKey, PrecalcSeries>,
    /// Human-readable notes, e.g. inexact resolution matches.
    notes: Vec<String>,
}

impl SignalCache {
    pub fn get(&self, key: &CacheKey) -> Option<&PrecalcSeries> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    /// Cache keys in sorted order.
    pub fn keys_sorted(&self) -> Vec<&CacheKey> {
        let mut keys: Vec<&CacheKey> = self.entries.keys().collect();
        keys.sort();
        keys
    }
}

/// Evaluate every unique indicator and build the signal cache.
pub fn precalculate(
    mipmap: &MipMap,
    indicators: &[&IndicatorConfig],
) -> Result<SignalCache, BacktestError> {
    // Deduplicate by cache key; BTreeMap gives the deterministic fan-out order.
    let unique: BTreeMap<CacheKey, &IndicatorConfig> = indicators
        .iter()
        .map(|ind| (ind.cache_key(), *ind))
        .collect();

    let results: Vec<Result<(CacheKey, PrecalcSeries, Option<String>), BacktestError>> = unique
        .par_iter()
        .map(|(key, ind)| evaluate_one(mipmap, key, ind))
        .collect();

    let mut cache = SignalCache::default();
    for result in results {
        let (key, series, note) = result?;
        if let Some(note) = note {
            cache.notes.push(note);
        }
        cache.entries.insert(key, series);
    }
    // Notes arrive in sorted-key order from the fan-out; keep them as-is.
    Ok(cache)
}

fn evaluate_one(
    mipmap: &MipMap,
    key: &CacheKey,
    ind: &IndicatorConfig,
) -> Result<(CacheKey, PrecalcSeries, Option<String>), BacktestError> {
    let native = ind.resolution_secs();
    if native < mipmap.base_resolution_secs() {
        return Err(BacktestError::ResolutionUnavailable {
            requested_secs: native,
            base_secs: mipmap.base_resolution_secs(),
        });
    }
    let (served, candles) =
        mipmap
            .level_or_coarser(native)
            .ok_or(BacktestError::ResolutionUnavailable {
                requested_secs: native,
                base_secs: mipmap.base_resolution_secs(),
            })?;

    let note = (served != native).then(|| {
        format!(
            "indicator {} served at {served}s instead of native {native}s",
            ind.label()
        )
    });

    let chart = ChartPoints::from_candles(candles);
    let mut series = ind.evaluate(&chart)?;
    series.signals.clear_prefix(ind.warmup());

    Ok((
        key.clone(),
        PrecalcSeries {
            resolution_secs: served,
            start_bucket: candles.first().map(|c| c.bucket).unwrap_or(0),
            warmup: ind.warmup(),
            series,
        },
        note,
    ))
}

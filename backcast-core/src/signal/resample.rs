//! Resampler — Stage 5: align every indicator to the simulation resolution.
//!
//! Sample-and-hold is the sole semantics: at simulation timestamp `t`, the
//! resampled value is the source value at the greatest source timestamp
//! `<= t` (FALSE / NaN before the source starts). No interpolation.
//!
//! The simulation resolution is the minimum indicator resolution, floored at
//! the base-candle resolution and never below 60 seconds.

use crate::domain::CacheKey;
use crate::signal::bits::BitSeries;
use crate::signal::precalc::SignalCache;
use std::collections::HashMap;

/// Hard floor on the simulation resolution in seconds.
pub const MIN_SIM_RESOLUTION_SECS: i64 = 60;

/// Pick the simulation resolution for a run.
///
/// Minimum over the indicators' native resolutions, floored at the base
/// candle resolution and at `MIN_SIM_RESOLUTION_SECS`. With no indicators
/// the floor itself is used.
pub fn simulation_resolution(indicator_resolutions: &[i64], base_resolution_secs: i64) -> i64 {
    let floor = base_resolution_secs.max(MIN_SIM_RESOLUTION_SECS);
    indicator_resolutions
        .iter()
        .copied()
        .min()
        .unwrap_or(floor)
        .max(floor)
}

/// One indicator aligned to the simulation timeline.
#[derive(Debug, Clone)]
pub struct ResampledSeries {
    pub signals: BitSeries,
    pub values: Vec<f64>,
}

/// Every indicator's signals and values at the simulation resolution.
#[derive(Debug, Default)]
pub struct ResampledSignalCache {
    entries: HashMap<CacheKey, ResampledSeries>,
    sim_resolution_secs: i64,
    warmup_bars: usize,
}

impl ResampledSignalCache {
    pub fn get(&self, key: &CacheKey) -> Option<&ResampledSeries> {
        self.entries.get(key)
    }

    /// Signal of `key` at simulation bar `bar`. FALSE when the key is
    /// unknown or the bar is out of range.
    pub fn signal(&self, key: &CacheKey, bar: usize) -> bool {
        self.entries
            .get(key)
            .map(|s| bar < s.signals.len() && s.signals.get(bar))
            .unwrap_or(false)
    }

    /// Value of `key` at simulation bar `bar`. NaN when unknown.
    pub fn value(&self, key: &CacheKey, bar: usize) -> f64 {
        self.entries
            .get(key)
            .and_then(|s| s.values.get(bar).copied())
            .unwrap_or(f64::NAN)
    }

    pub fn sim_resolution_secs(&self) -> i64 {
        self.sim_resolution_secs
    }

    /// Simulation bars during which entries are suppressed.
    pub fn warmup_bars(&self) -> usize {
        self.warmup_bars
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Forward-fill every cached indicator onto the simulation timestamp vector.
///
/// `warmup_secs` is the run-wide warmup (max over indicators of
/// warmup × resolution); it converts to `warmup_bars` by ceiling division.
pub fn resample(
    cache: &SignalCache,
    sim_buckets: &[i64],
    sim_resolution_secs: i64,
    warmup_secs: i64,
) -> ResampledSignalCache {
    let mut entries = HashMap::new();

    for key in cache.keys_sorted() {
        let source = cache.get(key).expect("key from keys_sorted");
        let n = source.series.values.len();
        let r = source.resolution_secs;
        let t0 = source.start_bucket;

        let mut signals = BitSeries::zeros(sim_buckets.len());
        let mut values = vec![f64::NAN; sim_buckets.len()];

        for (i, &t) in sim_buckets.iter().enumerate() {
            // Largest k with t0 + k*r <= t.
            let k = (t - t0).div_euclid(r);
            if k < 0 || n == 0 {
                continue; // before the source starts: FALSE / NaN
            }
            let k = (k as usize).min(n - 1);
            if source.series.signals.get(k) {
                signals.set(i, true);
            }
            values[i] = source.series.values[k];
        }

        entries.insert(
            key.clone(),
            ResampledSeries { signals, values },
        );
    }

    let warmup_bars = if warmup_secs <= 0 {
        0
    } else {
        warmup_secs.div_euclid(sim_resolution_secs) as usize
            + usize::from(warmup_secs % sim_resolution_secs != 0)
    };

    ResampledSignalCache {
        entries,
        sim_resolution_secs,
        warmup_bars,
    }
}

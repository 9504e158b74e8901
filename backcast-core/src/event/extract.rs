//! Event extraction — Stage 6: boolean signal sequences to a typed event heap.
//!
//! For each configured condition, the condition bit (`required` AND +
//! `optional` OR) is evaluated over all simulation bars. Edges become
//! events:
//! - `SignalRising` / `SignalFalling` per unique indicator,
//! - `ConditionMet` on the bit's FALSE→TRUE transition,
//! - `ConditionUnmet` on TRUE→FALSE.
//!
//! Emission walks bars in ascending order and, within a bar, conditions and
//! their indicators in configuration order. IDs are allocated in emission
//! order, which makes the heap's tie-break deterministic. Events on bars
//! before the trading start (the pre-warming region) are discarded.

use super::{ConditionKind, Event, EventHeap, EventKind};
use crate::config::Condition;
use crate::domain::{CacheKey, IdGen};
use crate::signal::ResampledSignalCache;

/// The condition bit at one simulation bar.
pub fn evaluate_condition(
    condition: &Condition,
    resampled: &ResampledSignalCache,
    bar: usize,
) -> bool {
    let required_ok = condition
        .required
        .iter()
        .all(|ind| resampled.signal(&ind.cache_key(), bar));
    if !required_ok {
        return false;
    }
    condition.optional.is_empty()
        || condition
            .optional
            .iter()
            .any(|ind| resampled.signal(&ind.cache_key(), bar))
}

/// Extract all events for the configured conditions into a heap.
///
/// `conditions` pairs each condition kind with its definition, in the fixed
/// order the caller wants ties broken (entry kinds before exit kinds, longs
/// before shorts, per `ConditionKind::ALL`).
pub fn extract_events(
    conditions: &[(ConditionKind, &Condition)],
    resampled: &ResampledSignalCache,
    sim_buckets: &[i64],
    trading_start_index: usize,
    id_gen: &mut IdGen,
) -> EventHeap {
    let n = sim_buckets.len();
    let mut heap = EventHeap::new();

    // Unique indicators in first-reference order, for crossing events.
    let mut crossing_indicators: Vec<(ConditionKind, CacheKey)> = Vec::new();
    let mut seen: Vec<CacheKey> = Vec::new();
    for (kind, cond) in conditions {
        for ind in cond.required.iter().chain(cond.optional.iter()) {
            let key = ind.cache_key();
            if !seen.contains(&key) {
                seen.push(key.clone());
                crossing_indicators.push((*kind, key));
            }
        }
    }

    let mut prev_condition: Vec<bool> = vec![false; conditions.len()];
    let mut prev_signal: Vec<bool> = vec![false; crossing_indicators.len()];

    for bar in 0..n {
        let bucket = sim_buckets[bar];

        // Indicator crossings first: they precede the condition transitions
        // they cause within the same bar.
        for (i, (kind, key)) in crossing_indicators.iter().enumerate() {
            let now = resampled.signal(key, bar);
            if now != prev_signal[i] {
                let event_kind = if now {
                    EventKind::SignalRising {
                        indicator: key.clone(),
                    }
                } else {
                    EventKind::SignalFalling {
                        indicator: key.clone(),
                    }
                };
                emit(
                    &mut heap,
                    id_gen,
                    bar,
                    bucket,
                    *kind,
                    event_kind,
                    trading_start_index,
                );
            }
            prev_signal[i] = now;
        }

        for (c, (kind, cond)) in conditions.iter().enumerate() {
            let now = evaluate_condition(cond, resampled, bar);
            if now != prev_condition[c] {
                let event_kind = if now {
                    EventKind::ConditionMet
                } else {
                    EventKind::ConditionUnmet
                };
                emit(
                    &mut heap,
                    id_gen,
                    bar,
                    bucket,
                    *kind,
                    event_kind,
                    trading_start_index,
                );
            }
            prev_condition[c] = now;
        }
    }

    heap
}

fn emit(
    heap: &mut EventHeap,
    id_gen: &mut IdGen,
    bar: usize,
    bucket: i64,
    condition: ConditionKind,
    kind: EventKind,
    trading_start_index: usize,
) {
    // The id is consumed even for discarded events; only emission order
    // matters for determinism, not density.
    let id = id_gen.next_event_id();
    if bar < trading_start_index {
        return;
    }
    heap.push(Event {
        id,
        bucket,
        bar_index: bar,
        condition,
        kind,
    });
}

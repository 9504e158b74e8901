//! Price-trigger scanner — resolves SL/TP ordering inside one parent bar.
//!
//! A single parent bar can span both the stop-loss and take-profit levels.
//! The scanner walks the bar's sub-bars in ascending time order and checks
//! each against the current levels:
//! - the stop-loss is checked before the take-profit, so a sub-bar touching
//!   both resolves to the stop (conservative tie-break);
//! - with a trailing stop, the favorable extreme ratchets per sub-bar
//!   before the hit check.
//!
//! Without sub-bar data the parent's own OHLC is used with the same
//! tie-break and no intra-bar ratchet: the extreme only updates after the
//! checks, so trailing happens bar-to-bar.

use crate::domain::{Candle, ExitReason, TradeDirection};
use crate::sim::state::OpenPosition;

/// A price-level exit resolved within one bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceTrigger {
    pub reason: ExitReason,
    /// Fill price: the tracker level at the moment of the hit.
    pub price: f64,
    /// Bucket of the sub-bar (or parent bar) that produced the hit.
    pub bucket: i64,
}

/// Scan one simulation bar for a stop/take-profit hit.
///
/// Mutates the position's trackers (trailing extremes and trigger latches).
/// Returns the earliest trigger, or `None` if neither level was touched.
pub fn scan_bar(
    parent: &Candle,
    sub_bars: Option<&[Candle]>,
    pos: &mut OpenPosition,
) -> Option<PriceTrigger> {
    match sub_bars {
        Some(bars) if !bars.is_empty() => {
            for bar in bars {
                if let Some(trigger) = check_window(pos, bar, true) {
                    return Some(trigger);
                }
            }
            None
        }
        _ => check_window(pos, parent, false),
    }
}

/// Check one OHLC window (sub-bar or parent fallback) against the trackers.
///
/// `intrabar_ratchet` controls whether a trailing stop's extreme updates
/// before the hit check (sub-bar mode) or after (parent fallback).
fn check_window(pos: &mut OpenPosition, bar: &Candle, intrabar_ratchet: bool) -> Option<PriceTrigger> {
    let direction = pos.direction;
    let (favorable, adverse) = match direction {
        TradeDirection::Long => (bar.high, bar.low),
        TradeDirection::Short => (bar.low, bar.high),
    };

    if intrabar_ratchet {
        if let Some(stop) = pos.stop.as_mut() {
            stop.update_extreme(favorable);
        }
    }

    let mut trigger = None;

    if let Some(stop) = pos.stop.as_mut() {
        if stop.check(adverse) {
            let reason = if stop.is_trailing() {
                ExitReason::TrailingStop
            } else {
                ExitReason::StopLoss
            };
            trigger = Some(PriceTrigger {
                reason,
                price: stop.level(),
                bucket: bar.bucket,
            });
        }
    }

    if trigger.is_none() {
        if let Some(tp) = pos.take_profit.as_mut() {
            if tp.check(favorable) {
                trigger = Some(PriceTrigger {
                    reason: ExitReason::TakeProfit,
                    price: tp.level(),
                    bucket: bar.bucket,
                });
            }
        }
    }

    if !intrabar_ratchet {
        if let Some(stop) = pos.stop.as_mut() {
            stop.update_extreme(favorable);
        }
    }

    trigger
}

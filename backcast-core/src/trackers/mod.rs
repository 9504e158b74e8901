//! Per-trade stateful trackers: stop-loss, take-profit, balance.
//!
//! Trackers are created when a trade opens, owned exclusively by that trade,
//! and dropped when it closes. They never look up indicators — DYN
//! modulation happens at entry, where the simulator samples the factor
//! indicator's value and passes a plain float in.

pub mod balance;
pub mod stop_loss;
pub mod take_profit;

pub use balance::{position_size_usd, BalanceTracker, ExitFill};
pub use stop_loss::StopLossTracker;
pub use take_profit::TakeProfitTracker;

use crate::config::{ValueConfig, ValueKind};

/// A risk level's distance from its reference price, with DYN already
/// resolved to a plain REL fraction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LevelOffset {
    /// Absolute USD distance.
    Abs(f64),
    /// Fraction of the reference price.
    Rel(f64),
}

impl LevelOffset {
    /// Resolve a `ValueConfig` into an offset.
    ///
    /// `factor` is the normalized DYN factor in `[0, 1]` sampled at the
    /// entry bar; it is ignored for ABS/REL configs.
    pub fn resolve(cfg: &ValueConfig, factor: f64) -> Self {
        match cfg.kind {
            ValueKind::Abs => Self::Abs(cfg.value),
            ValueKind::Rel => Self::Rel(cfg.value),
            ValueKind::Dyn => Self::Rel(cfg.value * factor),
        }
    }
}

/// Normalize a raw factor-indicator value into the DYN factor.
///
/// By convention raw values live in `[0, 100]` (RSI-style); they are divided
/// by 100 and clamped to `[0, 1]`. `inverted` flips to `1 - factor`.
/// A NaN raw value resolves to factor 1.0 so a dead factor indicator
/// degrades to plain REL behavior rather than a zero-size trade.
pub fn dyn_factor(raw_value: f64, inverted: bool) -> f64 {
    let f = if raw_value.is_nan() {
        1.0
    } else {
        (raw_value / 100.0).clamp(0.0, 1.0)
    };
    if inverted {
        1.0 - f
    } else {
        f
    }
}

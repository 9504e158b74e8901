//! Per-bar equity curve point.

use serde::{Deserialize, Serialize};

/// Equity at one simulation bar close.
///
/// `equity` is cash plus the mark-to-market value of any open position at the
/// bar's close, gross of hypothetical exit costs. `drawdown_pct` is measured
/// against the running maximum equity and lies in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub bucket: i64,
    pub bar_index: usize,
    pub equity: f64,
    pub drawdown_pct: f64,
}

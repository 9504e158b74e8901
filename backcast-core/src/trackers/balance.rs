//! Balance tracker — the non-triggering accounting side of an open trade.
//!
//! Computes the effective entry (slippage against the trader), the position
//! size in asset units, entry/exit fees in basis points of notional, and
//! per-update unrealized PnL. Tracks intra-trade max run-up and max
//! drawdown with an expanding-range tracker.

use crate::config::{ValueConfig, ValueKind};
use crate::domain::TradeDirection;

const BPS: f64 = 10_000.0;

/// Exit-side fill economics, produced once when the trade closes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExitFill {
    /// Exit price after slippage (long sells lower, short buys higher).
    pub effective_price: f64,
    pub notional_usd: f64,
    pub fee_usd: f64,
    pub slippage_usd: f64,
    /// Realized PnL net of both legs' fees.
    pub pnl_usd: f64,
}

#[derive(Debug, Clone)]
pub struct BalanceTracker {
    direction: TradeDirection,
    qty: f64,
    effective_entry: f64,
    entry_notional_usd: f64,
    entry_fee_usd: f64,
    entry_slippage_usd: f64,
    fee_bps: f64,
    slippage_bps: f64,
    max_runup_usd: f64,
    max_drawdown_usd: f64,
}

impl BalanceTracker {
    /// Open a position worth `size_usd` at raw price `entry_price`.
    ///
    /// Slippage worsens the entry: longs pay more, shorts receive less.
    pub fn new(
        direction: TradeDirection,
        entry_price: f64,
        size_usd: f64,
        fee_bps: f64,
        slippage_bps: f64,
    ) -> Self {
        let slip = slippage_bps / BPS;
        let effective_entry = match direction {
            TradeDirection::Long => entry_price * (1.0 + slip),
            TradeDirection::Short => entry_price * (1.0 - slip),
        };
        let qty = size_usd / effective_entry;
        let entry_fee_usd = size_usd * fee_bps / BPS;
        let entry_slippage_usd = qty * (effective_entry - entry_price).abs();

        Self {
            direction,
            qty,
            effective_entry,
            entry_notional_usd: size_usd,
            entry_fee_usd,
            entry_slippage_usd,
            fee_bps,
            slippage_bps,
            max_runup_usd: 0.0,
            max_drawdown_usd: 0.0,
        }
    }

    pub fn direction(&self) -> TradeDirection {
        self.direction
    }

    pub fn qty(&self) -> f64 {
        self.qty
    }

    pub fn effective_entry(&self) -> f64 {
        self.effective_entry
    }

    pub fn entry_notional_usd(&self) -> f64 {
        self.entry_notional_usd
    }

    pub fn entry_fee_usd(&self) -> f64 {
        self.entry_fee_usd
    }

    pub fn entry_slippage_usd(&self) -> f64 {
        self.entry_slippage_usd
    }

    pub fn max_runup_usd(&self) -> f64 {
        self.max_runup_usd
    }

    pub fn max_drawdown_usd(&self) -> f64 {
        self.max_drawdown_usd
    }

    /// Unrealized PnL at `price`, gross of exit costs.
    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        match self.direction {
            TradeDirection::Long => self.qty * (price - self.effective_entry),
            TradeDirection::Short => self.qty * (self.effective_entry - price),
        }
    }

    /// Expand the intra-trade run-up / drawdown range at `price`.
    pub fn observe(&mut self, price: f64) {
        let pnl = self.unrealized_pnl(price);
        self.max_runup_usd = self.max_runup_usd.max(pnl);
        self.max_drawdown_usd = self.max_drawdown_usd.min(pnl);
    }

    /// Close the position at raw price `exit_price`.
    ///
    /// Slippage worsens the exit (longs sell lower, shorts buy higher); the
    /// exit fee is charged on the exit notional. Realized PnL nets out both
    /// legs' fees.
    pub fn realized(&self, exit_price: f64) -> ExitFill {
        let slip = self.slippage_bps / BPS;
        let effective_price = match self.direction {
            TradeDirection::Long => exit_price * (1.0 - slip),
            TradeDirection::Short => exit_price * (1.0 + slip),
        };
        let notional_usd = self.qty * effective_price;
        let fee_usd = notional_usd * self.fee_bps / BPS;
        let slippage_usd = self.qty * (effective_price - exit_price).abs();

        let gross = match self.direction {
            TradeDirection::Long => self.qty * (effective_price - self.effective_entry),
            TradeDirection::Short => self.qty * (self.effective_entry - effective_price),
        };
        let pnl_usd = gross - self.entry_fee_usd - fee_usd;

        ExitFill {
            effective_price,
            notional_usd,
            fee_usd,
            slippage_usd,
            pnl_usd,
        }
    }
}

/// Resolve a position-size `ValueConfig` into USD at entry.
///
/// REL: fraction of available capital. ABS: fixed USD, clamped to available
/// capital. DYN: REL modulated by the pre-normalized entry-time factor.
pub fn position_size_usd(cfg: &ValueConfig, capital_usd: f64, factor: f64) -> f64 {
    match cfg.kind {
        ValueKind::Rel => capital_usd * cfg.value,
        ValueKind::Abs => cfg.value.min(capital_usd),
        ValueKind::Dyn => capital_usd * cfg.value * factor,
    }
}

//! Backcast Core — deterministic candle backtesting engine.
//!
//! The crate implements the simulation pipeline:
//! - Domain types (candles, swaps, trades, equity points, IDs)
//! - Mip-map builder (candle resolution pyramid)
//! - Indicator library and signal pre-calculation
//! - Resampler (sample-and-hold alignment to the simulation resolution)
//! - Event extractor and deterministic event heap
//! - Sub-bar source for intra-bar SL/TP ordering
//! - Per-trade risk trackers (stop-loss, take-profit, balance)
//! - Event-driven position state machine
//!
//! Identical inputs produce bitwise-identical trades, equity curves, and
//! metrics: heap order is `(timestamp, event id)` with ids allocated in a
//! fixed emission order, and parallel indicator pre-computation merges in
//! sorted-key order.

pub mod config;
pub mod domain;
pub mod error;
pub mod event;
pub mod indicators;
pub mod mipmap;
pub mod signal;
pub mod sim;
pub mod subbar;
pub mod trackers;

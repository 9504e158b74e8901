//! Domain types: candles, swaps, trades, equity points, position state, IDs.

pub mod candle;
pub mod equity;
pub mod ids;
pub mod position;
pub mod swap;
pub mod trade;

pub use candle::{detect_resolution, Candle};
pub use equity::EquityPoint;
pub use ids::{CacheKey, EventId, IdGen, RunId, SwapId, TradeId};
pub use position::PositionState;
pub use swap::{Asset, Swap};
pub use trade::{ExitReason, Trade, TradeDirection};

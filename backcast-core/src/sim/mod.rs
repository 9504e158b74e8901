//! The event-driven simulator: state machine, price-trigger scanner,
//! configuration and result types.

pub mod engine;
pub mod scanner;
pub mod state;

pub use engine::{simulate, SimInputs};
pub use scanner::{scan_bar, PriceTrigger};
pub use state::{
    AlgoEvent, AlgoEventKind, OpenPosition, SimConfig, SimResult, SimState, SkipReason,
};

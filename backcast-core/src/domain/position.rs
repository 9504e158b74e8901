//! Position state — the engine holds at most one open position.

use super::trade::TradeDirection;
use serde::{Deserialize, Serialize};

/// Current position of the simulator. Single-position engine: never more
/// than one direction open at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PositionState {
    Flat,
    Long,
    Short,
}

impl PositionState {
    pub fn is_flat(&self) -> bool {
        matches!(self, Self::Flat)
    }

    pub fn direction(&self) -> Option<TradeDirection> {
        match self {
            Self::Flat => None,
            Self::Long => Some(TradeDirection::Long),
            Self::Short => Some(TradeDirection::Short),
        }
    }
}

impl From<TradeDirection> for PositionState {
    fn from(dir: TradeDirection) -> Self {
        match dir {
            TradeDirection::Long => Self::Long,
            TradeDirection::Short => Self::Short,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_has_no_direction() {
        assert!(PositionState::Flat.is_flat());
        assert_eq!(PositionState::Flat.direction(), None);
    }

    #[test]
    fn direction_roundtrip() {
        assert_eq!(
            PositionState::from(TradeDirection::Short).direction(),
            Some(TradeDirection::Short)
        );
    }
}

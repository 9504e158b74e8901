//! Deterministic ID types.
//!
//! - `EventId`, `SwapId`, `TradeId`: sequential counters allocated during a
//!   run. `EventId` doubles as the tie-break key in the event heap, so its
//!   allocation order is part of the engine's determinism contract.
//! - `CacheKey`: BLAKE3 over an indicator config's canonical JSON — the
//!   deduplication identity for the signal cache.
//! - `RunId`: BLAKE3 over the full backtest input.

use serde::{Deserialize, Serialize};
use std::fmt;

// ── Sequential ID types ──────────────────────────────────────────────

macro_rules! seq_id {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

seq_id!(EventId);
seq_id!(SwapId);
seq_id!(TradeId);

/// Monotonically increasing ID generator. One per run.
#[derive(Debug, Default)]
pub struct IdGen {
    next: u64,
}

impl IdGen {
    pub fn next_event_id(&mut self) -> EventId {
        let id = EventId(self.next);
        self.next += 1;
        id
    }

    pub fn next_swap_id(&mut self) -> SwapId {
        let id = SwapId(self.next);
        self.next += 1;
        id
    }

    pub fn next_trade_id(&mut self) -> TradeId {
        let id = TradeId(self.next);
        self.next += 1;
        id
    }
}

// ── BLAKE3-based hash types ──────────────────────────────────────────

/// 32-byte BLAKE3 hash wrapper with hex display and serde as hex string.
macro_rules! hash_id {
    ($name:ident) => {
        #[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub [u8; 32]);

        impl $name {
            pub fn from_bytes(data: &[u8]) -> Self {
                Self(*blake3::hash(data).as_bytes())
            }

            pub fn as_hex(&self) -> String {
                self.0.iter().map(|b| format!("{b:02x}")).collect()
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), &self.as_hex()[..16])
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.as_hex())
            }
        }

        impl Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
                s.serialize_str(&self.as_hex())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
                let hex = String::deserialize(d)?;
                let bytes: Vec<u8> = (0..hex.len())
                    .step_by(2)
                    .map(|i| u8::from_str_radix(&hex[i..i + 2], 16))
                    .collect::<Result<_, _>>()
                    .map_err(serde::de::Error::custom)?;
                let arr: [u8; 32] = bytes
                    .try_into()
                    .map_err(|_| serde::de::Error::custom("expected 32 bytes"))?;
                Ok(Self(arr))
            }
        }
    };
}

hash_id!(CacheKey);
hash_id!(RunId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_gen_is_monotonic() {
        let mut gen = IdGen::default();
        let a = gen.next_event_id();
        let b = gen.next_event_id();
        assert!(b.0 > a.0);
    }

    #[test]
    fn id_gen_shares_one_sequence() {
        let mut gen = IdGen::default();
        let e = gen.next_event_id();
        let s = gen.next_swap_id();
        let t = gen.next_trade_id();
        assert!(e.0 < s.0 && s.0 < t.0);
    }

    #[test]
    fn blake3_hash_is_deterministic() {
        let h1 = CacheKey::from_bytes(b"{\"type\":\"EMA_CROSS\",\"fast_period\":9}");
        let h2 = CacheKey::from_bytes(b"{\"type\":\"EMA_CROSS\",\"fast_period\":9}");
        assert_eq!(h1, h2);
    }

    #[test]
    fn different_input_different_hash() {
        let h1 = CacheKey::from_bytes(b"ema_9_21");
        let h2 = CacheKey::from_bytes(b"ema_12_26");
        assert_ne!(h1, h2);
    }

    #[test]
    fn hash_serialization_roundtrip() {
        let h = RunId::from_bytes(b"test input");
        let json = serde_json::to_string(&h).unwrap();
        let deser: RunId = serde_json::from_str(&json).unwrap();
        assert_eq!(h, deser);
    }

    #[test]
    fn hash_hex_is_64_chars() {
        let h = CacheKey::from_bytes(b"key");
        assert_eq!(h.as_hex().len(), 64);
    }
}

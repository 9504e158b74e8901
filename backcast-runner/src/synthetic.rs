//! Deterministic synthetic candles for demos and tests.
//!
//! A simple random walk seeded from the symbol name, so the same symbol
//! always produces the same series. Clearly fake data; never mix with real
//! results.

use backcast_core::domain::Candle;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Generate `count` equispaced candles starting at `start_bucket`.
pub fn generate_candles(
    symbol: &str,
    count: usize,
    resolution_secs: i64,
    start_bucket: i64,
) -> Vec<Candle> {
    let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let mut candles = Vec::with_capacity(count);
    let mut price = 100.0_f64;

    for i in 0..count {
        let bar_return: f64 = rng.gen_range(-0.01..0.01);
        let open = price;
        let close = price * (1.0 + bar_return);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.003));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.003));
        let volume = rng.gen_range(1_000.0..100_000.0);

        candles.push(Candle {
            bucket: start_bucket + i as i64 * resolution_secs,
            open,
            high,
            low,
            close,
            volume,
        });
        price = close;
    }

    candles
}

#[cfg(test)]
mod tests {
    use super::*;
    use backcast_core::domain::detect_resolution;

    #[test]
    fn synthetic_is_deterministic_per_symbol() {
        let a = generate_candles("BTC-USD", 50, 60, 0);
        let b = generate_candles("BTC-USD", 50, 60, 0);
        assert_eq!(a, b);
    }

    #[test]
    fn different_symbols_differ() {
        let a = generate_candles("BTC-USD", 50, 60, 0);
        let b = generate_candles("ETH-USD", 50, 60, 0);
        assert_ne!(a[0].close, b[0].close);
    }

    #[test]
    fn synthetic_candles_are_sane_and_equispaced() {
        let candles = generate_candles("SOL-USD", 200, 300, 1_000);
        assert!(candles.iter().all(|c| c.is_sane()));
        assert_eq!(detect_resolution(&candles), Some(300));
        assert_eq!(candles[0].bucket, 1_000);
    }
}

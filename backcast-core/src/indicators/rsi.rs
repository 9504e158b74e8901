//! Relative Strength Index over a raw price series.
//!
//! Uses Wilder smoothing of average gains and average losses.
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//! Lookback: period.
//! Edge cases: avg_loss == 0 → RSI = 100; avg_gain == 0 → RSI = 0.

/// Compute RSI values from a price slice. The first `period` outputs are
/// `f64::NAN`; a NaN input taints every output from that point on.
pub fn rsi_of_series(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    if period == 0 || n < period + 1 {
        return result;
    }

    let mut changes = vec![f64::NAN; n];
    for i in 1..n {
        if values[i].is_nan() || values[i - 1].is_nan() {
            changes[i] = f64::NAN;
        } else {
            changes[i] = values[i] - values[i - 1];
        }
    }

    // Seed: average gain and loss over the first `period` changes
    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;
    for &ch in &changes[1..=period] {
        if ch.is_nan() {
            return result;
        }
        if ch > 0.0 {
            avg_gain += ch;
        } else {
            avg_loss -= ch;
        }
    }
    avg_gain /= period as f64;
    avg_loss /= period as f64;

    result[period] = rsi_value(avg_gain, avg_loss);

    // Wilder smoothing
    let alpha = 1.0 / period as f64;
    for i in (period + 1)..n {
        if changes[i].is_nan() {
            for val in result.iter_mut().skip(i) {
                *val = f64::NAN;
            }
            return result;
        }
        let gain = changes[i].max(0.0);
        let loss = (-changes[i]).max(0.0);
        avg_gain = alpha * gain + (1.0 - alpha) * avg_gain;
        avg_loss = alpha * loss + (1.0 - alpha) * avg_loss;
        result[i] = rsi_value(avg_gain, avg_loss);
    }

    result
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        if avg_gain == 0.0 {
            50.0
        } else {
            100.0
        }
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn rsi_all_gains_is_100() {
        let values: Vec<f64> = (0..10).map(|i| 100.0 + i as f64).collect();
        let result = rsi_of_series(&values, 3);
        assert!(result[2].is_nan());
        assert_approx(result[3], 100.0, DEFAULT_EPSILON);
        assert_approx(result[9], 100.0, DEFAULT_EPSILON);
    }

    #[test]
    fn rsi_all_losses_is_0() {
        let values: Vec<f64> = (0..10).map(|i| 100.0 - i as f64).collect();
        let result = rsi_of_series(&values, 3);
        assert_approx(result[3], 0.0, DEFAULT_EPSILON);
    }

    #[test]
    fn rsi_flat_series_is_50() {
        let values = vec![100.0; 10];
        let result = rsi_of_series(&values, 3);
        assert_approx(result[3], 50.0, DEFAULT_EPSILON);
    }

    #[test]
    fn rsi_known_mixed_values() {
        // Changes: +1, -1, +1, -1 with period 2.
        // Seed over first 2 changes: avg_gain = 0.5, avg_loss = 0.5 → RSI 50.
        let values = vec![100.0, 101.0, 100.0, 101.0, 100.0];
        let result = rsi_of_series(&values, 2);
        assert_approx(result[2], 50.0, DEFAULT_EPSILON);
        assert!(result[3] > 50.0); // last change was a gain
        assert!(result[4] < result[3]); // then a loss
    }

    #[test]
    fn rsi_stays_in_0_100() {
        let values: Vec<f64> = (0..50)
            .map(|i| 100.0 + (i as f64 * 0.7).sin() * 10.0)
            .collect();
        for v in rsi_of_series(&values, 14).iter().filter(|v| !v.is_nan()) {
            assert!((0.0..=100.0).contains(v));
        }
    }

    #[test]
    fn rsi_nan_input_taints_tail() {
        let mut values: Vec<f64> = (0..10).map(|i| 100.0 + i as f64).collect();
        values[6] = f64::NAN;
        let result = rsi_of_series(&values, 3);
        assert!(!result[5].is_nan());
        assert!(result[6].is_nan());
        assert!(result[9].is_nan());
    }
}

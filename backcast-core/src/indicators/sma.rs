//! Simple Moving Average over a raw price series.
//!
//! Rolling-sum implementation. Lookback: period - 1.

/// Compute SMA values from a price slice. The first `period - 1` outputs are
/// `f64::NAN`. A NaN input poisons every window that contains it.
pub fn sma_of_series(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    if n < period || period == 0 {
        return result;
    }

    // Direct window sums: a rolling sum would let one NaN poison every
    // later window via NaN arithmetic.
    for i in (period - 1)..n {
        let window = &values[i + 1 - period..=i];
        if window.iter().any(|v| v.is_nan()) {
            result[i] = f64::NAN;
        } else {
            result[i] = window.iter().sum::<f64>() / period as f64;
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn sma_3_known_values() {
        let result = sma_of_series(&[10.0, 20.0, 30.0, 40.0, 50.0], 3);
        assert!(result[0].is_nan());
        assert!(result[1].is_nan());
        assert_approx(result[2], 20.0, DEFAULT_EPSILON);
        assert_approx(result[3], 30.0, DEFAULT_EPSILON);
        assert_approx(result[4], 40.0, DEFAULT_EPSILON);
    }

    #[test]
    fn sma_period_1_equals_input() {
        let result = sma_of_series(&[5.0, 6.0], 1);
        assert_approx(result[0], 5.0, DEFAULT_EPSILON);
        assert_approx(result[1], 6.0, DEFAULT_EPSILON);
    }

    #[test]
    fn sma_nan_poisons_window_only() {
        let result = sma_of_series(&[10.0, f64::NAN, 30.0, 40.0, 50.0], 2);
        assert!(result[1].is_nan());
        assert!(result[2].is_nan());
        assert_approx(result[3], 35.0, DEFAULT_EPSILON);
        assert_approx(result[4], 45.0, DEFAULT_EPSILON);
    }

    #[test]
    fn sma_series_shorter_than_period() {
        let result = sma_of_series(&[1.0], 3);
        assert!(result[0].is_nan());
    }
}

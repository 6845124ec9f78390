//! Shared rolling-window helpers for indicator calculations.
//!
//! Every helper returns a vector the same length as its input. Positions that
//! do not yet have a full window hold `0.0`.

pub fn rolling_mean(values: &[f64], period: usize) -> Vec<f64> {
    rolling(values, period, |window| {
        window.iter().sum::<f64>() / window.len() as f64
    })
}

/// Sample standard deviation (divisor n-1) over each full window.
pub fn rolling_sample_stddev(values: &[f64], period: usize) -> Vec<f64> {
    if period < 2 {
        return vec![0.0; values.len()];
    }
    rolling(values, period, |window| {
        let n = window.len() as f64;
        let mean = window.iter().sum::<f64>() / n;
        let variance = window.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
        variance.sqrt()
    })
}

pub fn rolling_max(values: &[f64], period: usize) -> Vec<f64> {
    rolling(values, period, |window| {
        window.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    })
}

pub fn rolling_min(values: &[f64], period: usize) -> Vec<f64> {
    rolling(values, period, |window| {
        window.iter().copied().fold(f64::INFINITY, f64::min)
    })
}

fn rolling<F>(values: &[f64], period: usize, reduce: F) -> Vec<f64>
where
    F: Fn(&[f64]) -> f64,
{
    let mut out = vec![0.0; values.len()];
    if period == 0 || values.len() < period {
        return out;
    }
    for (offset, window) in values.windows(period).enumerate() {
        out[offset + period - 1] = reduce(window);
    }
    out
}

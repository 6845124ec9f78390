//! Exponential Moving Average of closes, recursive form.
//!
//! k = 2/(span+1), EMA[0] = C[0], EMA[i] = C[i]*k + EMA[i-1]*(1-k).
//! No bias correction and no warmup gap: every bar carries a value, which is
//! why evaluation windows rely on the warm-up fetch rather than on this series.

use crate::domain::ohlcv::Bar;

pub fn calculate_ema(bars: &[Bar], span: usize) -> Vec<f64> {
    if span == 0 {
        return vec![0.0; bars.len()];
    }

    let k = 2.0 / (span as f64 + 1.0);
    let mut values = Vec::with_capacity(bars.len());
    let mut ema = 0.0;

    for (i, bar) in bars.iter().enumerate() {
        ema = if i == 0 {
            bar.close
        } else {
            bar.close * k + ema * (1.0 - k)
        };
        values.push(ema);
    }

    values
}

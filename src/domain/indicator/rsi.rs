//! RSI (Relative Strength Index) with simple rolling averages.
//!
//! gain[i] = max(C[i] - C[i-1], 0), loss[i] = max(C[i-1] - C[i], 0), and the
//! first bar contributes a zero gain and a zero loss.
//! RS = mean(gain, n) / mean(loss, n); RSI = 100 - 100 / (1 + RS).
//!
//! If avg_loss == 0 and avg_gain > 0: RSI = 100. If both are 0 the value is
//! undefined and held at 0.
//! Warmup: first (n-1) bars hold 0.

use crate::domain::indicator_helpers::rolling_mean;
use crate::domain::ohlcv::Bar;

pub fn calculate_rsi(bars: &[Bar], period: usize) -> Vec<f64> {
    let mut gains = Vec::with_capacity(bars.len());
    let mut losses = Vec::with_capacity(bars.len());

    for (i, bar) in bars.iter().enumerate() {
        let change = if i == 0 {
            0.0
        } else {
            bar.close - bars[i - 1].close
        };
        gains.push(change.max(0.0));
        losses.push((-change).max(0.0));
    }

    let avg_gain = rolling_mean(&gains, period);
    let avg_loss = rolling_mean(&losses, period);
    let warmup = period.saturating_sub(1);

    avg_gain
        .iter()
        .zip(&avg_loss)
        .enumerate()
        .map(|(i, (&g, &l))| {
            if i < warmup || period == 0 {
                0.0
            } else if l == 0.0 {
                if g > 0.0 { 100.0 } else { 0.0 }
            } else {
                100.0 - (100.0 / (1.0 + g / l))
            }
        })
        .collect()
}

//! Bollinger Bands.
//!
//! - Middle: SMA over n closes
//! - Upper: Middle + (multiplier × StdDev)
//! - Lower: Middle - (multiplier × StdDev)
//!
//! StdDev is the sample standard deviation (divides by N-1).
//! Default parameters: period=20, multiplier=2.0.
//! Warmup: first (period-1) bars hold zero for all three bands.

use crate::domain::indicator_helpers::{rolling_mean, rolling_sample_stddev};
use crate::domain::ohlcv::Bar;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

pub fn calculate_bollinger(bars: &[Bar], period: usize, multiplier: f64) -> Vec<Bands> {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let middle = rolling_mean(&closes, period);
    let stddev = rolling_sample_stddev(&closes, period);
    let warmup = period.saturating_sub(1);

    middle
        .iter()
        .zip(&stddev)
        .enumerate()
        .map(|(i, (&mid, &sd))| {
            if i < warmup || period < 2 {
                Bands::default()
            } else {
                Bands {
                    upper: mid + multiplier * sd,
                    middle: mid,
                    lower: mid - multiplier * sd,
                }
            }
        })
        .collect()
}

//! Price channel used as the grid range: highest high and lowest low over n bars.
//!
//! Warmup: first (n-1) bars hold zero for top, bottom and mid.

use crate::domain::indicator_helpers::{rolling_max, rolling_min};
use crate::domain::ohlcv::Bar;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Channel {
    pub top: f64,
    pub bottom: f64,
    pub mid: f64,
}

pub fn calculate_channel(bars: &[Bar], period: usize) -> Vec<Channel> {
    let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
    let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();
    let tops = rolling_max(&highs, period);
    let bottoms = rolling_min(&lows, period);
    let warmup = period.saturating_sub(1);

    tops.iter()
        .zip(&bottoms)
        .enumerate()
        .map(|(i, (&top, &bottom))| {
            if i < warmup || period == 0 {
                Channel::default()
            } else {
                Channel {
                    top,
                    bottom,
                    mid: (top + bottom) / 2.0,
                }
            }
        })
        .collect()
}

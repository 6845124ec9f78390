//! Simple Moving Average of closes.
//!
//! SMA(n)[i] = mean(C[i-n+1..=i]). The first (n-1) bars hold 0.

use crate::domain::indicator_helpers::rolling_mean;
use crate::domain::ohlcv::Bar;

pub fn calculate_sma(bars: &[Bar], period: usize) -> Vec<f64> {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    rolling_mean(&closes, period)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn make_bars(prices: &[f64]) -> Vec<Bar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        prices
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                time: start + Duration::days(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1000.0,
            })
            .collect()
    }

    #[test]
    fn sma_basic() {
        let bars = make_bars(&[10.0, 20.0, 30.0, 40.0]);
        let sma = calculate_sma(&bars, 2);
        assert_eq!(sma, vec![0.0, 15.0, 25.0, 35.0]);
    }

    #[test]
    fn sma_not_enough_history() {
        let bars = make_bars(&[100.0, 102.0, 98.0, 95.0, 110.0]);
        assert!(calculate_sma(&bars, 10).iter().all(|v| *v == 0.0));
    }

    #[test]
    fn sma_empty() {
        assert!(calculate_sma(&[], 10).is_empty());
    }
}

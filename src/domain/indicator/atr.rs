//! Average True Range as a simple rolling mean of true range.
//!
//! TR[0] = high - low (no previous close); TR[i] = Bar::true_range(C[i-1]).
//! ATR(n)[i] = mean(TR[i-n+1..=i]). Warmup: first (n-1) bars hold 0.

use crate::domain::indicator_helpers::rolling_mean;
use crate::domain::ohlcv::Bar;

pub fn calculate_atr(bars: &[Bar], period: usize) -> Vec<f64> {
    let tr_values: Vec<f64> = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            if i == 0 {
                bar.high - bar.low
            } else {
                bar.true_range(bars[i - 1].close)
            }
        })
        .collect();

    rolling_mean(&tr_values, period)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn make_bar(day: u32, high: f64, low: f64, close: f64) -> Bar {
        Bar {
            time: NaiveDate::from_ymd_opt(2024, 1, day)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            open: close,
            high,
            low,
            close,
            volume: 1000.0,
        }
    }

    #[test]
    fn atr_warmup() {
        let bars: Vec<Bar> = (1..=5).map(|d| make_bar(d, 110.0, 90.0, 100.0)).collect();
        let atr = calculate_atr(&bars, 3);

        assert_eq!(atr[0], 0.0);
        assert_eq!(atr[1], 0.0);
        assert_relative_eq!(atr[2], 20.0);
        assert_relative_eq!(atr[4], 20.0);
    }

    #[test]
    fn atr_includes_gaps() {
        let bars = vec![
            make_bar(1, 110.0, 100.0, 105.0),
            make_bar(2, 130.0, 120.0, 125.0),
            make_bar(3, 120.0, 110.0, 115.0),
        ];
        let atr = calculate_atr(&bars, 2);

        // TR: 10, max(10, 25, 15) = 25, max(10, 5, 15) = 15
        assert_relative_eq!(atr[1], 17.5);
        assert_relative_eq!(atr[2], 20.0);
    }

    #[test]
    fn atr_insufficient_bars() {
        let bars: Vec<Bar> = (1..=2).map(|d| make_bar(d, 110.0, 90.0, 100.0)).collect();
        assert_eq!(calculate_atr(&bars, 5), vec![0.0, 0.0]);
    }
}

//! Entry / take-profit / stop-loss levels for the most recent bar.

use serde::Serialize;

use super::indicator::IndicatorBar;

/// ATR fallback as a fraction of price when volatility is unavailable.
const ATR_FALLBACK_FRACTION: f64 = 0.02;
const TAKE_PROFIT_ATR: f64 = 2.0;
const STOP_LOSS_ATR: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TradeSetup {
    pub entry: f64,
    pub tp: f64,
    pub sl: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SignalAdvice {
    pub price: f64,
    pub atr: f64,
    pub setup_long: TradeSetup,
    pub setup_short: TradeSetup,
}

pub fn advise(last: &IndicatorBar) -> SignalAdvice {
    let price = last.close();
    let atr = if last.atr > 0.0 {
        last.atr
    } else {
        price * ATR_FALLBACK_FRACTION
    };

    SignalAdvice {
        price,
        atr,
        setup_long: TradeSetup {
            entry: price,
            tp: price + TAKE_PROFIT_ATR * atr,
            sl: price - STOP_LOSS_ATR * atr,
        },
        setup_short: TradeSetup {
            entry: price,
            tp: price - TAKE_PROFIT_ATR * atr,
            sl: price + STOP_LOSS_ATR * atr,
        },
    }
}

pub fn advise_latest(bars: &[IndicatorBar]) -> Option<SignalAdvice> {
    bars.last().map(advise)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::compute_indicators;
    use crate::domain::ohlcv::Bar;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn bar_with_atr(close: f64, atr: f64) -> IndicatorBar {
        let bar = Bar {
            time: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 0.0,
        };
        IndicatorBar {
            atr,
            ..compute_indicators(&[bar])[0].clone()
        }
    }

    #[test]
    fn levels_from_atr() {
        let advice = advise(&bar_with_atr(100.0, 5.0));
        assert_relative_eq!(advice.setup_long.entry, 100.0);
        assert_relative_eq!(advice.setup_long.tp, 110.0);
        assert_relative_eq!(advice.setup_long.sl, 95.0);
        assert_relative_eq!(advice.setup_short.tp, 90.0);
        assert_relative_eq!(advice.setup_short.sl, 105.0);
    }

    #[test]
    fn zero_atr_falls_back_to_two_percent() {
        let advice = advise(&bar_with_atr(100.0, 0.0));
        assert_relative_eq!(advice.atr, 2.0);
        assert_relative_eq!(advice.setup_long.tp, 104.0);
        assert_relative_eq!(advice.setup_long.sl, 98.0);
    }

    #[test]
    fn empty_series_has_no_advice() {
        assert!(advise_latest(&[]).is_none());
    }

    #[test]
    fn latest_uses_last_bar() {
        let bars = vec![bar_with_atr(50.0, 1.0), bar_with_atr(80.0, 4.0)];
        let advice = advise_latest(&bars).unwrap();
        assert_relative_eq!(advice.price, 80.0);
        assert_relative_eq!(advice.setup_short.tp, 72.0);
    }
}

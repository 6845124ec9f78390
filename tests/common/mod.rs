#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::collections::HashMap;
use stratscan::domain::error::StratscanError;
pub use stratscan::domain::ohlcv::Bar;
use stratscan::domain::timeframe::Timeframe;
use stratscan::ports::data_port::MarketDataPort;

/// In-memory data port. Bars registered with `with_bars` serve every
/// timeframe unless a timeframe-specific series overrides them.
pub struct MockDataPort {
    pub data: HashMap<String, Vec<Bar>>,
    pub by_timeframe: HashMap<(String, Timeframe), Vec<Bar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            by_timeframe: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<Bar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_timeframe_bars(mut self, symbol: &str, timeframe: Timeframe, bars: Vec<Bar>) -> Self {
        self.by_timeframe.insert((symbol.to_string(), timeframe), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl MarketDataPort for MockDataPort {
    fn fetch_bars(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Bar>, StratscanError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(StratscanError::DataSource {
                reason: reason.clone(),
            });
        }
        let bars = self
            .by_timeframe
            .get(&(symbol.to_string(), timeframe))
            .or_else(|| self.data.get(symbol));
        Ok(bars
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.time >= start && b.time <= end)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn list_symbols(&self) -> Result<Vec<String>, StratscanError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn midnight(y: i32, m: u32, d: u32) -> NaiveDateTime {
    date(y, m, d).and_hms_opt(0, 0, 0).unwrap()
}

/// One bar per `step` starting at `start`, open/high/low bracketing the close.
pub fn bars_from_closes(start: NaiveDateTime, step: Duration, closes: &[f64]) -> Vec<Bar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Bar {
            time: start + step * i as i32,
            open: close,
            high: close * 1.01,
            low: close * 0.99,
            close,
            volume: 1000.0,
        })
        .collect()
}

pub fn daily_bars(start: NaiveDate, closes: &[f64]) -> Vec<Bar> {
    bars_from_closes(start.and_hms_opt(0, 0, 0).unwrap(), Duration::days(1), closes)
}

/// Oscillating closes around 100 with a 40-bar cycle.
pub fn wave_closes(count: usize) -> Vec<f64> {
    (0..count)
        .map(|i| 100.0 + 20.0 * (i as f64 * std::f64::consts::TAU / 40.0).sin())
        .collect()
}

pub fn flat_closes(count: usize, price: f64) -> Vec<f64> {
    vec![price; count]
}

/// Random-walk closes from per-bar fractional moves.
pub fn walk_closes(start: f64, moves: &[f64]) -> Vec<f64> {
    let mut price = start;
    std::iter::once(start)
        .chain(moves.iter().map(|m| {
            price *= 1.0 + m;
            price
        }))
        .collect()
}

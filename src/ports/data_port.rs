//! Market data access port.

use chrono::NaiveDateTime;

use crate::domain::error::StratscanError;
use crate::domain::ohlcv::Bar;
use crate::domain::timeframe::Timeframe;

pub trait MarketDataPort {
    /// Bars for `symbol` at `timeframe` with `start <= time <= end`, sorted
    /// ascending by time. An unknown symbol yields an empty vector.
    fn fetch_bars(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Bar>, StratscanError>;

    fn list_symbols(&self) -> Result<Vec<String>, StratscanError>;
}

//! Open position and closed trade records.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::domain::ohlcv::serialize_unix;

/// A fully invested long position. Fractional sizes are allowed.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub size: f64,
    pub entry_price: f64,
    pub entry_time: NaiveDateTime,
}

impl Position {
    pub fn market_value(&self, price: f64) -> f64 {
        self.size * price
    }

    /// Fractional return of the position at `price`.
    pub fn return_at(&self, price: f64) -> f64 {
        if self.entry_price == 0.0 {
            return 0.0;
        }
        (price - self.entry_price) / self.entry_price
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClosedTrade {
    #[serde(serialize_with = "serialize_unix")]
    pub entry_time: NaiveDateTime,
    #[serde(serialize_with = "serialize_unix")]
    pub exit_time: NaiveDateTime,
    pub entry_price: f64,
    pub exit_price: f64,
    /// Fractional return: 0.10 is +10%.
    pub pnl_pct: f64,
}

impl ClosedTrade {
    pub fn is_win(&self) -> bool {
        self.pnl_pct > 0.0
    }
}

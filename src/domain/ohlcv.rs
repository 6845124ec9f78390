//! OHLCV bar representation.

use chrono::NaiveDateTime;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    #[serde(serialize_with = "crate::domain::ohlcv::serialize_unix")]
    pub time: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }

    pub fn unix_time(&self) -> i64 {
        self.time.and_utc().timestamp()
    }
}

/// Serializes timestamps as unix seconds, the format chart front-ends consume.
pub fn serialize_unix<S>(time: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_i64(time.and_utc().timestamp())
}

//! Sampling intervals, lookback periods and evaluation-window resolution.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::domain::error::StratscanError;

/// Bars the longest indicator (EMA-200) is allowed to look back over before
/// the evaluation window opens.
pub const TREND_LOOKBACK_BARS: i64 = 200;

/// Intraday history is capped at this many days by the upstream provider.
pub const INTRADAY_HISTORY_DAYS: i64 = 730;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Timeframe {
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "4h")]
    FourHours,
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "1wk")]
    OneWeek,
    #[serde(rename = "1mo")]
    OneMonth,
}

impl Timeframe {
    pub const ALL: [Timeframe; 5] = [
        Timeframe::OneHour,
        Timeframe::FourHours,
        Timeframe::OneDay,
        Timeframe::OneWeek,
        Timeframe::OneMonth,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::OneHour => "1h",
            Timeframe::FourHours => "4h",
            Timeframe::OneDay => "1d",
            Timeframe::OneWeek => "1wk",
            Timeframe::OneMonth => "1mo",
        }
    }

    /// Nominal length of one bar.
    pub fn duration(&self) -> Duration {
        match self {
            Timeframe::OneHour => Duration::hours(1),
            Timeframe::FourHours => Duration::hours(4),
            Timeframe::OneDay => Duration::days(1),
            Timeframe::OneWeek => Duration::weeks(1),
            Timeframe::OneMonth => Duration::days(30),
        }
    }

    pub fn is_intraday(&self) -> bool {
        matches!(self, Timeframe::OneHour | Timeframe::FourHours)
    }

    /// Annualization factor for Sharpe: 252 sessions a year, scaled by how many
    /// bars of this interval fit in a 24h day.
    pub fn periods_per_year(&self) -> f64 {
        match self {
            Timeframe::OneHour => 252.0 * 24.0,
            Timeframe::FourHours => 252.0 * 6.0,
            Timeframe::OneDay => 252.0,
            Timeframe::OneWeek => 52.0,
            Timeframe::OneMonth => 12.0,
        }
    }

    /// Initial calendar span fetched ahead of the window for the trend EMA.
    /// Enough for round-the-clock markets; session-traded intraday data
    /// needs the loader to widen it (see `backtest::fetch_warm_history`).
    pub fn warmup_span(&self) -> Duration {
        self.duration() * (TREND_LOOKBACK_BARS * 3 / 2) as i32
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = StratscanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_lowercase();
        Timeframe::ALL
            .iter()
            .copied()
            .find(|tf| tf.as_str() == tag)
            .ok_or_else(|| StratscanError::InvalidTimeframe { tag: s.to_string() })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Period {
    #[serde(rename = "1mo")]
    OneMonth,
    #[serde(rename = "3mo")]
    ThreeMonths,
    #[serde(rename = "6mo")]
    SixMonths,
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "2y")]
    TwoYears,
    #[serde(rename = "5y")]
    FiveYears,
    #[serde(rename = "10y")]
    TenYears,
    #[serde(rename = "max")]
    Max,
}

impl Period {
    pub const ALL: [Period; 8] = [
        Period::OneMonth,
        Period::ThreeMonths,
        Period::SixMonths,
        Period::OneYear,
        Period::TwoYears,
        Period::FiveYears,
        Period::TenYears,
        Period::Max,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::OneMonth => "1mo",
            Period::ThreeMonths => "3mo",
            Period::SixMonths => "6mo",
            Period::OneYear => "1y",
            Period::TwoYears => "2y",
            Period::FiveYears => "5y",
            Period::TenYears => "10y",
            Period::Max => "max",
        }
    }

    /// Calendar length, or `None` for the full available history.
    pub fn days(&self) -> Option<i64> {
        match self {
            Period::OneMonth => Some(30),
            Period::ThreeMonths => Some(91),
            Period::SixMonths => Some(182),
            Period::OneYear => Some(365),
            Period::TwoYears => Some(730),
            Period::FiveYears => Some(1826),
            Period::TenYears => Some(3652),
            Period::Max => None,
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = StratscanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_lowercase();
        Period::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == tag)
            .ok_or_else(|| StratscanError::InvalidPeriod { tag: s.to_string() })
    }
}

/// What the caller asked to evaluate: a trailing period or an explicit date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchRange {
    Period(Period),
    Dates { start: NaiveDate, end: NaiveDate },
}

/// The evaluation window plus the extended range that has to be fetched to
/// warm the indicators up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedRange {
    pub window_start: NaiveDateTime,
    pub fetch_start: NaiveDateTime,
    pub end: NaiveDateTime,
}

fn epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1970, 1, 1)
        .unwrap_or_default()
        .and_time(NaiveTime::MIN)
}

fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_opt(23, 59, 59)
        .unwrap_or_else(|| date.and_time(NaiveTime::MIN))
}

impl FetchRange {
    /// Explicit date ranges must run forwards.
    pub fn validate(&self) -> Result<(), StratscanError> {
        match *self {
            FetchRange::Dates { start, end } if start >= end => {
                Err(StratscanError::InvalidRange { start, end })
            }
            _ => Ok(()),
        }
    }

    pub fn resolve(&self, as_of: NaiveDate, timeframe: Timeframe) -> ResolvedRange {
        let (mut window_start, end) = match *self {
            FetchRange::Period(period) => {
                let end = end_of_day(as_of);
                let start = match period.days() {
                    Some(days) => (as_of - Duration::days(days)).and_time(NaiveTime::MIN),
                    None => epoch(),
                };
                (start, end)
            }
            FetchRange::Dates { start, end } => (start.and_time(NaiveTime::MIN), end_of_day(end)),
        };

        if timeframe.is_intraday() {
            let floor = end - Duration::days(INTRADAY_HISTORY_DAYS);
            if window_start < floor {
                window_start = floor;
            }
        }

        let fetch_start = window_start
            .checked_sub_signed(timeframe.warmup_span())
            .unwrap_or(NaiveDateTime::MIN);

        ResolvedRange {
            window_start,
            fetch_start,
            end,
        }
    }
}

impl fmt::Display for FetchRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchRange::Period(p) => write!(f, "{}", p),
            FetchRange::Dates { start, end } => write!(f, "{} to {}", start, end),
        }
    }
}

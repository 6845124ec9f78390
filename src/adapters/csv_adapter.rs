//! CSV file market data adapter.
//!
//! One file per symbol and interval: `<dir>/<SYMBOL>_<timeframe>.csv` with a
//! `time,open,high,low,close,volume` header.

use crate::domain::error::StratscanError;
use crate::domain::ohlcv::Bar;
use crate::domain::timeframe::Timeframe;
use crate::ports::data_port::MarketDataPort;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str, timeframe: Timeframe) -> PathBuf {
        self.base_path.join(format!("{}_{}.csv", symbol, timeframe))
    }
}

fn parse_time(raw: &str) -> Result<NaiveDateTime, StratscanError> {
    let raw = raw.trim();
    for fmt in DATETIME_FORMATS {
        if let Ok(t) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Ok(t);
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(d.and_time(chrono::NaiveTime::MIN));
    }
    if let Ok(secs) = raw.parse::<i64>() {
        if let Some(t) = DateTime::from_timestamp(secs, 0) {
            return Ok(t.naive_utc());
        }
    }
    Err(StratscanError::DataSource {
        reason: format!("invalid time value: {}", raw),
    })
}

fn parse_field(record: &csv::StringRecord, index: usize, name: &str) -> Result<f64, StratscanError> {
    record
        .get(index)
        .ok_or_else(|| StratscanError::DataSource {
            reason: format!("missing {} column", name),
        })?
        .trim()
        .parse()
        .map_err(|e| StratscanError::DataSource {
            reason: format!("invalid {} value: {}", name, e),
        })
}

impl MarketDataPort for CsvAdapter {
    fn fetch_bars(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Bar>, StratscanError> {
        let path = self.csv_path(symbol, timeframe);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no data file");
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(StratscanError::DataSource {
                    reason: format!("failed to read {}: {}", path.display(), e),
                })
            }
        };

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| StratscanError::DataSource {
                reason: format!("CSV parse error in {}: {}", path.display(), e),
            })?;

            let time_str = record.get(0).ok_or_else(|| StratscanError::DataSource {
                reason: "missing time column".into(),
            })?;
            let time = parse_time(time_str)?;

            if time < start || time > end {
                continue;
            }

            bars.push(Bar {
                time,
                open: parse_field(&record, 1, "open")?,
                high: parse_field(&record, 2, "high")?,
                low: parse_field(&record, 3, "low")?,
                close: parse_field(&record, 4, "close")?,
                volume: parse_field(&record, 5, "volume")?,
            });
        }

        bars.sort_by_key(|b| b.time);
        bars.dedup_by_key(|b| b.time);
        Ok(bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, StratscanError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| StratscanError::DataSource {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = BTreeSet::new();

        for entry in entries {
            let entry = entry.map_err(|e| StratscanError::DataSource {
                reason: format!("directory entry error: {}", e),
            })?;

            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            let Some(stem) = name_str.strip_suffix(".csv") else {
                continue;
            };
            let Some((symbol, tf)) = stem.rsplit_once('_') else {
                continue;
            };
            if tf.parse::<Timeframe>().is_ok() && !symbol.is_empty() {
                symbols.insert(symbol.to_string());
            }
        }

        Ok(symbols.into_iter().collect())
    }
}

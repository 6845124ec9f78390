//! Configuration validation and typed value parsing.
//!
//! Validates every known key before a run. Keys are optional unless noted;
//! command-line flags fill in what the file leaves out.

use std::str::FromStr;

use crate::domain::error::StratscanError;
use crate::domain::signal::StrategyKind;
use crate::domain::timeframe::{Period, Timeframe};
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub const DEFAULT_CAPITAL: f64 = 10_000.0;

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), StratscanError> {
    match config.get_string("data", "dir") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(StratscanError::ConfigMissing {
            section: "data".to_string(),
            key: "dir".to_string(),
        }),
    }
}

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), StratscanError> {
    validate_capital(config)?;
    parse_value::<Timeframe>(config, "backtest", "timeframe")?;
    parse_value::<Period>(config, "backtest", "period")?;
    parse_value::<StrategyKind>(config, "backtest", "strategy")?;
    validate_dates(config)?;
    validate_periods_per_year(config)?;
    Ok(())
}

pub fn validate_scan_config(config: &dyn ConfigPort) -> Result<(), StratscanError> {
    parse_list::<Timeframe>(config, "scan", "timeframes")?;
    parse_list::<Period>(config, "scan", "periods")?;
    parse_list::<StrategyKind>(config, "scan", "strategies")?;
    validate_min(config, "top_n", 1)?;
    validate_min(config, "workers", 0)?;
    validate_min(config, "timeout_secs", 0)?;
    validate_min(config, "min_bars", 2)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> StratscanError {
    StratscanError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

/// Parse an optional single value with the type's own `FromStr`.
pub fn parse_value<T>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<T>, StratscanError>
where
    T: FromStr<Err = StratscanError>,
{
    config
        .get_string(section, key)
        .map(|raw| raw.parse::<T>().map_err(|e| invalid(section, key, e.to_string())))
        .transpose()
}

/// Parse an optional comma separated list. A present but empty list is invalid.
pub fn parse_list<T>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<Vec<T>>, StratscanError>
where
    T: FromStr<Err = StratscanError>,
{
    let Some(items) = config.get_list(section, key) else {
        return Ok(None);
    };
    if items.is_empty() {
        return Err(invalid(section, key, format!("{} must not be empty", key)));
    }
    items
        .iter()
        .map(|item| item.parse::<T>().map_err(|e| invalid(section, key, e.to_string())))
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

pub fn parse_date(value: &str, section: &str, field: &str) -> Result<NaiveDate, StratscanError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| invalid(section, field, format!("invalid {} format, expected YYYY-MM-DD", field)))
}

fn validate_capital(config: &dyn ConfigPort) -> Result<(), StratscanError> {
    if config.get_string("backtest", "capital").is_none() {
        return Ok(());
    }
    let value = config.get_double("backtest", "capital", 0.0);
    if value <= 0.0 {
        return Err(invalid("backtest", "capital", "capital must be positive"));
    }
    Ok(())
}

fn validate_periods_per_year(config: &dyn ConfigPort) -> Result<(), StratscanError> {
    if config.get_string("backtest", "periods_per_year").is_none() {
        return Ok(());
    }
    let value = config.get_double("backtest", "periods_per_year", 0.0);
    if value <= 0.0 {
        return Err(invalid(
            "backtest",
            "periods_per_year",
            "periods_per_year must be positive",
        ));
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), StratscanError> {
    let start = config.get_string("backtest", "start_date");
    let end = config.get_string("backtest", "end_date");

    match (start, end) {
        (None, None) => Ok(()),
        (Some(s), Some(e)) => {
            let start_date = parse_date(&s, "backtest", "start_date")?;
            let end_date = parse_date(&e, "backtest", "end_date")?;
            if start_date >= end_date {
                return Err(invalid(
                    "backtest",
                    "start_date",
                    "start_date must be before end_date",
                ));
            }
            Ok(())
        }
        (Some(_), None) => Err(StratscanError::ConfigMissing {
            section: "backtest".to_string(),
            key: "end_date".to_string(),
        }),
        (None, Some(_)) => Err(StratscanError::ConfigMissing {
            section: "backtest".to_string(),
            key: "start_date".to_string(),
        }),
    }
}

fn validate_min(config: &dyn ConfigPort, key: &str, min: i64) -> Result<(), StratscanError> {
    let Some(raw) = config.get_string("scan", key) else {
        return Ok(());
    };
    match raw.trim().parse::<i64>() {
        Ok(v) if v >= min => Ok(()),
        Ok(_) => Err(invalid("scan", key, format!("{} must be at least {}", key, min))),
        Err(_) => Err(invalid("scan", key, format!("{} must be an integer", key))),
    }
}

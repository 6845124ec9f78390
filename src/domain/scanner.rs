//! Multi-symbol scanner: best configuration per symbol plus elite signals.
//!
//! Every (symbol, timeframe, period) combination is a unit of work. Units run
//! on a bounded rayon pool and only return values; picking the best candidate
//! per symbol happens afterwards, in enumeration order, so ties always resolve
//! to the earliest timeframe, then period, then strategy.

use std::fmt;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::Serialize;

use super::advisory::SignalAdvice;
use super::backtest::{evaluate, fetch_warm_history};
use super::error::StratscanError;
use super::indicator::compute_indicators;
use super::metrics::Metrics;
use super::signal::StrategyKind;
use super::timeframe::{FetchRange, Period, Timeframe};
use crate::ports::data_port::MarketDataPort;

pub const DEFAULT_SCAN_TIMEFRAMES: [Timeframe; 3] =
    [Timeframe::OneHour, Timeframe::FourHours, Timeframe::OneDay];
pub const DEFAULT_SCAN_PERIODS: [Period; 2] = [Period::SixMonths, Period::OneYear];
pub const DEFAULT_TOP_N: usize = 5;
/// Units with fewer fetched bars are skipped.
pub const DEFAULT_MIN_BARS: usize = 40;

pub const ELITE_MIN_WIN_RATE: f64 = 70.0;
pub const ELITE_MIN_TRADES: usize = 5;

/// Human-readable market condition implied by the winning strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarketRegime {
    ParabolicRun,
    StrongUptrend,
    TrendConfirmation,
    RangingVolatile,
    ReversalBounce,
}

impl MarketRegime {
    pub fn from_strategy(kind: StrategyKind) -> Self {
        match kind {
            StrategyKind::Momentum => MarketRegime::StrongUptrend,
            StrategyKind::MultiTimeframe => MarketRegime::TrendConfirmation,
            StrategyKind::Grid => MarketRegime::RangingVolatile,
            StrategyKind::MeanReversal => MarketRegime::ReversalBounce,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MarketRegime::ParabolicRun => "Parabolic Run (Buy & Hold)",
            MarketRegime::StrongUptrend => "Strong Uptrend",
            MarketRegime::TrendConfirmation => "Trend Confirmation",
            MarketRegime::RangingVolatile => "Ranging / Volatile",
            MarketRegime::ReversalBounce => "Reversal / Bounce",
        }
    }
}

impl fmt::Display for MarketRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for MarketRegime {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

#[derive(Debug, Clone)]
pub struct ScanRequest {
    pub symbols: Vec<String>,
    pub strategies: Vec<StrategyKind>,
    /// Listed smallest first so ties prefer the shorter interval.
    pub timeframes: Vec<Timeframe>,
    pub periods: Vec<Period>,
    pub capital: f64,
    pub as_of: NaiveDate,
    pub top_n: usize,
    /// Worker threads; 0 uses rayon's default.
    pub workers: usize,
    /// Units not started before this much time has passed are skipped.
    pub timeout: Option<Duration>,
    pub min_bars: usize,
    pub periods_per_year: Option<f64>,
}

impl ScanRequest {
    pub fn new(symbols: Vec<String>, capital: f64, as_of: NaiveDate) -> Self {
        ScanRequest {
            symbols,
            strategies: StrategyKind::ALL.to_vec(),
            timeframes: DEFAULT_SCAN_TIMEFRAMES.to_vec(),
            periods: DEFAULT_SCAN_PERIODS.to_vec(),
            capital,
            as_of,
            top_n: DEFAULT_TOP_N,
            workers: 0,
            timeout: None,
            min_bars: DEFAULT_MIN_BARS,
            periods_per_year: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanCandidate {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub period: Period,
    pub strategy: StrategyKind,
    pub regime: MarketRegime,
    pub metrics: Metrics,
    pub advice: Option<SignalAdvice>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    pub units_total: usize,
    pub units_evaluated: usize,
    pub units_skipped: usize,
    pub units_failed: usize,
    pub units_timed_out: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanReport {
    /// Best candidate per symbol, in input symbol order.
    pub results: Vec<ScanCandidate>,
    pub elite: Vec<ScanCandidate>,
    pub stats: ScanStats,
}

#[derive(Debug, Clone, Copy)]
struct ScanUnit<'a> {
    symbol_idx: usize,
    symbol: &'a str,
    timeframe: Timeframe,
    period: Period,
}

enum UnitOutcome {
    Evaluated(Vec<ScanCandidate>),
    Skipped,
    Failed,
    TimedOut,
}

fn enumerate_units(req: &ScanRequest) -> Vec<ScanUnit<'_>> {
    let mut units = Vec::with_capacity(req.symbols.len() * req.timeframes.len() * req.periods.len());
    for (symbol_idx, symbol) in req.symbols.iter().enumerate() {
        for &timeframe in &req.timeframes {
            for &period in &req.periods {
                units.push(ScanUnit {
                    symbol_idx,
                    symbol,
                    timeframe,
                    period,
                });
            }
        }
    }
    units
}

fn run_unit(
    port: &(dyn MarketDataPort + Sync),
    req: &ScanRequest,
    unit: ScanUnit<'_>,
    deadline: Option<Instant>,
) -> UnitOutcome {
    if deadline.is_some_and(|d| Instant::now() >= d) {
        return UnitOutcome::TimedOut;
    }

    let range = FetchRange::Period(unit.period).resolve(req.as_of, unit.timeframe);
    let bars = match fetch_warm_history(port, unit.symbol, unit.timeframe, &range) {
        Ok(bars) => bars,
        Err(e) => {
            tracing::warn!(
                symbol = unit.symbol,
                timeframe = %unit.timeframe,
                period = %unit.period,
                error = %e,
                "skipping unit after fetch failure"
            );
            return UnitOutcome::Failed;
        }
    };

    if bars.len() < req.min_bars {
        tracing::debug!(
            symbol = unit.symbol,
            timeframe = %unit.timeframe,
            period = %unit.period,
            bars = bars.len(),
            minimum = req.min_bars,
            "skipping unit with insufficient bars"
        );
        return UnitOutcome::Skipped;
    }

    let history = compute_indicators(&bars);
    let periods_per_year = req
        .periods_per_year
        .unwrap_or_else(|| unit.timeframe.periods_per_year());

    let candidates = req
        .strategies
        .iter()
        .map(|&strategy| {
            let eval = evaluate(&history, range.window_start, strategy, req.capital, periods_per_year);
            ScanCandidate {
                symbol: unit.symbol.to_string(),
                timeframe: unit.timeframe,
                period: unit.period,
                strategy,
                regime: MarketRegime::from_strategy(strategy),
                metrics: eval.metrics,
                advice: eval.advice,
            }
        })
        .collect();

    UnitOutcome::Evaluated(candidates)
}

/// Highest `net_profit` wins; an equal later candidate never displaces an
/// earlier one.
fn pick_best(candidates: impl IntoIterator<Item = ScanCandidate>) -> Option<ScanCandidate> {
    let mut best: Option<ScanCandidate> = None;
    for candidate in candidates {
        let better = match &best {
            Some(current) => candidate.metrics.net_profit > current.metrics.net_profit,
            None => true,
        };
        if better {
            best = Some(candidate);
        }
    }
    best
}

/// Candidates with a high win rate over enough trades, best first.
pub fn elite_signals(results: &[ScanCandidate], top_n: usize) -> Vec<ScanCandidate> {
    let mut elite: Vec<ScanCandidate> = results
        .iter()
        .filter(|c| {
            c.metrics.win_rate >= ELITE_MIN_WIN_RATE && c.metrics.total_trades >= ELITE_MIN_TRADES
        })
        .cloned()
        .collect();

    elite.sort_by(|a, b| {
        b.metrics
            .win_rate
            .total_cmp(&a.metrics.win_rate)
            .then_with(|| b.metrics.total_trades.cmp(&a.metrics.total_trades))
    });
    elite.truncate(top_n);
    elite
}

pub fn scan(
    port: &(dyn MarketDataPort + Sync),
    req: &ScanRequest,
) -> Result<ScanReport, StratscanError> {
    let units = enumerate_units(req);
    let deadline = req.timeout.map(|t| Instant::now() + t);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(req.workers)
        .build()
        .map_err(|e| StratscanError::WorkerPool {
            reason: e.to_string(),
        })?;

    tracing::info!(
        symbols = req.symbols.len(),
        units = units.len(),
        workers = pool.current_num_threads(),
        "starting scan"
    );

    let outcomes: Vec<(ScanUnit<'_>, UnitOutcome)> = pool.install(|| {
        units
            .par_iter()
            .map(|&unit| (unit, run_unit(port, req, unit, deadline)))
            .collect()
    });

    let mut stats = ScanStats {
        units_total: units.len(),
        ..ScanStats::default()
    };
    let mut per_symbol: Vec<Vec<ScanCandidate>> = vec![Vec::new(); req.symbols.len()];

    for (unit, outcome) in outcomes {
        match outcome {
            UnitOutcome::Evaluated(candidates) => {
                stats.units_evaluated += 1;
                per_symbol[unit.symbol_idx].extend(candidates);
            }
            UnitOutcome::Skipped => stats.units_skipped += 1,
            UnitOutcome::Failed => stats.units_failed += 1,
            UnitOutcome::TimedOut => stats.units_timed_out += 1,
        }
    }

    if stats.units_timed_out > 0 {
        tracing::warn!(
            skipped = stats.units_timed_out,
            "scan deadline reached before all units started"
        );
    }

    let results: Vec<ScanCandidate> = per_symbol.into_iter().filter_map(pick_best).collect();
    let elite = elite_signals(&results, req.top_n);

    tracing::info!(
        results = results.len(),
        elite = elite.len(),
        evaluated = stats.units_evaluated,
        skipped = stats.units_skipped,
        failed = stats.units_failed,
        "scan complete"
    );

    Ok(ScanReport {
        results,
        elite,
        stats,
    })
}

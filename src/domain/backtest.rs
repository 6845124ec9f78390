//! Backtest orchestration: fetch with warm-up, window, simulate, score.
//!
//! [`evaluate`] is the single engine entry. Indicators are computed over the
//! whole fetched history and the evaluation window is then sliced out of it,
//! so no rule ever sees an indicator that has not had its full lookback.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use super::advisory::{advise_latest, SignalAdvice};
use super::error::StratscanError;
use super::execution::{simulate, TradeMarker};
use super::indicator::{compute_indicators, IndicatorBar, Overlay};
use super::metrics::{round2, Benchmark, Metrics};
use super::ohlcv::{serialize_unix, Bar};
use super::portfolio::EquityPoint;
use super::scanner::MarketRegime;
use super::signal::StrategyKind;
use super::timeframe::{FetchRange, ResolvedRange, Timeframe, TREND_LOOKBACK_BARS};
use crate::ports::data_port::MarketDataPort;

/// The evaluation window never starts before this index of the fetched history.
pub const WARMUP_BARS: usize = 50;

/// Fewer fetched bars than this is rejected by [`run_backtest`].
pub const MIN_BACKTEST_BARS: usize = 30;

/// Times the warm-up span is doubled when too few bars precede the window.
const MAX_WARMUP_EXTENSIONS: u32 = 6;

/// Label used for the passive baseline in comparisons.
pub const BUY_HOLD_LABEL: &str = "HOLD ONLY";

#[derive(Debug, Clone)]
pub struct BacktestRequest {
    pub symbol: String,
    pub strategy: StrategyKind,
    pub capital: f64,
    pub timeframe: Timeframe,
    pub range: FetchRange,
    pub as_of: NaiveDate,
    /// Overrides the interval-derived annualization factor.
    pub periods_per_year: Option<f64>,
}

impl BacktestRequest {
    pub fn periods_per_year(&self) -> f64 {
        self.periods_per_year
            .unwrap_or_else(|| self.timeframe.periods_per_year())
    }
}

/// Everything [`evaluate`] produces for one strategy over one history.
#[derive(Debug, Clone)]
pub struct Evaluation {
    /// Indicator bars inside the evaluation window.
    pub window: Vec<IndicatorBar>,
    pub equity_curve: Vec<EquityPoint>,
    pub markers: Vec<TradeMarker>,
    pub metrics: Metrics,
    /// Advisory levels from the last bar of the full history.
    pub advice: Option<SignalAdvice>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OverlayPoint {
    #[serde(serialize_with = "serialize_unix")]
    pub time: NaiveDateTime,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlaySeries {
    pub overlay: Overlay,
    pub label: String,
    pub points: Vec<OverlayPoint>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BacktestReport {
    pub symbol: String,
    pub strategy: StrategyKind,
    pub timeframe: Timeframe,
    pub bars: Vec<IndicatorBar>,
    pub equity_curve: Vec<EquityPoint>,
    pub overlays: Vec<OverlaySeries>,
    pub markers: Vec<TradeMarker>,
    pub metrics: Metrics,
    pub advice: Option<SignalAdvice>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonEntry {
    pub strategy: String,
    pub regime: MarketRegime,
    pub net_profit: f64,
    pub win_rate: f64,
    pub total_trades: usize,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
    pub final_balance: f64,
}

impl ComparisonEntry {
    fn from_metrics(strategy: StrategyKind, m: &Metrics) -> Self {
        ComparisonEntry {
            strategy: strategy.tag().to_string(),
            regime: MarketRegime::from_strategy(strategy),
            net_profit: m.net_profit,
            win_rate: m.win_rate,
            total_trades: m.total_trades,
            sharpe_ratio: m.sharpe_ratio,
            max_drawdown: m.max_drawdown,
            final_balance: m.final_balance,
        }
    }

    /// Passive holding over the same window, expressed as one trade.
    fn buy_and_hold(m: &Metrics, capital: f64) -> Self {
        let net_profit = round2(capital * m.buy_hold_return / 100.0);
        ComparisonEntry {
            strategy: BUY_HOLD_LABEL.to_string(),
            regime: MarketRegime::ParabolicRun,
            net_profit,
            win_rate: if net_profit > 0.0 { 100.0 } else { 0.0 },
            total_trades: 1,
            sharpe_ratio: 0.0,
            max_drawdown: 0.0,
            final_balance: m.buy_hold_final,
        }
    }
}

/// First index of `history` that belongs to the evaluation window.
pub fn window_start_index(history: &[IndicatorBar], window_start: NaiveDateTime) -> usize {
    let by_time = history.partition_point(|b| b.bar.time < window_start);
    by_time.max(WARMUP_BARS)
}

/// Pure engine entry: window the history, simulate `kind` and score it.
pub fn evaluate(
    history: &[IndicatorBar],
    window_start: NaiveDateTime,
    kind: StrategyKind,
    capital: f64,
    periods_per_year: f64,
) -> Evaluation {
    let advice = advise_latest(history);
    let start = window_start_index(history, window_start);
    let window = history.get(start..).unwrap_or_default();

    let sim = simulate(window, kind, capital);
    let benchmark = Benchmark::buy_and_hold(window, capital);
    let metrics = Metrics::compute(
        &sim.trades,
        sim.final_equity,
        benchmark,
        &sim.equity_curve,
        capital,
        periods_per_year,
    );

    Evaluation {
        window: window.to_vec(),
        equity_curve: sim.equity_curve,
        markers: sim.markers,
        metrics,
        advice,
    }
}

pub fn overlay_series(window: &[IndicatorBar], kind: StrategyKind) -> Vec<OverlaySeries> {
    kind.overlays()
        .iter()
        .map(|&overlay| OverlaySeries {
            overlay,
            label: overlay.to_string(),
            points: window
                .iter()
                .map(|b| OverlayPoint {
                    time: b.bar.time,
                    value: overlay.value(b),
                })
                .collect(),
        })
        .collect()
}

/// Fetch `range` plus at least `TREND_LOOKBACK_BARS` bars before the window.
///
/// Calendar spans undercount bars for session-traded symbols, so the warm-up
/// span is doubled and re-fetched until enough bars precede the window or
/// the source has nothing older.
pub fn fetch_warm_history(
    port: &dyn MarketDataPort,
    symbol: &str,
    timeframe: Timeframe,
    range: &ResolvedRange,
) -> Result<Vec<Bar>, StratscanError> {
    let mut bars = port.fetch_bars(symbol, timeframe, range.fetch_start, range.end)?;
    let mut span = range.window_start - range.fetch_start;

    for _ in 0..MAX_WARMUP_EXTENSIONS {
        let warm = bars.partition_point(|b| b.time < range.window_start);
        if warm >= TREND_LOOKBACK_BARS as usize {
            break;
        }
        let Some((wider, start)) = span
            .checked_mul(2)
            .and_then(|wider| range.window_start.checked_sub_signed(wider).map(|start| (wider, start)))
        else {
            break;
        };
        span = wider;
        let extended = port.fetch_bars(symbol, timeframe, start, range.end)?;
        if extended.len() <= bars.len() {
            break;
        }
        tracing::debug!(
            symbol,
            timeframe = %timeframe,
            warm,
            fetched = extended.len(),
            "widened warm-up fetch"
        );
        bars = extended;
    }

    Ok(bars)
}

/// Fetch the warm-up-extended history and compute indicators over all of it.
/// Returns the indicator history and the resolved window start.
fn load_history(
    port: &dyn MarketDataPort,
    req: &BacktestRequest,
) -> Result<(Vec<IndicatorBar>, NaiveDateTime), StratscanError> {
    req.range.validate()?;
    let range = req.range.resolve(req.as_of, req.timeframe);
    let bars = fetch_warm_history(port, &req.symbol, req.timeframe, &range)?;

    if bars.is_empty() {
        return Err(StratscanError::NoData {
            symbol: req.symbol.clone(),
            timeframe: req.timeframe.to_string(),
        });
    }
    if bars.len() < MIN_BACKTEST_BARS {
        return Err(StratscanError::InsufficientData {
            symbol: req.symbol.clone(),
            bars: bars.len(),
            minimum: MIN_BACKTEST_BARS,
        });
    }

    tracing::debug!(
        symbol = %req.symbol,
        timeframe = %req.timeframe,
        bars = bars.len(),
        "fetched history"
    );

    Ok((compute_indicators(&bars), range.window_start))
}

pub fn run_backtest(
    port: &dyn MarketDataPort,
    req: &BacktestRequest,
) -> Result<BacktestReport, StratscanError> {
    let (history, window_start) = load_history(port, req)?;
    let eval = evaluate(
        &history,
        window_start,
        req.strategy,
        req.capital,
        req.periods_per_year(),
    );

    tracing::info!(
        symbol = %req.symbol,
        strategy = %req.strategy,
        timeframe = %req.timeframe,
        range = %req.range,
        trades = eval.metrics.total_trades,
        net_profit = eval.metrics.net_profit,
        "backtest complete"
    );

    Ok(BacktestReport {
        symbol: req.symbol.clone(),
        strategy: req.strategy,
        timeframe: req.timeframe,
        overlays: overlay_series(&eval.window, req.strategy),
        bars: eval.window,
        equity_curve: eval.equity_curve,
        markers: eval.markers,
        metrics: eval.metrics,
        advice: eval.advice,
    })
}

/// All four variants plus the buy-and-hold baseline over one history, best
/// net profit first. `req.strategy` is ignored.
pub fn compare_strategies(
    port: &dyn MarketDataPort,
    req: &BacktestRequest,
) -> Result<Vec<ComparisonEntry>, StratscanError> {
    let (history, window_start) = load_history(port, req)?;
    let periods_per_year = req.periods_per_year();

    let mut entries = Vec::with_capacity(StrategyKind::ALL.len() + 1);
    let mut baseline = None;

    for kind in StrategyKind::ALL {
        let eval = evaluate(&history, window_start, kind, req.capital, periods_per_year);
        if baseline.is_none() {
            baseline = Some(ComparisonEntry::buy_and_hold(&eval.metrics, req.capital));
        }
        entries.push(ComparisonEntry::from_metrics(kind, &eval.metrics));
    }
    entries.extend(baseline);

    entries.sort_by(|a, b| b.net_profit.total_cmp(&a.net_profit));

    tracing::info!(
        symbol = %req.symbol,
        timeframe = %req.timeframe,
        best = entries.first().map(|e| e.strategy.as_str()).unwrap_or(""),
        "comparison complete"
    );

    Ok(entries)
}

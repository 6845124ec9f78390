//! Execution simulator: replays one strategy over an evaluation window.
//!
//! The first bar only seeds `prev`; each later bar is evaluated through a
//! [`BarPair`], filled at its close, and appended to the equity curve.
//! Sizing is all-in, with no fees or slippage.

use chrono::NaiveDateTime;
use serde::Serialize;

use super::indicator::IndicatorBar;
use super::ohlcv::serialize_unix;
use super::portfolio::{Account, EquityPoint};
use super::position::ClosedTrade;
use super::signal::{evaluate, BarPair, Signal, StrategyKind};

/// Windows shorter than this produce an empty run.
pub const MIN_WINDOW_BARS: usize = 5;

/// A fill drawn on the price chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeMarker {
    #[serde(serialize_with = "serialize_unix")]
    pub time: NaiveDateTime,
    pub side: Signal,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResult {
    pub trades: Vec<ClosedTrade>,
    pub equity_curve: Vec<EquityPoint>,
    pub markers: Vec<TradeMarker>,
    pub final_equity: f64,
}

impl SimulationResult {
    /// Result for a window too short to trade.
    pub fn empty(initial_capital: f64) -> Self {
        SimulationResult {
            trades: Vec::new(),
            equity_curve: Vec::new(),
            markers: Vec::new(),
            final_equity: initial_capital,
        }
    }
}

pub fn simulate(window: &[IndicatorBar], kind: StrategyKind, initial_capital: f64) -> SimulationResult {
    if window.len() < MIN_WINDOW_BARS {
        return SimulationResult::empty(initial_capital);
    }

    let mut account = Account::new(initial_capital);
    let mut markers = Vec::new();

    for pair in BarPair::iter(window) {
        let bar = &pair.curr.bar;
        let filled = match evaluate(pair, kind) {
            Signal::Buy => account.enter_long(bar.close, bar.time).then_some(Signal::Buy),
            Signal::Sell => account.exit_long(bar.close, bar.time).then_some(Signal::Sell),
            Signal::Hold => None,
        };

        if let Some(side) = filled {
            markers.push(TradeMarker {
                time: bar.time,
                side,
                price: bar.close,
            });
        }

        account.record_equity(bar.time, bar.close);
    }

    let final_equity = account
        .equity_curve
        .last()
        .map(|p| p.value)
        .unwrap_or(account.cash);

    SimulationResult {
        trades: account.closed_trades,
        equity_curve: account.equity_curve,
        markers,
        final_equity,
    }
}

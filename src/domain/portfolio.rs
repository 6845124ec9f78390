//! Single-position account state and equity tracking.
//!
//! The account is either FLAT (`position == None`, all value in `cash`) or
//! LONG (`position == Some`, `cash == 0`). Entering while long and exiting
//! while flat are rejected, which is how the one-open-position invariant holds.

use chrono::NaiveDateTime;
use serde::Serialize;

use super::ohlcv::serialize_unix;
use super::position::{ClosedTrade, Position};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquityPoint {
    #[serde(serialize_with = "serialize_unix")]
    pub time: NaiveDateTime,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub cash: f64,
    pub initial_capital: f64,
    pub position: Option<Position>,
    pub closed_trades: Vec<ClosedTrade>,
    pub equity_curve: Vec<EquityPoint>,
}

impl Account {
    pub fn new(initial_capital: f64) -> Self {
        Account {
            cash: initial_capital,
            initial_capital,
            position: None,
            closed_trades: Vec::new(),
            equity_curve: Vec::new(),
        }
    }

    pub fn is_flat(&self) -> bool {
        self.position.is_none()
    }

    /// FLAT → LONG with the whole cash balance. Returns false (no-op) when
    /// already long or when the price cannot size a position.
    pub fn enter_long(&mut self, price: f64, time: NaiveDateTime) -> bool {
        if !self.is_flat() || price <= 0.0 {
            return false;
        }
        let size = self.cash / price;
        self.cash = 0.0;
        self.position = Some(Position {
            size,
            entry_price: price,
            entry_time: time,
        });
        true
    }

    /// LONG → FLAT at `price`, recording the closed trade. Returns false
    /// (no-op) when flat.
    pub fn exit_long(&mut self, price: f64, time: NaiveDateTime) -> bool {
        let Some(position) = self.position.take() else {
            return false;
        };
        self.cash = position.market_value(price);
        self.closed_trades.push(ClosedTrade {
            entry_time: position.entry_time,
            exit_time: time,
            entry_price: position.entry_price,
            exit_price: price,
            pnl_pct: position.return_at(price),
        });
        true
    }

    /// Mark-to-market value: cash when flat, position value when long.
    pub fn equity(&self, price: f64) -> f64 {
        match &self.position {
            Some(pos) => pos.market_value(price),
            None => self.cash,
        }
    }

    pub fn record_equity(&mut self, time: NaiveDateTime, price: f64) {
        let value = self.equity(price);
        self.equity_curve.push(EquityPoint { time, value });
    }
}

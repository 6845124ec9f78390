//! Strategy variants and their signal rules.
//!
//! A rule sees exactly two consecutive bars through [`BarPair`]; it cannot
//! reach further back or forward, so evaluation at index `i` only depends on
//! bars `i-1` and `i`.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::domain::error::StratscanError;
use crate::domain::indicator::{IndicatorBar, Overlay};

const RSI_OVERSOLD: f64 = 30.0;
const RSI_OVERBOUGHT: f64 = 70.0;
const TREND_PULLBACK_RSI: f64 = 40.0;
const TREND_EXHAUSTION_RSI: f64 = 75.0;
/// Fraction of the grid range that forms the buy zone (bottom) and sell zone (top).
const GRID_ZONE: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Signal {
    #[serde(rename = "BUY")]
    Buy,
    #[serde(rename = "SELL")]
    Sell,
    #[serde(rename = "HOLD")]
    Hold,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Buy => write!(f, "BUY"),
            Signal::Sell => write!(f, "SELL"),
            Signal::Hold => write!(f, "HOLD"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StrategyKind {
    #[serde(rename = "MOMENTUM")]
    Momentum,
    #[serde(rename = "MEAN_REVERSAL")]
    MeanReversal,
    #[serde(rename = "GRID")]
    Grid,
    #[serde(rename = "MULTITIMEFRAME")]
    MultiTimeframe,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 4] = [
        StrategyKind::Momentum,
        StrategyKind::MeanReversal,
        StrategyKind::Grid,
        StrategyKind::MultiTimeframe,
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            StrategyKind::Momentum => "MOMENTUM",
            StrategyKind::MeanReversal => "MEAN_REVERSAL",
            StrategyKind::Grid => "GRID",
            StrategyKind::MultiTimeframe => "MULTITIMEFRAME",
        }
    }

    /// Chart lines relevant to this variant's rules.
    pub fn overlays(&self) -> &'static [Overlay] {
        match self {
            StrategyKind::Momentum => &[Overlay::SmaFast, Overlay::SmaSlow],
            StrategyKind::MeanReversal => &[Overlay::BbUpper, Overlay::BbLower],
            StrategyKind::Grid => &[Overlay::GridTop, Overlay::GridBottom, Overlay::GridMid],
            StrategyKind::MultiTimeframe => &[Overlay::EmaTrend],
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for StrategyKind {
    type Err = StratscanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_uppercase();
        StrategyKind::ALL
            .iter()
            .copied()
            .find(|k| k.tag() == tag)
            .ok_or_else(|| StratscanError::InvalidStrategy { tag: s.to_string() })
    }
}

/// Two consecutive indicator bars: the only input a rule may read.
#[derive(Debug, Clone, Copy)]
pub struct BarPair<'a> {
    pub prev: &'a IndicatorBar,
    pub curr: &'a IndicatorBar,
}

impl<'a> BarPair<'a> {
    pub fn new(prev: &'a IndicatorBar, curr: &'a IndicatorBar) -> Self {
        Self { prev, curr }
    }

    /// Sliding pairs over a window: (w[0], w[1]), (w[1], w[2]), ...
    pub fn iter(window: &'a [IndicatorBar]) -> impl Iterator<Item = BarPair<'a>> + 'a {
        window.windows(2).map(|w| BarPair::new(&w[0], &w[1]))
    }
}

pub fn evaluate(pair: BarPair<'_>, kind: StrategyKind) -> Signal {
    match kind {
        StrategyKind::Momentum => momentum(pair),
        StrategyKind::MeanReversal => mean_reversal(pair),
        StrategyKind::Grid => grid(pair),
        StrategyKind::MultiTimeframe => multi_timeframe(pair),
    }
}

fn momentum(BarPair { prev, curr }: BarPair<'_>) -> Signal {
    if prev.sma_fast < prev.sma_slow && curr.sma_fast > curr.sma_slow {
        Signal::Buy
    } else if prev.sma_fast > prev.sma_slow && curr.sma_fast < curr.sma_slow {
        Signal::Sell
    } else {
        Signal::Hold
    }
}

fn mean_reversal(BarPair { curr, .. }: BarPair<'_>) -> Signal {
    if curr.rsi < RSI_OVERSOLD && curr.close() < curr.bb_lower {
        Signal::Buy
    } else if curr.rsi > RSI_OVERBOUGHT && curr.close() > curr.bb_upper {
        Signal::Sell
    } else {
        Signal::Hold
    }
}

fn grid(BarPair { curr, .. }: BarPair<'_>) -> Signal {
    let range = curr.grid_top - curr.grid_bottom;
    let buy_zone = curr.grid_bottom + range * GRID_ZONE;
    let sell_zone = curr.grid_top - range * GRID_ZONE;

    if curr.close() <= buy_zone {
        Signal::Buy
    } else if curr.close() >= sell_zone {
        Signal::Sell
    } else {
        Signal::Hold
    }
}

fn multi_timeframe(BarPair { curr, .. }: BarPair<'_>) -> Signal {
    let uptrend = curr.close() > curr.ema_trend;
    if uptrend && curr.rsi < TREND_PULLBACK_RSI {
        Signal::Buy
    } else if curr.rsi > TREND_EXHAUSTION_RSI {
        Signal::Sell
    } else {
        Signal::Hold
    }
}

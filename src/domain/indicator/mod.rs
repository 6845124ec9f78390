//! Indicator pipeline.
//!
//! [`compute_indicators`] runs every indicator over the full fetched history
//! and returns one [`IndicatorBar`] per input bar, in order. Values that need
//! more history than is available are `0.0`; callers keep such bars out of
//! evaluation by windowing (see `domain::backtest`), not by inspecting values.

pub mod atr;
pub mod bollinger;
pub mod channel;
pub mod ema;
pub mod rsi;
pub mod sma;

use serde::Serialize;
use std::fmt;

use crate::domain::ohlcv::Bar;

pub const SMA_FAST_PERIOD: usize = 10;
pub const SMA_SLOW_PERIOD: usize = 50;
pub const BOLLINGER_PERIOD: usize = 20;
pub const BOLLINGER_MULTIPLIER: f64 = 2.0;
pub const RSI_PERIOD: usize = 14;
pub const GRID_PERIOD: usize = 50;
pub const EMA_TREND_SPAN: usize = 200;
pub const ATR_PERIOD: usize = 14;

/// A bar plus every derived column the strategy rules read.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorBar {
    #[serde(flatten)]
    pub bar: Bar,
    pub sma_fast: f64,
    pub sma_slow: f64,
    pub bb_mid: f64,
    pub bb_upper: f64,
    pub bb_lower: f64,
    pub rsi: f64,
    pub grid_top: f64,
    pub grid_bottom: f64,
    pub grid_mid: f64,
    pub ema_trend: f64,
    pub atr: f64,
}

impl IndicatorBar {
    pub fn close(&self) -> f64 {
        self.bar.close
    }
}

pub fn compute_indicators(bars: &[Bar]) -> Vec<IndicatorBar> {
    let sma_fast = sma::calculate_sma(bars, SMA_FAST_PERIOD);
    let sma_slow = sma::calculate_sma(bars, SMA_SLOW_PERIOD);
    let bands = bollinger::calculate_bollinger(bars, BOLLINGER_PERIOD, BOLLINGER_MULTIPLIER);
    let rsi = rsi::calculate_rsi(bars, RSI_PERIOD);
    let grid = channel::calculate_channel(bars, GRID_PERIOD);
    let ema_trend = ema::calculate_ema(bars, EMA_TREND_SPAN);
    let atr = atr::calculate_atr(bars, ATR_PERIOD);

    bars.iter()
        .enumerate()
        .map(|(i, bar)| IndicatorBar {
            bar: bar.clone(),
            sma_fast: finite_or_zero(sma_fast[i]),
            sma_slow: finite_or_zero(sma_slow[i]),
            bb_mid: finite_or_zero(bands[i].middle),
            bb_upper: finite_or_zero(bands[i].upper),
            bb_lower: finite_or_zero(bands[i].lower),
            rsi: finite_or_zero(rsi[i]),
            grid_top: finite_or_zero(grid[i].top),
            grid_bottom: finite_or_zero(grid[i].bottom),
            grid_mid: finite_or_zero(grid[i].mid),
            ema_trend: finite_or_zero(ema_trend[i]),
            atr: finite_or_zero(atr[i]),
        })
        .collect()
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() { v } else { 0.0 }
}

/// Indicator lines drawn over the price chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Overlay {
    SmaFast,
    SmaSlow,
    BbUpper,
    BbLower,
    GridTop,
    GridBottom,
    GridMid,
    EmaTrend,
}

impl Overlay {
    pub fn value(&self, bar: &IndicatorBar) -> f64 {
        match self {
            Overlay::SmaFast => bar.sma_fast,
            Overlay::SmaSlow => bar.sma_slow,
            Overlay::BbUpper => bar.bb_upper,
            Overlay::BbLower => bar.bb_lower,
            Overlay::GridTop => bar.grid_top,
            Overlay::GridBottom => bar.grid_bottom,
            Overlay::GridMid => bar.grid_mid,
            Overlay::EmaTrend => bar.ema_trend,
        }
    }
}

impl fmt::Display for Overlay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Overlay::SmaFast => write!(f, "SMA({})", SMA_FAST_PERIOD),
            Overlay::SmaSlow => write!(f, "SMA({})", SMA_SLOW_PERIOD),
            Overlay::BbUpper => write!(f, "BB_UPPER({},{})", BOLLINGER_PERIOD, BOLLINGER_MULTIPLIER),
            Overlay::BbLower => write!(f, "BB_LOWER({},{})", BOLLINGER_PERIOD, BOLLINGER_MULTIPLIER),
            Overlay::GridTop => write!(f, "GRID_TOP({})", GRID_PERIOD),
            Overlay::GridBottom => write!(f, "GRID_BOTTOM({})", GRID_PERIOD),
            Overlay::GridMid => write!(f, "GRID_MID({})", GRID_PERIOD),
            Overlay::EmaTrend => write!(f, "EMA({})", EMA_TREND_SPAN),
        }
    }
}

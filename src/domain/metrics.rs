//! Performance metrics and statistics.
//!
//! Ratios are computed at full precision; the returned [`Metrics`] snapshot is
//! rounded to cents / hundredths of a percent for presentation.

use serde::Serialize;

use super::indicator::IndicatorBar;
use super::portfolio::EquityPoint;
use super::position::ClosedTrade;

/// Passive buy-and-hold over the same window the strategy traded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Benchmark {
    /// Percent return, e.g. 50.0 for +50%.
    pub return_pct: f64,
    pub final_value: f64,
}

impl Benchmark {
    /// Hold from the window's first close to its last close.
    pub fn buy_and_hold(window: &[IndicatorBar], initial_capital: f64) -> Self {
        match (window.first(), window.last()) {
            (Some(first), Some(last)) => Self::from_prices(first.close(), last.close(), initial_capital),
            _ => Self::flat(initial_capital),
        }
    }

    pub fn from_prices(start_price: f64, end_price: f64, initial_capital: f64) -> Self {
        if start_price <= 0.0 {
            return Self::flat(initial_capital);
        }
        let return_pct = (end_price - start_price) / start_price * 100.0;
        Benchmark {
            return_pct,
            final_value: initial_capital * (1.0 + return_pct / 100.0),
        }
    }

    pub fn flat(initial_capital: f64) -> Self {
        Benchmark {
            return_pct: 0.0,
            final_value: initial_capital,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metrics {
    pub initial_balance: f64,
    pub final_balance: f64,
    pub net_profit: f64,
    pub win_rate: f64,
    pub total_trades: usize,
    pub buy_hold_return: f64,
    pub buy_hold_final: f64,
    pub vs_benchmark: f64,
    pub max_drawdown: f64,
    pub sharpe_ratio: f64,
    pub calmar_ratio: f64,
}

impl Metrics {
    pub fn compute(
        trades: &[ClosedTrade],
        final_equity: f64,
        benchmark: Benchmark,
        equity_curve: &[EquityPoint],
        initial_capital: f64,
        periods_per_year: f64,
    ) -> Self {
        let total_trades = trades.len();
        let wins = trades.iter().filter(|t| t.is_win()).count();
        let win_rate = if total_trades > 0 {
            wins as f64 / total_trades as f64 * 100.0
        } else {
            0.0
        };

        let net_profit = final_equity - initial_capital;
        let max_drawdown = compute_drawdown(equity_curve) * 100.0;
        let sharpe_ratio = compute_sharpe(equity_curve, periods_per_year);

        let calmar_ratio = if max_drawdown > 0.0 && initial_capital > 0.0 {
            (net_profit / initial_capital) / (max_drawdown / 100.0)
        } else {
            0.0
        };

        let vs_benchmark = if benchmark.final_value > 0.0 {
            (final_equity - benchmark.final_value) / benchmark.final_value * 100.0
        } else {
            0.0
        };

        Metrics {
            initial_balance: initial_capital,
            final_balance: round2(final_equity),
            net_profit: round2(net_profit),
            win_rate: round2(win_rate),
            total_trades,
            buy_hold_return: round2(benchmark.return_pct),
            buy_hold_final: round2(benchmark.final_value),
            vs_benchmark: round2(vs_benchmark),
            max_drawdown: round2(max_drawdown),
            sharpe_ratio: round2(sharpe_ratio),
            calmar_ratio: round2(calmar_ratio),
        }
    }

    /// Metrics for a run that could not trade (window too short).
    pub fn degenerate(initial_capital: f64) -> Self {
        Self::compute(
            &[],
            initial_capital,
            Benchmark::flat(initial_capital),
            &[],
            initial_capital,
            0.0,
        )
    }
}

pub fn round2(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    (value * 100.0).round() / 100.0
}

/// Largest peak-to-trough decline as a fraction of the running peak.
fn compute_drawdown(equity_curve: &[EquityPoint]) -> f64 {
    let Some(first) = equity_curve.first() else {
        return 0.0;
    };

    let mut peak = first.value;
    let mut max_dd = 0.0_f64;

    for point in equity_curve {
        if point.value > peak {
            peak = point.value;
        } else if peak > 0.0 {
            max_dd = max_dd.max((peak - point.value) / peak);
        }
    }

    max_dd
}

/// Annualized mean/stddev of per-bar percent changes, zero risk-free rate.
fn compute_sharpe(equity_curve: &[EquityPoint], periods_per_year: f64) -> f64 {
    if equity_curve.len() < 2 {
        return 0.0;
    }

    let returns: Vec<f64> = equity_curve
        .windows(2)
        .map(|w| {
            let prev = w[0].value;
            if prev > 0.0 {
                (w[1].value - prev) / prev
            } else {
                0.0
            }
        })
        .collect();

    // Sample stddev needs at least two observations.
    if returns.len() < 2 {
        return 0.0;
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let stddev = variance.sqrt();

    if stddev > 0.0 {
        mean / stddev * periods_per_year.sqrt()
    } else {
        0.0
    }
}

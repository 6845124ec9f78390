//! CLI definition and dispatch.

use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{self, BacktestReport, BacktestRequest, ComparisonEntry};
use crate::domain::config_validation::{
    parse_date, parse_list, parse_value, validate_backtest_config, validate_data_config,
    validate_scan_config, DEFAULT_CAPITAL,
};
use crate::domain::error::StratscanError;
use crate::domain::scanner::{self, ScanReport, ScanRequest};
use crate::domain::signal::StrategyKind;
use crate::domain::timeframe::{FetchRange, Period, Timeframe};
use crate::domain::universe::{parse_symbols, SymbolCatalog};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::MarketDataPort;

#[derive(Parser, Debug)]
#[command(name = "stratscan", about = "Strategy backtester and market scanner")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every command that reads market data.
#[derive(Args, Debug, Clone)]
pub struct DataArgs {
    #[arg(short, long)]
    pub config: PathBuf,
    /// Directory of `<SYMBOL>_<timeframe>.csv` files (overrides [data] dir)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
    /// Evaluate as if today were this date (YYYY-MM-DD)
    #[arg(long)]
    pub as_of: Option<NaiveDate>,
    #[arg(long)]
    pub capital: Option<f64>,
    /// Write the full result as JSON
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Symbol, interval and window for a single-symbol run.
#[derive(Args, Debug, Clone)]
pub struct RangeArgs {
    #[arg(long)]
    pub symbol: String,
    #[arg(short, long)]
    pub timeframe: Option<String>,
    #[arg(short, long)]
    pub period: Option<String>,
    #[arg(long, requires = "end")]
    pub start: Option<NaiveDate>,
    #[arg(long, requires = "start")]
    pub end: Option<NaiveDate>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Backtest one strategy on one symbol
    Backtest {
        #[command(flatten)]
        data: DataArgs,
        #[command(flatten)]
        range: RangeArgs,
        #[arg(short, long)]
        strategy: Option<String>,
    },
    /// Run every strategy plus buy-and-hold on one symbol
    Compare {
        #[command(flatten)]
        data: DataArgs,
        #[command(flatten)]
        range: RangeArgs,
    },
    /// Find the best configuration for each symbol of a sector or list
    Scan {
        #[command(flatten)]
        data: DataArgs,
        #[arg(long, conflicts_with = "symbols")]
        sector: Option<String>,
        /// Comma separated symbols, e.g. BTC-USD,ETH-USD
        #[arg(long)]
        symbols: Option<String>,
        #[arg(long)]
        top_n: Option<usize>,
        #[arg(long)]
        workers: Option<usize>,
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List symbols that have data files
    ListSymbols {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// List sectors available to `scan --sector`
    Sectors {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Backtest {
            data,
            range,
            strategy,
        } => run_backtest(&data, &range, strategy.as_deref()),
        Command::Compare { data, range } => run_compare(&data, &range),
        Command::Scan {
            data,
            sector,
            symbols,
            top_n,
            workers,
            timeout_secs,
        } => run_scan(
            &data,
            sector.as_deref(),
            symbols.as_deref(),
            ScanOverrides {
                top_n,
                workers,
                timeout_secs,
            },
        ),
        Command::Validate { config } => run_validate(&config),
        Command::ListSymbols { config, data_dir } => run_list_symbols(&config, data_dir.as_ref()),
        Command::Sectors { config } => run_sectors(config.as_ref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, StratscanError> {
    FileConfigAdapter::from_file(path).map_err(|e| StratscanError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

fn open_data_port(
    config: &dyn ConfigPort,
    data_dir: Option<&PathBuf>,
) -> Result<CsvAdapter, StratscanError> {
    let dir = match data_dir {
        Some(dir) => dir.clone(),
        None => {
            validate_data_config(config)?;
            PathBuf::from(config.get_string("data", "dir").unwrap_or_default().trim())
        }
    };
    tracing::debug!(dir = %dir.display(), "using CSV data directory");
    Ok(CsvAdapter::new(dir))
}

fn as_of_date(data: &DataArgs) -> NaiveDate {
    data.as_of.unwrap_or_else(|| Local::now().date_naive())
}

fn resolve_capital(config: &dyn ConfigPort, data: &DataArgs) -> Result<f64, StratscanError> {
    let capital = data
        .capital
        .unwrap_or_else(|| config.get_double("backtest", "capital", DEFAULT_CAPITAL));
    if capital <= 0.0 || !capital.is_finite() {
        return Err(StratscanError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "capital".to_string(),
            reason: "capital must be positive".to_string(),
        });
    }
    Ok(capital)
}

/// CLI flags win over `[backtest]`; explicit dates win over a period.
fn resolve_range(config: &dyn ConfigPort, range: &RangeArgs) -> Result<FetchRange, StratscanError> {
    if let (Some(start), Some(end)) = (range.start, range.end) {
        let dates = FetchRange::Dates { start, end };
        dates.validate()?;
        return Ok(dates);
    }
    if let Some(period) = &range.period {
        return Ok(FetchRange::Period(period.parse::<Period>()?));
    }
    if let (Some(s), Some(e)) = (
        config.get_string("backtest", "start_date"),
        config.get_string("backtest", "end_date"),
    ) {
        return Ok(FetchRange::Dates {
            start: parse_date(&s, "backtest", "start_date")?,
            end: parse_date(&e, "backtest", "end_date")?,
        });
    }
    let period = parse_value::<Period>(config, "backtest", "period")?.unwrap_or(Period::OneYear);
    Ok(FetchRange::Period(period))
}

pub fn build_backtest_request(
    config: &dyn ConfigPort,
    data: &DataArgs,
    range: &RangeArgs,
    strategy: Option<&str>,
) -> Result<BacktestRequest, StratscanError> {
    validate_backtest_config(config)?;

    let strategy = match strategy {
        Some(tag) => tag.parse::<StrategyKind>()?,
        None => parse_value::<StrategyKind>(config, "backtest", "strategy")?
            .unwrap_or(StrategyKind::Momentum),
    };
    let timeframe = match &range.timeframe {
        Some(tag) => tag.parse::<Timeframe>()?,
        None => parse_value::<Timeframe>(config, "backtest", "timeframe")?
            .unwrap_or(Timeframe::OneDay),
    };
    let periods_per_year = config
        .get_string("backtest", "periods_per_year")
        .map(|_| config.get_double("backtest", "periods_per_year", 252.0));

    Ok(BacktestRequest {
        symbol: range.symbol.trim().to_uppercase(),
        strategy,
        capital: resolve_capital(config, data)?,
        timeframe,
        range: resolve_range(config, range)?,
        as_of: as_of_date(data),
        periods_per_year,
    })
}

struct ScanOverrides {
    top_n: Option<usize>,
    workers: Option<usize>,
    timeout_secs: Option<u64>,
}

fn resolve_scan_symbols(
    config: &dyn ConfigPort,
    sector: Option<&str>,
    symbols: Option<&str>,
) -> Result<Vec<String>, StratscanError> {
    if let Some(list) = symbols {
        return parse_symbols(list);
    }
    let sector = match sector {
        Some(s) => s.to_string(),
        None => config
            .get_string("scan", "sector")
            .ok_or_else(|| StratscanError::InvalidSymbols {
                reason: "use --sector or --symbols (or set [scan] sector)".to_string(),
            })?,
    };
    SymbolCatalog::from_config(config)?.resolve(&sector)
}

fn build_scan_request(
    config: &dyn ConfigPort,
    data: &DataArgs,
    symbols: Vec<String>,
    overrides: &ScanOverrides,
) -> Result<ScanRequest, StratscanError> {
    validate_scan_config(config)?;

    let mut req = ScanRequest::new(symbols, resolve_capital(config, data)?, as_of_date(data));
    if let Some(tfs) = parse_list::<Timeframe>(config, "scan", "timeframes")? {
        req.timeframes = tfs;
    }
    if let Some(periods) = parse_list::<Period>(config, "scan", "periods")? {
        req.periods = periods;
    }
    if let Some(strategies) = parse_list::<StrategyKind>(config, "scan", "strategies")? {
        req.strategies = strategies;
    }
    req.top_n = overrides
        .top_n
        .unwrap_or_else(|| config.get_int("scan", "top_n", req.top_n as i64).max(1) as usize);
    req.workers = overrides
        .workers
        .unwrap_or_else(|| config.get_int("scan", "workers", 0).max(0) as usize);
    req.min_bars = config.get_int("scan", "min_bars", req.min_bars as i64).max(2) as usize;

    // 0 means no deadline, unlike `Duration::ZERO` on a ScanRequest.
    let timeout_secs = overrides
        .timeout_secs
        .or_else(|| u64::try_from(config.get_int("scan", "timeout_secs", 0)).ok())
        .filter(|&s| s > 0);
    req.timeout = timeout_secs.map(Duration::from_secs);

    if config.get_string("backtest", "periods_per_year").is_some() {
        req.periods_per_year = Some(config.get_double("backtest", "periods_per_year", 252.0));
    }
    Ok(req)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StratscanError> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(BufWriter::new(file), value)?;
    eprintln!("\nResults written to: {}", path.display());
    Ok(())
}

fn run_backtest(
    data: &DataArgs,
    range: &RangeArgs,
    strategy: Option<&str>,
) -> Result<(), StratscanError> {
    eprintln!("Loading config from {}", data.config.display());
    let config = load_config(&data.config)?;
    let req = build_backtest_request(&config, data, range, strategy)?;
    let port = open_data_port(&config, data.data_dir.as_ref())?;

    eprintln!(
        "Running {} on {} ({}, {})",
        req.strategy, req.symbol, req.timeframe, req.range
    );
    let report = backtest::run_backtest(&port, &req)?;
    print_backtest_summary(&report);

    if let Some(path) = &data.output {
        write_json(path, &report)?;
    }
    Ok(())
}

fn print_backtest_summary(report: &BacktestReport) {
    let m = &report.metrics;
    eprintln!("\n=== {} {} ({}) ===", report.symbol, report.strategy, report.timeframe);
    eprintln!("Bars evaluated:   {}", report.bars.len());
    eprintln!("Final Balance:    {:.2}", m.final_balance);
    eprintln!("Net Profit:       {:.2}", m.net_profit);
    eprintln!("Win Rate:         {:.2}%", m.win_rate);
    eprintln!("Total Trades:     {}", m.total_trades);
    eprintln!("Max Drawdown:     {:.2}%", m.max_drawdown);
    eprintln!("Sharpe Ratio:     {:.2}", m.sharpe_ratio);
    eprintln!("Calmar Ratio:     {:.2}", m.calmar_ratio);
    eprintln!(
        "Buy & Hold:       {:.2}% (strategy {:+.2}% vs benchmark)",
        m.buy_hold_return, m.vs_benchmark
    );
    if let Some(advice) = &report.advice {
        eprintln!(
            "Advice @ {:.4}:   long TP {:.4} SL {:.4} | short TP {:.4} SL {:.4}",
            advice.price,
            advice.setup_long.tp,
            advice.setup_long.sl,
            advice.setup_short.tp,
            advice.setup_short.sl
        );
    }
}

fn run_compare(data: &DataArgs, range: &RangeArgs) -> Result<(), StratscanError> {
    eprintln!("Loading config from {}", data.config.display());
    let config = load_config(&data.config)?;
    let req = build_backtest_request(&config, data, range, None)?;
    let port = open_data_port(&config, data.data_dir.as_ref())?;

    eprintln!("Comparing strategies on {} ({}, {})", req.symbol, req.timeframe, req.range);
    let entries = backtest::compare_strategies(&port, &req)?;
    print_comparison(&entries);

    if let Some(path) = &data.output {
        write_json(path, &entries)?;
    }
    Ok(())
}

fn print_comparison(entries: &[ComparisonEntry]) {
    eprintln!("\n=== Strategy Comparison ===");
    for e in entries {
        eprintln!(
            "  {:<15} {:>12.2}  {:>6.2}% win  {:>4} trades  sharpe {:>6.2}  [{}]",
            e.strategy, e.net_profit, e.win_rate, e.total_trades, e.sharpe_ratio, e.regime
        );
    }
}

fn run_scan(
    data: &DataArgs,
    sector: Option<&str>,
    symbols: Option<&str>,
    overrides: ScanOverrides,
) -> Result<(), StratscanError> {
    eprintln!("Loading config from {}", data.config.display());
    let config = load_config(&data.config)?;
    let symbols = resolve_scan_symbols(&config, sector, symbols)?;
    let req = build_scan_request(&config, data, symbols, &overrides)?;
    let port = open_data_port(&config, data.data_dir.as_ref())?;

    eprintln!(
        "Scanning {} symbols x {} timeframes x {} periods",
        req.symbols.len(),
        req.timeframes.len(),
        req.periods.len()
    );
    let report = scanner::scan(&port, &req)?;
    print_scan_summary(&report);

    if let Some(path) = &data.output {
        write_json(path, &report)?;
    }
    Ok(())
}

fn print_scan_summary(report: &ScanReport) {
    eprintln!("\n=== Best Configuration per Symbol ===");
    for c in &report.results {
        eprintln!(
            "  {:<12} {:<4} {:<4} {:<15} {:>12.2}  {:>6.2}% win  {:>4} trades  [{}]",
            c.symbol,
            c.timeframe,
            c.period,
            c.strategy,
            c.metrics.net_profit,
            c.metrics.win_rate,
            c.metrics.total_trades,
            c.regime
        );
    }

    if !report.elite.is_empty() {
        eprintln!("\n=== Elite Signals ===");
        for c in &report.elite {
            eprintln!(
                "  {:<12} {:<15} {:>6.2}% win over {} trades",
                c.symbol, c.strategy, c.metrics.win_rate, c.metrics.total_trades
            );
        }
    }

    let s = &report.stats;
    eprintln!(
        "\n{} units: {} evaluated, {} skipped, {} failed, {} timed out",
        s.units_total, s.units_evaluated, s.units_skipped, s.units_failed, s.units_timed_out
    );
}

fn run_validate(config_path: &Path) -> Result<(), StratscanError> {
    eprintln!("Validating config: {}", config_path.display());
    let config = load_config(config_path)?;

    validate_data_config(&config)?;
    validate_backtest_config(&config)?;
    validate_scan_config(&config)?;
    let catalog = SymbolCatalog::from_config(&config)?;

    eprintln!("  [data] dir = {}", config.get_string("data", "dir").unwrap_or_default());
    eprintln!("  {} sectors defined", catalog.sectors().len());
    eprintln!("\nConfiguration is valid.");
    Ok(())
}

fn run_list_symbols(config_path: &Path, data_dir: Option<&PathBuf>) -> Result<(), StratscanError> {
    let config = load_config(config_path)?;
    let port = open_data_port(&config, data_dir)?;
    let symbols = port.list_symbols()?;

    if symbols.is_empty() {
        eprintln!("No symbols found");
    } else {
        for symbol in &symbols {
            println!("{}", symbol);
        }
        eprintln!("{} symbols found", symbols.len());
    }
    Ok(())
}

fn run_sectors(config_path: Option<&PathBuf>) -> Result<(), StratscanError> {
    let catalog = match config_path {
        Some(path) => SymbolCatalog::from_config(&load_config(path)?)?,
        None => SymbolCatalog::builtin(),
    };
    for sector in catalog.sectors() {
        println!("{}: {}", sector.name, sector.symbols.join(", "));
    }
    Ok(())
}

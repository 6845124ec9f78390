//! CLI integration tests against real INI files and CSV data on disk.
//!
//! Tests cover:
//! - Config loading and request building (build_backtest_request)
//! - End-to-end backtest, compare and scan commands writing JSON output
//! - Exit codes for config, input and data-availability failures

mod common;

use common::*;
use std::fmt::Write as _;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use stratscan::cli::{self, Cli, DataArgs, RangeArgs};
use stratscan::domain::error::StratscanError;
use stratscan::domain::signal::StrategyKind;
use stratscan::domain::timeframe::{FetchRange, Timeframe};
use clap::Parser;
use tempfile::TempDir;

fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

/// A data directory holding `WAVE_1d.csv` with 950 daily bars from 2022-06-01.
fn data_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    let mut csv = String::from("time,open,high,low,close,volume\n");
    for bar in daily_bars(date(2022, 6, 1), &wave_closes(950)) {
        writeln!(
            csv,
            "{},{},{},{},{},{}",
            bar.time.format("%Y-%m-%d"),
            bar.open,
            bar.high,
            bar.low,
            bar.close,
            bar.volume
        )
        .unwrap();
    }
    std::fs::write(dir.path().join("WAVE_1d.csv"), csv).unwrap();
    dir
}

fn ini_for(dir: &Path) -> String {
    format!(
        "[data]\n\
         dir = {}\n\
         \n\
         [backtest]\n\
         capital = 5000\n\
         timeframe = 1d\n\
         strategy = GRID\n\
         start_date = 2024-01-01\n\
         end_date = 2024-12-31\n\
         \n\
         [scan]\n\
         timeframes = 1d\n\
         periods = 6mo, 1y\n\
         top_n = 3\n\
         workers = 2\n",
        dir.display()
    )
}

fn exit_debug(code: ExitCode) -> String {
    format!("{:?}", code)
}

fn assert_exit(code: ExitCode, expected: u8) {
    assert_eq!(exit_debug(code), exit_debug(ExitCode::from(expected)));
}

fn run_cli(args: &[&str]) -> ExitCode {
    let mut argv = vec!["stratscan"];
    argv.extend_from_slice(args);
    cli::run(Cli::parse_from(argv))
}

fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

mod config_loading {
    use super::*;

    #[test]
    fn load_config_reads_ini_file() {
        let dir = data_dir();
        let ini = write_temp_ini(&ini_for(dir.path()));
        let config = cli::load_config(ini.path()).unwrap();

        use stratscan::ports::config_port::ConfigPort;
        assert_eq!(config.get_double("backtest", "capital", 0.0), 5000.0);
        assert_eq!(config.get_list("scan", "periods").unwrap(), vec!["6mo", "1y"]);
    }

    #[test]
    fn load_config_missing_file_is_parse_error() {
        let err = cli::load_config(Path::new("/nonexistent/stratscan.ini")).unwrap_err();
        assert!(matches!(err, StratscanError::ConfigParse { .. }));
    }

    #[test]
    fn build_request_from_file_config() {
        let dir = data_dir();
        let ini = write_temp_ini(&ini_for(dir.path()));
        let config = cli::load_config(ini.path()).unwrap();

        let data = DataArgs {
            config: ini.path().to_path_buf(),
            data_dir: None,
            as_of: Some(date(2025, 1, 1)),
            capital: None,
            output: None,
        };
        let range = RangeArgs {
            symbol: "wave".into(),
            timeframe: None,
            period: None,
            start: None,
            end: None,
        };

        let req = cli::build_backtest_request(&config, &data, &range, None).unwrap();
        assert_eq!(req.symbol, "WAVE");
        assert_eq!(req.capital, 5000.0);
        assert_eq!(req.strategy, StrategyKind::Grid);
        assert_eq!(req.timeframe, Timeframe::OneDay);
        assert_eq!(
            req.range,
            FetchRange::Dates {
                start: date(2024, 1, 1),
                end: date(2024, 12, 31)
            }
        );
    }
}

mod end_to_end {
    use super::*;

    fn output_path(dir: &TempDir, name: &str) -> PathBuf {
        dir.path().join(name)
    }

    #[test]
    fn backtest_writes_json_report() {
        let dir = data_dir();
        let ini = write_temp_ini(&ini_for(dir.path()));
        let out = output_path(&dir, "backtest.json");

        let code = run_cli(&[
            "backtest",
            "--config",
            ini.path().to_str().unwrap(),
            "--symbol",
            "WAVE",
            "--as-of",
            "2025-01-01",
            "--output",
            out.to_str().unwrap(),
        ]);

        assert_exit(code, 0);
        let json = read_json(&out);
        assert_eq!(json["symbol"], "WAVE");
        assert_eq!(json["strategy"], "GRID");
        assert_eq!(json["timeframe"], "1d");
        assert_eq!(json["metrics"]["initial_balance"], 5000.0);
        assert!(json["bars"].as_array().unwrap().len() > 300);
        assert!(json["advice"]["setup_long"]["tp"].is_number());
    }

    #[test]
    fn compare_writes_every_strategy() {
        let dir = data_dir();
        let ini = write_temp_ini(&ini_for(dir.path()));
        let out = output_path(&dir, "compare.json");

        let code = run_cli(&[
            "compare",
            "-c",
            ini.path().to_str().unwrap(),
            "--symbol",
            "WAVE",
            "--period",
            "1y",
            "--as-of",
            "2024-12-31",
            "-o",
            out.to_str().unwrap(),
        ]);

        assert_exit(code, 0);
        let entries = read_json(&out);
        let names: Vec<&str> = entries
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["strategy"].as_str().unwrap())
            .collect();
        assert_eq!(names.len(), 5);
        assert!(names.contains(&"HOLD ONLY"));
    }

    #[test]
    fn scan_skips_symbols_without_data() {
        let dir = data_dir();
        let ini = write_temp_ini(&ini_for(dir.path()));
        let out = output_path(&dir, "scan.json");

        let code = run_cli(&[
            "scan",
            "-c",
            ini.path().to_str().unwrap(),
            "--symbols",
            "WAVE,MISSING",
            "--as-of",
            "2024-12-31",
            "-o",
            out.to_str().unwrap(),
        ]);

        assert_exit(code, 0);
        let report = read_json(&out);
        let results = report["results"].as_array().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0]["symbol"], "WAVE");
        assert_eq!(results[0]["timeframe"], "1d");
        assert_eq!(report["stats"]["units_total"], 4);
        assert_eq!(report["stats"]["units_skipped"], 2);
    }

    #[test]
    fn validate_accepts_good_config() {
        let dir = data_dir();
        let ini = write_temp_ini(&ini_for(dir.path()));
        assert_exit(run_cli(&["validate", "-c", ini.path().to_str().unwrap()]), 0);
    }

    #[test]
    fn sectors_work_without_config() {
        assert_exit(run_cli(&["sectors"]), 0);
    }
}

mod exit_codes {
    use super::*;

    #[test]
    fn invalid_capital_is_config_error() {
        let dir = data_dir();
        let ini = write_temp_ini(&ini_for(dir.path()).replace("capital = 5000", "capital = -1"));
        assert_exit(run_cli(&["validate", "-c", ini.path().to_str().unwrap()]), 2);
    }

    #[test]
    fn unknown_strategy_is_input_error() {
        let dir = data_dir();
        let ini = write_temp_ini(&ini_for(dir.path()));
        let code = run_cli(&[
            "backtest",
            "-c",
            ini.path().to_str().unwrap(),
            "--symbol",
            "WAVE",
            "--strategy",
            "SCALPING",
        ]);
        assert_exit(code, 4);
    }

    #[test]
    fn unknown_sector_is_input_error() {
        let dir = data_dir();
        let ini = write_temp_ini(&ini_for(dir.path()));
        let code = run_cli(&[
            "scan",
            "-c",
            ini.path().to_str().unwrap(),
            "--sector",
            "NOT A SECTOR",
        ]);
        assert_exit(code, 4);
    }

    #[test]
    fn reversed_date_flags_are_input_error() {
        let dir = data_dir();
        let ini = write_temp_ini(&ini_for(dir.path()));
        let out = dir.path().join("reversed.json");
        let code = run_cli(&[
            "backtest",
            "-c",
            ini.path().to_str().unwrap(),
            "--symbol",
            "WAVE",
            "--start",
            "2024-06-01",
            "--end",
            "2024-01-01",
            "-o",
            out.to_str().unwrap(),
        ]);
        assert_exit(code, 4);
        assert!(!out.exists());
    }

    #[test]
    fn missing_symbol_data_is_data_error() {
        let dir = data_dir();
        let ini = write_temp_ini(&ini_for(dir.path()));
        let code = run_cli(&[
            "backtest",
            "-c",
            ini.path().to_str().unwrap(),
            "--symbol",
            "NOPE",
            "--as-of",
            "2025-01-01",
        ]);
        assert_exit(code, 5);
    }
}

//! INI file configuration adapter.

use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

#[derive(Debug)]
pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let mut config = Ini::new();
        config.load(path).map_err(|e| std::io::Error::other(e))?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, String> {
        let mut config = Ini::new();
        config.read(content.to_string())?;
        Ok(Self { config })
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.config
            .getfloat(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn section_keys(&self, section: &str) -> Vec<String> {
        self.config
            .get_map_ref()
            .get(&section.to_lowercase())
            .map(|keys| keys.keys().cloned().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn from_string_parses_config() {
        let content = r#"
[data]
dir = ./data

[backtest]
capital = 10000.0
timeframe = 1d

[scan]
timeframes = 1h, 4h, 1d
top_n = 5
"#;
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        assert_eq!(adapter.get_string("data", "dir"), Some("./data".to_string()));
        assert_eq!(adapter.get_string("backtest", "timeframe"), Some("1d".to_string()));
    }

    #[test]
    fn get_string_returns_none_for_missing_key() {
        let adapter = FileConfigAdapter::from_string("[backtest]\ncapital = 100\n").unwrap();
        assert_eq!(adapter.get_string("backtest", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn get_int_returns_value() {
        let adapter = FileConfigAdapter::from_string("[scan]\ntop_n = 5\n").unwrap();
        assert_eq!(adapter.get_int("scan", "top_n", 0), 5);
    }

    #[test]
    fn get_int_returns_default_for_missing() {
        let adapter = FileConfigAdapter::from_string("[scan]\n").unwrap();
        assert_eq!(adapter.get_int("scan", "missing", 42), 42);
    }

    #[test]
    fn get_int_returns_default_for_non_numeric() {
        let adapter = FileConfigAdapter::from_string("[scan]\ntop_n = abc\n").unwrap();
        assert_eq!(adapter.get_int("scan", "top_n", 42), 42);
    }

    #[test]
    fn get_double_returns_value() {
        let adapter = FileConfigAdapter::from_string("[backtest]\ncapital = 100000.5\n").unwrap();
        assert_eq!(adapter.get_double("backtest", "capital", 0.0), 100000.5);
    }

    #[test]
    fn get_double_returns_default_for_missing() {
        let adapter = FileConfigAdapter::from_string("[backtest]\n").unwrap();
        assert_eq!(adapter.get_double("backtest", "missing", 99.9), 99.9);
    }

    #[test]
    fn get_double_returns_default_for_non_numeric() {
        let adapter =
            FileConfigAdapter::from_string("[backtest]\ncapital = not_a_number\n").unwrap();
        assert_eq!(adapter.get_double("backtest", "capital", 99.9), 99.9);
    }

    #[test]
    fn get_list_splits_and_trims() {
        let adapter =
            FileConfigAdapter::from_string("[scan]\ntimeframes = 1h, 4h ,1d,\n").unwrap();
        assert_eq!(
            adapter.get_list("scan", "timeframes"),
            Some(vec!["1h".to_string(), "4h".to_string(), "1d".to_string()])
        );
        assert_eq!(adapter.get_list("scan", "missing"), None);
    }

    #[test]
    fn section_keys_lists_sector_names() {
        let adapter = FileConfigAdapter::from_string(
            "[sectors]\nbanks = CBA, WBC\nminers = BHP\n",
        )
        .unwrap();
        let mut keys = adapter.section_keys("sectors");
        keys.sort();
        assert_eq!(keys, vec!["banks", "miners"]);
        assert!(adapter.section_keys("missing").is_empty());
    }

    #[test]
    fn from_file_reads_config() {
        let file = create_temp_config("[data]\ndir = /var/lib/bars\n");
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(adapter.get_string("data", "dir"), Some("/var/lib/bars".to_string()));
    }

    #[test]
    fn from_file_returns_error_for_missing_file() {
        let result = FileConfigAdapter::from_file("/nonexistent/path/config.ini");
        assert!(result.is_err());
    }
}

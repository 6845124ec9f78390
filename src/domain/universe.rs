//! Symbol catalog: named sectors and explicit symbol lists.
//!
//! Sectors come from the `[sectors]` config section (`NAME = SYM1, SYM2`);
//! the built-in catalog applies when that section is absent.

use std::collections::HashSet;

use crate::domain::error::StratscanError;
use crate::ports::config_port::ConfigPort;

/// Pseudo-sector naming the union of every catalog sector.
pub const ALL_SECTORS: &str = "ALL";

/// `ALL` is truncated to this many symbols.
pub const ALL_SECTORS_LIMIT: usize = 15;

const BUILTIN_SECTORS: &[(&str, &[&str])] = &[
    (
        "BIG_CAP",
        &["BTC-USD", "ETH-USD", "SOL-USD", "BNB-USD", "XRP-USD", "ADA-USD", "AVAX-USD"],
    ),
    (
        "AI_COINS",
        &["FET-USD", "RENDER-USD", "NEAR-USD", "ICP-USD", "GRT-USD", "TAO-USD"],
    ),
    (
        "MEME_COINS",
        &["DOGE-USD", "SHIB-USD", "PEPE-USD", "WIF-USD", "BONK-USD", "FLOKI-USD"],
    ),
    (
        "EXCHANGE_TOKENS",
        &["BNB-USD", "OKB-USD", "KCS-USD", "CRO-USD", "LEO-USD"],
    ),
    (
        "DEX_DEFI",
        &["UNI-USD", "CAKE-USD", "AAVE-USD", "MKR-USD", "LDO-USD", "CRV-USD"],
    ),
    (
        "LAYER_2",
        &["MATIC-USD", "ARB-USD", "OP-USD", "IMX-USD", "MNT-USD"],
    ),
    (
        "US_TECH",
        &["NVDA", "TSLA", "AAPL", "MSFT", "AMD", "META", "GOOG"],
    ),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sector {
    pub name: String,
    pub symbols: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolCatalog {
    sectors: Vec<Sector>,
}

impl SymbolCatalog {
    pub fn builtin() -> Self {
        let sectors = BUILTIN_SECTORS
            .iter()
            .map(|(name, symbols)| Sector {
                name: name.to_string(),
                symbols: symbols.iter().map(|s| s.to_string()).collect(),
            })
            .collect();
        SymbolCatalog { sectors }
    }

    /// Catalog from `[sectors]`, ordered by sector name. Falls back to the
    /// built-in catalog when the section is missing or empty.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, StratscanError> {
        let mut names = config.section_keys("sectors");
        if names.is_empty() {
            return Ok(Self::builtin());
        }
        names.sort();

        let mut sectors = Vec::with_capacity(names.len());
        for key in names {
            let raw = config.get_string("sectors", &key).unwrap_or_default();
            let symbols = parse_symbols(&raw).map_err(|e| StratscanError::ConfigInvalid {
                section: "sectors".to_string(),
                key: key.clone(),
                reason: e.to_string(),
            })?;
            sectors.push(Sector {
                name: key.to_uppercase(),
                symbols,
            });
        }
        Ok(SymbolCatalog { sectors })
    }

    pub fn sectors(&self) -> &[Sector] {
        &self.sectors
    }

    /// Symbols of `sector` (case-insensitive), or the capped union for `ALL`.
    pub fn resolve(&self, sector: &str) -> Result<Vec<String>, StratscanError> {
        let wanted = sector.trim().to_uppercase();

        if wanted == ALL_SECTORS {
            let mut seen = HashSet::new();
            return Ok(self
                .sectors
                .iter()
                .flat_map(|s| s.symbols.iter())
                .filter(|sym| seen.insert(sym.as_str()))
                .take(ALL_SECTORS_LIMIT)
                .cloned()
                .collect());
        }

        self.sectors
            .iter()
            .find(|s| s.name == wanted)
            .map(|s| s.symbols.clone())
            .filter(|symbols| !symbols.is_empty())
            .ok_or_else(|| StratscanError::UnknownSector {
                sector: sector.to_string(),
            })
    }
}

/// Parse a comma separated symbol list: trimmed, upper-cased, no empty tokens
/// and no duplicates.
pub fn parse_symbols(input: &str) -> Result<Vec<String>, StratscanError> {
    let mut symbols = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(StratscanError::InvalidSymbols {
                reason: "empty token in symbol list".to_string(),
            });
        }
        let symbol = trimmed.to_uppercase();
        if !seen.insert(symbol.clone()) {
            return Err(StratscanError::InvalidSymbols {
                reason: format!("duplicate symbol: {}", symbol),
            });
        }
        symbols.push(symbol);
    }

    Ok(symbols)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapConfig(HashMap<String, String>);

    impl ConfigPort for MapConfig {
        fn get_string(&self, section: &str, key: &str) -> Option<String> {
            if section == "sectors" {
                self.0.get(key).cloned()
            } else {
                None
            }
        }
        fn get_int(&self, _: &str, _: &str, default: i64) -> i64 {
            default
        }
        fn get_double(&self, _: &str, _: &str, default: f64) -> f64 {
            default
        }
        fn section_keys(&self, section: &str) -> Vec<String> {
            if section == "sectors" {
                self.0.keys().cloned().collect()
            } else {
                Vec::new()
            }
        }
    }

    fn config(pairs: &[(&str, &str)]) -> MapConfig {
        MapConfig(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_parse_symbols_basic() {
        let result = parse_symbols("BTC-USD,ETH-USD,NVDA").unwrap();
        assert_eq!(result, vec!["BTC-USD", "ETH-USD", "NVDA"]);
    }

    #[test]
    fn test_parse_symbols_trims_and_uppercases() {
        let result = parse_symbols("  btc-usd , nvda ").unwrap();
        assert_eq!(result, vec!["BTC-USD", "NVDA"]);
    }

    #[test]
    fn test_parse_symbols_empty_token() {
        let result = parse_symbols("BTC-USD,,NVDA");
        assert!(matches!(result, Err(StratscanError::InvalidSymbols { .. })));
    }

    #[test]
    fn test_parse_symbols_duplicate() {
        let result = parse_symbols("NVDA,AAPL,nvda");
        assert!(
            matches!(result, Err(StratscanError::InvalidSymbols { reason }) if reason.contains("NVDA"))
        );
    }

    #[test]
    fn test_builtin_sector() {
        let catalog = SymbolCatalog::builtin();
        let tech = catalog.resolve("us_tech").unwrap();
        assert_eq!(tech.len(), 7);
        assert_eq!(tech[0], "NVDA");
    }

    #[test]
    fn test_all_is_deduplicated_and_capped() {
        let catalog = SymbolCatalog::builtin();
        let all = catalog.resolve("ALL").unwrap();
        assert_eq!(all.len(), ALL_SECTORS_LIMIT);
        let unique: HashSet<_> = all.iter().collect();
        assert_eq!(unique.len(), all.len());
        assert_eq!(all[0], "BTC-USD");
        // BNB-USD appears in two sectors but only once in the union.
        assert_eq!(all.iter().filter(|s| *s == "BNB-USD").count(), 1);
    }

    #[test]
    fn test_unknown_sector() {
        let err = SymbolCatalog::builtin().resolve("NOPE").unwrap_err();
        assert!(matches!(err, StratscanError::UnknownSector { sector } if sector == "NOPE"));
    }

    #[test]
    fn test_config_sectors_replace_builtin() {
        let cfg = config(&[("banks", "CBA, WBC"), ("miners", "BHP,RIO,FMG")]);
        let catalog = SymbolCatalog::from_config(&cfg).unwrap();
        assert_eq!(catalog.sectors().len(), 2);
        assert_eq!(catalog.resolve("BANKS").unwrap(), vec!["CBA", "WBC"]);
        assert!(catalog.resolve("US_TECH").is_err());
        assert_eq!(catalog.resolve("ALL").unwrap(), vec!["CBA", "WBC", "BHP", "RIO", "FMG"]);
    }

    #[test]
    fn test_missing_sectors_section_uses_builtin() {
        let catalog = SymbolCatalog::from_config(&config(&[])).unwrap();
        assert_eq!(catalog, SymbolCatalog::builtin());
    }

    #[test]
    fn test_bad_sector_list_is_config_error() {
        let err = SymbolCatalog::from_config(&config(&[("banks", "CBA,,WBC")])).unwrap_err();
        assert!(matches!(err, StratscanError::ConfigInvalid { key, .. } if key == "banks"));
    }
}

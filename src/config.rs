// src/config.rs
use std::collections::HashMap;
use std::env;

const DEFAULT_SCYLLA_NODE: &str = "127.0.0.1:9042";
const DEFAULT_YAHOO_BASE: &str = "https://query1.finance.yahoo.com/v7/finance/quote";
const DEFAULT_COINGECKO_BASE: &str = "https://api.coingecko.com/api/v3";
const DEFAULT_FRONTEND_ORIGIN: &str = "http://localhost:5173";
const DEFAULT_PORT: u16 = 8000;

/// Service configuration, read from the environment once at startup and
/// passed into the handlers that need it.
#[derive(Debug, Clone)]
pub struct Config {
    pub scylla_node: String,
    pub port: u16,
    pub frontend_origin: String,
    pub yahoo_base: String,
    pub coingecko_base: String,
    /// Raw `BOND_{SYMBOL}_PRICE` values keyed by upper-cased symbol.
    /// Kept unparsed so a malformed value surfaces on the lookup that
    /// touches it instead of failing startup.
    pub bond_prices: HashMap<String, String>,
}

impl Config {
    pub fn from_env() -> Self {
        let bond_prices = env::vars()
            .filter_map(|(key, value)| {
                let symbol = key.strip_prefix("BOND_")?.strip_suffix("_PRICE")?;
                if symbol.is_empty() {
                    return None;
                }
                Some((symbol.to_uppercase(), value))
            })
            .collect();

        Config {
            scylla_node: env::var("SCYLLA_NODE").unwrap_or_else(|_| DEFAULT_SCYLLA_NODE.into()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            frontend_origin: env::var("FRONTEND_ORIGIN")
                .unwrap_or_else(|_| DEFAULT_FRONTEND_ORIGIN.into()),
            yahoo_base: env::var("YAHOO_BASE").unwrap_or_else(|_| DEFAULT_YAHOO_BASE.into()),
            coingecko_base: env::var("COINGECKO_BASE")
                .unwrap_or_else(|_| DEFAULT_COINGECKO_BASE.into()),
            bond_prices,
        }
    }

    pub fn bond_price(&self, symbol: &str) -> Option<&str> {
        self.bond_prices
            .get(&symbol.to_uppercase())
            .map(String::as_str)
    }
}

#[cfg(test)]
impl Default for Config {
    fn default() -> Self {
        Config {
            scylla_node: DEFAULT_SCYLLA_NODE.into(),
            port: DEFAULT_PORT,
            frontend_origin: DEFAULT_FRONTEND_ORIGIN.into(),
            yahoo_base: DEFAULT_YAHOO_BASE.into(),
            coingecko_base: DEFAULT_COINGECKO_BASE.into(),
            bond_prices: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bond_price_lookup_is_case_insensitive_on_symbol() {
        let mut config = Config::default();
        config
            .bond_prices
            .insert("US10Y".to_string(), "98.5".to_string());
        assert_eq!(config.bond_price("us10y"), Some("98.5"));
        assert_eq!(config.bond_price("US10Y"), Some("98.5"));
        assert_eq!(config.bond_price("DE10Y"), None);
    }

    #[test]
    fn from_env_collects_bond_mock_prices() {
        env::set_var("BOND_TESTBOND_PRICE", "101.25");
        let config = Config::from_env();
        assert_eq!(config.bond_price("TESTBOND"), Some("101.25"));
        env::remove_var("BOND_TESTBOND_PRICE");
    }
}

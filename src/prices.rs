// src/prices.rs
use std::time::Duration;

use log::info;
use reqwest::Client;
use serde::Deserialize;

use crate::config::Config;
use crate::error::ApiError;
use crate::models::{PriceQuote, PriceSource};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Bond symbols without a configured mock price resolve to this.
const DEFAULT_BOND_PRICE: f64 = 100.0;

/// Shared outbound client. One instance per process; every provider call
/// inherits the fixed request timeout, and nothing is retried.
pub fn build_client() -> reqwest::Result<Client> {
    Client::builder().timeout(REQUEST_TIMEOUT).build()
}

#[derive(Deserialize, Default)]
struct YahooQuoteResponse {
    #[serde(rename = "quoteResponse", default)]
    quote_response: YahooQuoteResult,
}

#[derive(Deserialize, Default)]
struct YahooQuoteResult {
    #[serde(default)]
    result: Vec<YahooQuote>,
}

#[derive(Deserialize)]
struct YahooQuote {
    #[serde(rename = "regularMarketPrice")]
    regular_market_price: Option<f64>,
}

#[derive(Deserialize)]
struct CoinMarket {
    symbol: String,
    current_price: Option<f64>,
}

/// Current market price for a stock symbol, normalized from the
/// Yahoo-Finance-style quote endpoint.
pub async fn stock_quote(
    client: &Client,
    config: &Config,
    symbol: &str,
) -> Result<PriceQuote, ApiError> {
    let price = yahoo_market_price(client, config, symbol).await?;
    Ok(PriceQuote {
        symbol: symbol.to_uppercase(),
        price,
        source: PriceSource::YahooFinance,
    })
}

/// Current USD price for a crypto symbol via the CoinGecko markets
/// endpoint, page size 1.
///
/// The quote carries the symbol the provider reports for the matched
/// coin, which is not always the symbol that was asked for.
pub async fn crypto_quote(
    client: &Client,
    config: &Config,
    symbol: &str,
) -> Result<PriceQuote, ApiError> {
    let url = format!("{}/coins/markets", config.coingecko_base);
    let symbol_lower = symbol.to_lowercase();
    info!("Fetching crypto price for {} from {}", symbol_lower, url);

    let response = client
        .get(&url)
        .query(&[
            ("vs_currency", "usd"),
            ("ids", ""),
            ("symbols", symbol_lower.as_str()),
            ("per_page", "1"),
            ("page", "1"),
        ])
        .send()
        .await
        .map_err(|e| ApiError::UpstreamUnavailable(format!("Failed to fetch crypto price: {}", e)))?;
    if !response.status().is_success() {
        return Err(ApiError::UpstreamUnavailable(format!(
            "Crypto provider returned HTTP {}",
            response.status()
        )));
    }

    let markets: Vec<CoinMarket> = response
        .json()
        .await
        .map_err(|e| ApiError::NotFound(format!("Unreadable crypto price response: {}", e)))?;
    let first = markets
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::NotFound(format!("Crypto symbol {} not found", symbol)))?;
    let price = first
        .current_price
        .ok_or_else(|| ApiError::NotFound(format!("No price for crypto symbol {}", symbol)))?;

    Ok(PriceQuote {
        symbol: first.symbol.to_uppercase(),
        price,
        source: PriceSource::Coingecko,
    })
}

/// Mock bond price from configuration; no live bond provider exists.
/// Falls back to a fixed placeholder when nothing is configured, which is
/// deliberate and not an error.
pub fn bond_quote(config: &Config, symbol: &str) -> Result<PriceQuote, ApiError> {
    let price = match config.bond_price(symbol) {
        None => DEFAULT_BOND_PRICE,
        Some(raw) => raw.trim().parse::<f64>().map_err(|_| {
            ApiError::InvalidConfig(format!(
                "Invalid mock price {:?} configured for bond {}",
                raw,
                symbol.to_uppercase()
            ))
        })?,
    };
    Ok(PriceQuote {
        symbol: symbol.to_uppercase(),
        price,
        source: PriceSource::Mock,
    })
}

/// Currency-to-USD rate. USD itself is a static 1.0 with no outbound
/// call; anything else is quoted through the stock provider as the
/// synthetic FX pair `{CURRENCY}USD=X`.
pub async fn cash_quote(
    client: &Client,
    config: &Config,
    currency: &str,
) -> Result<PriceQuote, ApiError> {
    if currency.eq_ignore_ascii_case("usd") {
        return Ok(PriceQuote {
            symbol: "USD".to_string(),
            price: 1.0,
            source: PriceSource::Static,
        });
    }
    let pair = format!("{}USD=X", currency.to_uppercase());
    let price = yahoo_market_price(client, config, &pair).await?;
    Ok(PriceQuote {
        symbol: currency.to_uppercase(),
        price,
        source: PriceSource::YahooFinance,
    })
}

async fn yahoo_market_price(
    client: &Client,
    config: &Config,
    symbol: &str,
) -> Result<f64, ApiError> {
    info!(
        "Fetching quote for {} from {}",
        symbol, config.yahoo_base
    );
    let response = client
        .get(&config.yahoo_base)
        .query(&[("symbols", symbol)])
        .send()
        .await
        .map_err(|e| ApiError::UpstreamUnavailable(format!("Failed to fetch quote: {}", e)))?;
    if !response.status().is_success() {
        return Err(ApiError::UpstreamUnavailable(format!(
            "Quote provider returned HTTP {}",
            response.status()
        )));
    }

    let body: YahooQuoteResponse = response
        .json()
        .await
        .map_err(|e| ApiError::NotFound(format!("Unreadable quote response: {}", e)))?;
    body.quote_response
        .result
        .into_iter()
        .next()
        .and_then(|quote| quote.regular_market_price)
        .ok_or_else(|| ApiError::NotFound(format!("Symbol {} not found", symbol)))
}

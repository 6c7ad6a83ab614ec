// src/models.rs
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AssetType {
    Stock,
    Crypto,
    Bond,
    Cash,
}

impl AssetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetType::Stock => "stock",
            AssetType::Crypto => "crypto",
            AssetType::Bond => "bond",
            AssetType::Cash => "cash",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "stock" => Some(AssetType::Stock),
            "crypto" => Some(AssetType::Crypto),
            "bond" => Some(AssetType::Bond),
            "cash" => Some(AssetType::Cash),
            _ => None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Asset {
    pub id: i32,
    pub name: String,
    pub symbol: String,
    #[serde(rename = "type")]
    pub asset_type: AssetType,
    pub amount: f64,
    pub buy_price: f64,
    pub current_price: f64,
}

/// Body of POST /api/assets. `current_price` always starts at 0.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct NewAsset {
    pub name: String,
    pub symbol: String,
    #[serde(rename = "type")]
    pub asset_type: AssetType,
    pub amount: f64,
    pub buy_price: f64,
}

/// Body of PUT /api/assets/{id}. Absent fields leave the stored value
/// unchanged.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct AssetUpdate {
    pub name: Option<String>,
    pub symbol: Option<String>,
    #[serde(rename = "type")]
    pub asset_type: Option<AssetType>,
    pub amount: Option<f64>,
    pub buy_price: Option<f64>,
    pub current_price: Option<f64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PriceSource {
    YahooFinance,
    Coingecko,
    Mock,
    Static,
}

/// A single price observation for a symbol from a named source. Produced
/// per-request, never persisted.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PriceQuote {
    pub symbol: String,
    pub price: f64,
    pub source: PriceSource,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PortfolioItem {
    pub asset: Asset,
    pub value: f64,
    pub pnl: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PortfolioSnapshot {
    pub total_value: f64,
    pub items: Vec<PortfolioItem>,
}

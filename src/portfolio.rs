// src/portfolio.rs
use crate::models::{Asset, PortfolioItem, PortfolioSnapshot};

/// Values the full set of stored assets. Pure and deterministic: no I/O,
/// and the result items keep the input ordering.
///
/// A position that was never refreshed still carries `current_price = 0`,
/// so it contributes zero value and reports its full cost basis as loss.
pub fn snapshot(assets: Vec<Asset>) -> PortfolioSnapshot {
    let mut items = Vec::with_capacity(assets.len());
    let mut total_value = 0.0;

    for asset in assets {
        let value = asset.current_price * asset.amount;
        let pnl = if asset.amount != 0.0 {
            (asset.current_price - asset.buy_price) * asset.amount
        } else {
            0.0
        };
        total_value += value;
        items.push(PortfolioItem { asset, value, pnl });
    }

    PortfolioSnapshot { total_value, items }
}

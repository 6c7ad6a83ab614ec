// src/db.rs
use std::sync::atomic::{AtomicI32, Ordering};

use log::{error, info};
use scylla::frame::response::result::Row;
use scylla::{query::Query, Session, SessionBuilder};

use crate::models::{Asset, AssetType, AssetUpdate, NewAsset};

type DbResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

const SELECT_COLUMNS: &str = "id, name, symbol, asset_type, amount, buy_price, current_price";

/// Asset store over a ScyllaDB session. Constructed once at startup and
/// shared across request handlers behind an `Arc`.
///
/// Ids are allocated from an in-process counter seeded with `MAX(id)` at
/// connect time; the service runs as a single instance.
pub struct Store {
    session: Session,
    next_id: AtomicI32,
}

impl Store {
    pub async fn init(node: &str) -> Result<Store, Box<dyn std::error::Error>> {
        let session = SessionBuilder::new().known_node(node).build().await?;

        session.query("CREATE KEYSPACE IF NOT EXISTS portfolio_tracker WITH REPLICATION = {'class': 'SimpleStrategy', 'replication_factor': 1}", &[]).await?;
        session.query("CREATE TABLE IF NOT EXISTS portfolio_tracker.assets (id INT PRIMARY KEY, name TEXT, symbol TEXT, asset_type TEXT, amount DOUBLE, buy_price DOUBLE, current_price DOUBLE)", &[]).await?;

        let result = session
            .query("SELECT MAX(id) FROM portfolio_tracker.assets", &[])
            .await?;
        let max_id = result
            .rows
            .and_then(|rows| rows.into_iter().next())
            .and_then(|row| row.columns.into_iter().next().flatten())
            .and_then(|value| value.as_int())
            .unwrap_or(0);

        info!("Successfully connected to ScyllaDB.");
        Ok(Store {
            session,
            next_id: AtomicI32::new(max_id),
        })
    }

    pub async fn create_asset(&self, new: NewAsset) -> DbResult<Asset> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let asset = build_asset(id, new);
        self.write_asset(&asset).await?;
        Ok(asset)
    }

    pub async fn list_assets(&self) -> DbResult<Vec<Asset>> {
        let query = Query::new(format!(
            "SELECT {} FROM portfolio_tracker.assets",
            SELECT_COLUMNS
        ));
        let result = self.session.query(query, &[]).await?;
        let mut assets: Vec<Asset> = result
            .rows
            .unwrap_or_default()
            .into_iter()
            .filter_map(|row| {
                let asset = row_to_asset(&row);
                if asset.is_none() {
                    error!("Skipping malformed asset row: {:?}", row);
                }
                asset
            })
            .collect();
        assets.sort_by_key(|a| a.id);
        Ok(assets)
    }

    pub async fn get_asset(&self, id: i32) -> DbResult<Option<Asset>> {
        let query = Query::new(format!(
            "SELECT {} FROM portfolio_tracker.assets WHERE id = ?",
            SELECT_COLUMNS
        ));
        let result = self.session.query(query, (id,)).await?;
        Ok(result
            .rows
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(|row| row_to_asset(&row)))
    }

    /// Merges the non-null update fields over the stored record and writes
    /// the result back. Returns `None` when the id is absent.
    pub async fn update_asset(&self, id: i32, update: AssetUpdate) -> DbResult<Option<Asset>> {
        let existing = match self.get_asset(id).await? {
            Some(asset) => asset,
            None => return Ok(None),
        };
        let merged = merge_update(existing, update);
        self.write_asset(&merged).await?;
        Ok(Some(merged))
    }

    /// No-op when the id is absent.
    pub async fn delete_asset(&self, id: i32) -> DbResult<()> {
        let query = Query::new("DELETE FROM portfolio_tracker.assets WHERE id = ?");
        self.session.query(query, (id,)).await?;
        Ok(())
    }

    async fn write_asset(&self, asset: &Asset) -> DbResult<()> {
        let query = Query::new("INSERT INTO portfolio_tracker.assets (id, name, symbol, asset_type, amount, buy_price, current_price) VALUES (?, ?, ?, ?, ?, ?, ?)");
        self.session
            .query(
                query,
                (
                    asset.id,
                    asset.name.clone(),
                    asset.symbol.clone(),
                    asset.asset_type.as_str(),
                    asset.amount,
                    asset.buy_price,
                    asset.current_price,
                ),
            )
            .await?;
        Ok(())
    }
}

/// Stored record for a freshly created asset. The symbol is normalized to
/// upper-case and the price starts at zero until a client refreshes it.
fn build_asset(id: i32, new: NewAsset) -> Asset {
    Asset {
        id,
        name: new.name,
        symbol: new.symbol.to_uppercase(),
        asset_type: new.asset_type,
        amount: new.amount,
        buy_price: new.buy_price,
        current_price: 0.0,
    }
}

/// Pure merge of a partial update over a stored asset. Symbol is
/// normalized to upper-case here so every write path shares the rule.
pub fn merge_update(mut asset: Asset, update: AssetUpdate) -> Asset {
    if let Some(name) = update.name {
        asset.name = name;
    }
    if let Some(symbol) = update.symbol {
        asset.symbol = symbol.to_uppercase();
    }
    if let Some(asset_type) = update.asset_type {
        asset.asset_type = asset_type;
    }
    if let Some(amount) = update.amount {
        asset.amount = amount;
    }
    if let Some(buy_price) = update.buy_price {
        asset.buy_price = buy_price;
    }
    if let Some(current_price) = update.current_price {
        asset.current_price = current_price;
    }
    asset
}

fn row_to_asset(row: &Row) -> Option<Asset> {
    let id = row.columns[0].as_ref().and_then(|v| v.as_int())?;
    let name = row.columns[1].as_ref().and_then(|v| v.as_text())?.clone();
    let symbol = row.columns[2].as_ref().and_then(|v| v.as_text())?.clone();
    let asset_type = row.columns[3]
        .as_ref()
        .and_then(|v| v.as_text())
        .and_then(|s| AssetType::from_str(s))?;
    let amount = row.columns[4].as_ref().and_then(|v| v.as_double())?;
    let buy_price = row.columns[5].as_ref().and_then(|v| v.as_double())?;
    let current_price = row.columns[6].as_ref().and_then(|v| v.as_double())?;

    Some(Asset {
        id,
        name,
        symbol,
        asset_type,
        amount,
        buy_price,
        current_price,
    })
}

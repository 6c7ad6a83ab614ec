// src/api.rs
use std::sync::Arc;

use log::{error, info};
use reqwest::Client;
use serde_json::json;
use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

use crate::config::Config;
use crate::db::Store;
use crate::error::ApiError;
use crate::models::{AssetUpdate, NewAsset};
use crate::{portfolio, prices};

pub fn routes(
    store: Arc<Store>,
    client: Client,
    config: Arc<Config>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    asset_routes(store.clone())
        .or(price_routes(client, config))
        .or(portfolio_route(store))
}

fn asset_routes(
    store: Arc<Store>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let list = warp::path!("api" / "assets")
        .and(warp::get())
        .and(with_store(store.clone()))
        .and_then(list_assets_handler);

    let create = warp::path!("api" / "assets")
        .and(warp::post())
        .and(with_store(store.clone()))
        .and(warp::body::json())
        .and_then(create_asset_handler);

    let update = warp::path!("api" / "assets" / i32)
        .and(warp::put())
        .and(with_store(store.clone()))
        .and(warp::body::json())
        .and_then(update_asset_handler);

    let delete = warp::path!("api" / "assets" / i32)
        .and(warp::delete())
        .and(with_store(store))
        .and_then(delete_asset_handler);

    list.or(create).or(update).or(delete)
}

fn price_routes(
    client: Client,
    config: Arc<Config>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let stock = warp::path!("api" / "price" / "stock" / String)
        .and(warp::get())
        .and(with_client(client.clone()))
        .and(with_config(config.clone()))
        .and_then(stock_price_handler);

    let crypto = warp::path!("api" / "price" / "crypto" / String)
        .and(warp::get())
        .and(with_client(client.clone()))
        .and(with_config(config.clone()))
        .and_then(crypto_price_handler);

    let bond = warp::path!("api" / "price" / "bond" / String)
        .and(warp::get())
        .and(with_config(config.clone()))
        .and_then(bond_price_handler);

    let cash = warp::path!("api" / "price" / "cash" / String)
        .and(warp::get())
        .and(with_client(client))
        .and(with_config(config))
        .and_then(cash_price_handler);

    stock.or(crypto).or(bond).or(cash)
}

fn portfolio_route(
    store: Arc<Store>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("api" / "portfolio")
        .and(warp::get())
        .and(with_store(store))
        .and_then(portfolio_handler)
}

/// CORS for the configured frontend origin plus the usual local dev hosts.
pub fn cors_policy(config: &Config) -> warp::filters::cors::Builder {
    warp::cors()
        .allow_origins([
            config.frontend_origin.as_str(),
            "http://localhost:3000",
            "http://127.0.0.1:5173",
        ])
        .allow_credentials(true)
        .allow_headers(vec!["content-type"])
        .allow_methods(vec!["GET", "POST", "PUT", "DELETE"])
}

fn with_store(
    store: Arc<Store>,
) -> impl Filter<Extract = (Arc<Store>,), Error = std::convert::Infallible> + Clone {
    warp::any().map(move || store.clone())
}

fn with_client(
    client: Client,
) -> impl Filter<Extract = (Client,), Error = std::convert::Infallible> + Clone {
    warp::any().map(move || client.clone())
}

fn with_config(
    config: Arc<Config>,
) -> impl Filter<Extract = (Arc<Config>,), Error = std::convert::Infallible> + Clone {
    warp::any().map(move || config.clone())
}

fn validate_new_asset(payload: &NewAsset) -> Result<(), Rejection> {
    if payload.amount < 0.0 || payload.buy_price < 0.0 {
        return Err(warp::reject::custom(ApiError::InvalidRequest(
            "amount and buy_price must be non-negative".to_string(),
        )));
    }
    Ok(())
}

fn validate_update(payload: &AssetUpdate) -> Result<(), Rejection> {
    let negative = payload.amount.map_or(false, |v| v < 0.0)
        || payload.buy_price.map_or(false, |v| v < 0.0)
        || payload.current_price.map_or(false, |v| v < 0.0);
    if negative {
        return Err(warp::reject::custom(ApiError::InvalidRequest(
            "amount, buy_price and current_price must be non-negative".to_string(),
        )));
    }
    Ok(())
}

async fn list_assets_handler(store: Arc<Store>) -> Result<impl Reply, Rejection> {
    match store.list_assets().await {
        Ok(assets) => Ok(warp::reply::json(&assets)),
        Err(e) => {
            error!("Failed to list assets: {}", e);
            Err(warp::reject::custom(ApiError::Database(e.to_string())))
        }
    }
}

async fn create_asset_handler(
    store: Arc<Store>,
    payload: NewAsset,
) -> Result<impl Reply, Rejection> {
    validate_new_asset(&payload)?;
    match store.create_asset(payload).await {
        Ok(asset) => {
            info!("Asset {} ({}) created successfully.", asset.id, asset.symbol);
            Ok(warp::reply::with_status(
                warp::reply::json(&asset),
                StatusCode::CREATED,
            ))
        }
        Err(e) => {
            error!("Failed to create asset: {}", e);
            Err(warp::reject::custom(ApiError::Database(e.to_string())))
        }
    }
}

async fn update_asset_handler(
    id: i32,
    store: Arc<Store>,
    payload: AssetUpdate,
) -> Result<impl Reply, Rejection> {
    validate_update(&payload)?;
    match store.update_asset(id, payload).await {
        Ok(Some(asset)) => {
            info!("Asset {} updated successfully.", id);
            Ok(warp::reply::json(&asset))
        }
        Ok(None) => Err(warp::reject::custom(ApiError::NotFound(format!(
            "Asset {} not found",
            id
        )))),
        Err(e) => {
            error!("Failed to update asset {}: {}", id, e);
            Err(warp::reject::custom(ApiError::Database(e.to_string())))
        }
    }
}

async fn delete_asset_handler(id: i32, store: Arc<Store>) -> Result<impl Reply, Rejection> {
    match store.get_asset(id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return Err(warp::reject::custom(ApiError::NotFound(format!(
                "Asset {} not found",
                id
            ))))
        }
        Err(e) => {
            error!("Failed to look up asset {}: {}", id, e);
            return Err(warp::reject::custom(ApiError::Database(e.to_string())));
        }
    }

    match store.delete_asset(id).await {
        Ok(()) => {
            info!("Asset {} deleted successfully.", id);
            Ok(warp::reply::json(&json!({ "ok": true })))
        }
        Err(e) => {
            error!("Failed to delete asset {}: {}", id, e);
            Err(warp::reject::custom(ApiError::Database(e.to_string())))
        }
    }
}

async fn stock_price_handler(
    symbol: String,
    client: Client,
    config: Arc<Config>,
) -> Result<impl Reply, Rejection> {
    match prices::stock_quote(&client, &config, &symbol).await {
        Ok(quote) => Ok(warp::reply::json(&quote)),
        Err(e) => {
            error!("Stock price lookup for {} failed: {}", symbol, e);
            Err(warp::reject::custom(e))
        }
    }
}

async fn crypto_price_handler(
    symbol: String,
    client: Client,
    config: Arc<Config>,
) -> Result<impl Reply, Rejection> {
    match prices::crypto_quote(&client, &config, &symbol).await {
        Ok(quote) => Ok(warp::reply::json(&quote)),
        Err(e) => {
            error!("Crypto price lookup for {} failed: {}", symbol, e);
            Err(warp::reject::custom(e))
        }
    }
}

async fn bond_price_handler(symbol: String, config: Arc<Config>) -> Result<impl Reply, Rejection> {
    match prices::bond_quote(&config, &symbol) {
        Ok(quote) => Ok(warp::reply::json(&quote)),
        Err(e) => {
            error!("Bond price lookup for {} failed: {}", symbol, e);
            Err(warp::reject::custom(e))
        }
    }
}

async fn cash_price_handler(
    currency: String,
    client: Client,
    config: Arc<Config>,
) -> Result<impl Reply, Rejection> {
    match prices::cash_quote(&client, &config, &currency).await {
        Ok(quote) => Ok(warp::reply::json(&quote)),
        Err(e) => {
            error!("FX rate lookup for {} failed: {}", currency, e);
            Err(warp::reject::custom(e))
        }
    }
}

async fn portfolio_handler(store: Arc<Store>) -> Result<impl Reply, Rejection> {
    match store.list_assets().await {
        Ok(assets) => Ok(warp::reply::json(&portfolio::snapshot(assets))),
        Err(e) => {
            error!("Failed to compute portfolio: {}", e);
            Err(warp::reject::custom(ApiError::Database(e.to_string())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::handle_rejection;
    use serde_json::{json, Value};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn price_api(
        config: Config,
    ) -> impl Filter<Extract = impl Reply, Error = std::convert::Infallible> + Clone {
        price_routes(prices::build_client().unwrap(), Arc::new(config))
            .recover(handle_rejection)
    }

    #[test]
    fn negative_numeric_fields_are_rejected_before_the_store() {
        let payload = NewAsset {
            name: "Apple".to_string(),
            symbol: "AAPL".to_string(),
            asset_type: crate::models::AssetType::Stock,
            amount: -1.0,
            buy_price: 150.0,
        };
        assert!(validate_new_asset(&payload).is_err());

        let update = AssetUpdate {
            buy_price: Some(-0.5),
            ..AssetUpdate::default()
        };
        assert!(validate_update(&update).is_err());
        assert!(validate_update(&AssetUpdate::default()).is_ok());
    }

    #[tokio::test]
    async fn bond_endpoint_serves_placeholder_price() {
        let api = price_api(Config::default());
        let response = warp::test::request()
            .method("GET")
            .path("/api/price/bond/US10Y")
            .reply(&api)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(
            body,
            json!({ "symbol": "US10Y", "price": 100.0, "source": "mock" })
        );
    }

    #[tokio::test]
    async fn bond_endpoint_rejects_bad_mock_config_with_400() {
        let mut config = Config::default();
        config
            .bond_prices
            .insert("US10Y".to_string(), "not-a-number".to_string());
        let api = price_api(config);
        let response = warp::test::request()
            .method("GET")
            .path("/api/price/bond/US10Y")
            .reply(&api)
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = serde_json::from_slice(response.body()).unwrap();
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn stock_endpoint_maps_upstream_failure_to_502() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/quote"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        let mut config = Config::default();
        config.yahoo_base = format!("{}/quote", server.uri());

        let api = price_api(config);
        let response = warp::test::request()
            .method("GET")
            .path("/api/price/stock/AAPL")
            .reply(&api)
            .await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn crypto_endpoint_maps_empty_result_to_404() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v3/coins/markets"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;
        let mut config = Config::default();
        config.coingecko_base = format!("{}/api/v3", server.uri());

        let api = price_api(config);
        let response = warp::test::request()
            .method("GET")
            .path("/api/price/crypto/NOPE")
            .reply(&api)
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn cash_endpoint_serves_static_usd_rate() {
        let api = price_api(Config::default());
        let response = warp::test::request()
            .method("GET")
            .path("/api/price/cash/usd")
            .reply(&api)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(
            body,
            json!({ "symbol": "USD", "price": 1.0, "source": "static" })
        );
    }
}

// src/main.rs
mod api;
mod config;
mod db;
mod error;
mod models;
mod portfolio;
mod prices;

use std::sync::Arc;

use env_logger::Builder;
use log::{error, info, LevelFilter};
use warp::Filter;

use crate::config::Config;
use crate::db::Store;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .format_timestamp_secs()
        .init();

    let config = Arc::new(Config::from_env());

    let store = match Store::init(&config.scylla_node).await {
        Ok(store) => Arc::new(store),
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            return;
        }
    };
    info!("Connected to database...");

    let client = match prices::build_client() {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to build HTTP client: {}", e);
            return;
        }
    };

    info!("Starting the portfolio tracker application...");
    let routes = api::routes(store, client, config.clone())
        .recover(error::handle_rejection)
        .with(api::cors_policy(&config));

    info!("Server running on http://127.0.0.1:{}", config.port);
    warp::serve(routes).run(([0, 0, 0, 0], config.port)).await;
}

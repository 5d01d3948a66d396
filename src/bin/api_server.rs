// HTTP API server binary: catalog reads plus the OAuth session bridge

use anyhow::Result;
use game_price_tracker::api::ApiServer;
use game_price_tracker::catalog::Games;
use game_price_tracker::core_api::{CoreApiClient, CoreApiConfig};
use game_price_tracker::telemetry::{init_tracing, DEFAULT_FILTER};
use game_price_tracker::util::db::Db;
use game_price_tracker::util::env as env_util;
use std::sync::Arc;

#[actix_web::main]
async fn main() -> Result<()> {
    env_util::init_env();
    init_tracing(DEFAULT_FILTER)?;

    tracing::info!("Initializing game price API server");

    let server = ApiServer::from_env()?;
    let core_api = CoreApiClient::new(&CoreApiConfig::from_env()?)?;

    let database_url = env_util::db_url_prefer_session()?;
    let max_connections: u32 = env_util::env_parse("DB_MAX_CONNS", 10u32);
    let db = Db::connect(&database_url, max_connections).await?;

    tracing::info!("Database connected successfully");

    server.run(Arc::new(Games::new(db)), core_api).await?;

    Ok(())
}

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use game_price_tracker::api::ApiServer;
use game_price_tracker::catalog::{GameRepository, GameStore, Games, GetGamesOptions};
use game_price_tracker::core_api::{CoreApiClient, CoreApiConfig};
use game_price_tracker::pricing::{store_prices, PriceDisplay};
use game_price_tracker::telemetry::{init_tracing, DEFAULT_FILTER};
use game_price_tracker::util::db::Db;
use game_price_tracker::util::env;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "tracker", version, about = "Game price tracker CLI")]
struct Cli {
    /// Optional override for the database URL
    #[arg(long, global = true)]
    db_url: Option<String>,
    /// Optional override for max pool connections
    #[arg(long, global = true)]
    max_connections: Option<u32>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
#[command(rename_all = "kebab-case")]
enum Commands {
    /// List catalog previews as JSON
    Games {
        /// Optional comma-separated filter of internal game ids
        #[arg(long, value_delimiter = ',')]
        ids: Option<Vec<i64>>,
    },
    /// Print full detail of one game
    Game {
        /// Public id of the game
        public_id: String,
    },
    /// Print price history grouped by storefront listing
    History {
        /// Public id of the game
        public_id: String,
    },
    /// Summarize current prices next to the running price interval
    Prices {
        /// Public id of the game
        public_id: String,
    },
    /// Run the HTTP API server
    Serve,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PriceLine {
    catalog_id: i64,
    store: GameStore,
    url: String,
    price: PriceDisplay,
    active_since: Option<String>,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn connect(cli: &Cli) -> Result<Games> {
    let url = match &cli.db_url {
        Some(url) => url.clone(),
        None => env::db_url_prefer_session()?,
    };
    let max = cli
        .max_connections
        .unwrap_or_else(|| env::env_parse("DB_MAX_CONNS", 10u32));
    let db = Db::connect(&url, max)
        .await
        .context("failed to connect to database")?;
    Ok(Games::new(db))
}

#[actix_web::main]
async fn main() -> Result<()> {
    env::init_env();
    init_tracing(DEFAULT_FILTER)?;

    let cli = Cli::parse();
    if cli.db_url.is_none() {
        env::preflight_check(
            "tracker",
            &[],
            &["SUPABASE_DB_SESSION_URL", "DATABASE_URL", "DB_HOST", "DB_MAX_CONNS"],
        )?;
    }
    let games = connect(&cli).await?;

    match cli.command {
        Commands::Games { ids } => {
            let response = games.get_games(&GetGamesOptions { ids }).await?;
            info!(count = response.games.len(), "loaded games");
            print_json(&response)?;
        }
        Commands::Game { public_id } => {
            print_json(&games.get_game(&public_id).await?)?;
        }
        Commands::History { public_id } => {
            print_json(&games.get_price_history(&public_id).await?)?;
        }
        Commands::Prices { public_id } => {
            let (detail, history) = futures::try_join!(
                games.get_game(&public_id),
                games.get_price_history(&public_id)
            )?;
            let lines: Vec<PriceLine> = store_prices(&detail.game)
                .into_iter()
                .map(|entry| {
                    let active_since = history
                        .game_catalog
                        .iter()
                        .find(|c| c.id == entry.catalog_id)
                        .and_then(|c| c.active_record())
                        .map(|r| r.start_at.to_rfc3339());
                    PriceLine {
                        catalog_id: entry.catalog_id,
                        store: entry.store,
                        url: entry.url,
                        price: entry.price,
                        active_since,
                    }
                })
                .collect();
            print_json(&lines)?;
        }
        Commands::Serve => {
            env::preflight_check("api_server", &["CORE_API_URL"], &["API_HOST", "API_PORT"])?;
            let server = ApiServer::from_env()?;
            let core_api = CoreApiClient::new(&CoreApiConfig::from_env()?)?;
            server.run(Arc::new(games), core_api).await?;
        }
    }

    Ok(())
}

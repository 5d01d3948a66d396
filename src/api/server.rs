// API server implementation using actix-web

use crate::api::{middleware, routes};
use crate::catalog::GameRepository;
use crate::core_api::CoreApiClient;
use crate::session::CookieOptions;
use crate::util::env::{env_flag, env_opt, env_parse};
use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Instant;

/// Per-response knobs shared by every handler.
#[derive(Debug, Clone, Copy)]
pub struct HttpSettings {
    /// `max-age` sent on catalog reads.
    pub stale_time_secs: u32,
    pub cookie: CookieOptions,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            stale_time_secs: 30,
            cookie: CookieOptions::default(),
        }
    }
}

/// Shared application state handed to handlers through `web::Data`.
pub struct AppState {
    pub games: Arc<dyn GameRepository>,
    pub core_api: CoreApiClient,
    pub settings: HttpSettings,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        games: Arc<dyn GameRepository>,
        core_api: CoreApiClient,
        settings: HttpSettings,
    ) -> Self {
        Self {
            games,
            core_api,
            settings,
            started_at: Instant::now(),
        }
    }
}

pub struct ApiServer {
    pub host: String,
    pub port: u16,
    pub allowed_origins: String,
    pub settings: HttpSettings,
}

impl ApiServer {
    /// Create server from environment variables
    pub fn from_env() -> Result<Self> {
        crate::util::env::init_env();

        let host = env_opt("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = env_opt("API_PORT")
            .unwrap_or_else(|| "8080".to_string())
            .parse()
            .context("Invalid API_PORT")?;
        let allowed_origins = env_opt("ALLOWED_ORIGINS")
            .unwrap_or_else(|| "http://localhost:3000".to_string());

        let settings = HttpSettings {
            stale_time_secs: env_parse("STALE_TIME_SECS", 30u32),
            cookie: CookieOptions {
                secure: env_flag("COOKIE_SECURE", true),
                ..CookieOptions::default()
            },
        };

        Ok(Self {
            host,
            port,
            allowed_origins,
            settings,
        })
    }

    /// Start the HTTP server
    pub async fn run(self, games: Arc<dyn GameRepository>, core_api: CoreApiClient) -> Result<()> {
        let bind_addr = format!("{}:{}", self.host, self.port);

        tracing::info!(
            host = %self.host,
            port = %self.port,
            core_api = %core_api.base_url(),
            stale_time_secs = self.settings.stale_time_secs,
            "Starting game price API server"
        );

        let state = web::Data::new(AppState::new(games, core_api, self.settings));
        let allowed_origins = self.allowed_origins.clone();

        HttpServer::new(move || {
            let (logger, compress) = middleware::setup_middleware();
            let cors = middleware::setup_cors(&allowed_origins);

            App::new()
                .app_data(state.clone())
                .wrap(logger)
                .wrap(compress)
                .wrap(cors)
                .configure(routes::configure_routes)
        })
        .bind(&bind_addr)
        .with_context(|| format!("Failed to bind to {}", bind_addr))?
        .run()
        .await
        .context("HTTP server error")?;

        Ok(())
    }
}

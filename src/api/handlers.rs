// HTTP request handlers for API endpoints

use actix_web::{
    http::header::{self, CacheControl, CacheDirective},
    web, HttpRequest, HttpResponse, HttpResponseBuilder,
};
use chrono::Utc;

use crate::api::error::ApiError;
use crate::api::models::*;
use crate::api::server::AppState;
use crate::catalog::GetGamesOptions;
use crate::core_api::{KakaoLoginRequest, OauthLoginResponse, RegisterOauthRequest};
use crate::pricing::store_prices;
use crate::session::{RequestCookies, ResponseCookies, SessionCookies};

type HandlerResult = Result<HttpResponse, ApiError>;

// Read endpoints may be reused by clients for the configured freshness window.
fn cached_ok(state: &AppState) -> HttpResponseBuilder {
    let mut builder = HttpResponse::Ok();
    builder.insert_header(CacheControl(vec![
        CacheDirective::Public,
        CacheDirective::MaxAge(state.settings.stale_time_secs),
    ]));
    builder
}

fn no_store(mut builder: HttpResponseBuilder) -> HttpResponseBuilder {
    builder.insert_header(CacheControl(vec![CacheDirective::NoStore]));
    builder
}

/// Health check endpoint
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let database = if state.games.ping().await {
        "connected"
    } else {
        "disconnected"
    };

    let response = ApiResponse::success(HealthResponse {
        status: "healthy".to_string(),
        database: database.to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
    });

    no_store(HttpResponse::Ok()).json(response)
}

/// Catalog previews, optionally restricted with `?ids=1,2`
pub async fn list_games(
    state: web::Data<AppState>,
    query: web::Query<GamesQuery>,
) -> HandlerResult {
    let ids = query.parse_ids().map_err(ApiError::BadRequest)?;
    let options = GetGamesOptions { ids };
    let games = state.games.get_games(&options).await?;
    Ok(cached_ok(&state).json(ApiResponse::success(games)))
}

/// Full detail of one game
pub async fn get_game(state: web::Data<AppState>, path: web::Path<String>) -> HandlerResult {
    let public_id = path.into_inner();
    let game = state.games.get_game(&public_id).await?;
    Ok(cached_ok(&state).json(ApiResponse::success(game)))
}

/// Storefront links with discount / lowest-price state
pub async fn get_game_prices(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> HandlerResult {
    let public_id = path.into_inner();
    let game = state.games.get_game(&public_id).await?.game;
    let response = GamePricesResponse {
        id: game.id,
        stores: store_prices(&game),
        public_id: game.public_id,
    };
    Ok(cached_ok(&state).json(ApiResponse::success(response)))
}

/// Price intervals grouped by storefront
pub async fn get_price_history(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> HandlerResult {
    let public_id = path.into_inner();
    let history = state.games.get_price_history(&public_id).await?;
    Ok(cached_ok(&state).json(ApiResponse::success(history)))
}

/// Kakao OAuth login, proxied to the core API. Tokens land in session cookies.
pub async fn login_kakao(
    req: HttpRequest,
    state: web::Data<AppState>,
    payload: web::Json<KakaoLoginRequest>,
) -> HandlerResult {
    let login = state.core_api.login_by_kakao(&payload.code).await?;
    tracing::info!(
        registration_completed = login.is_registration_completed(),
        "kakao login succeeded"
    );

    let mut session = SessionCookies::new(ResponseCookies::new(&req), state.settings.cookie);
    session.store_login(&login, Utc::now());

    let mut builder = no_store(HttpResponse::Ok());
    for cookie in session.into_inner().into_cookies() {
        builder.cookie(cookie);
    }
    Ok(builder.json(ApiResponse::success(login)))
}

/// Complete an OAuth registration with a nickname
pub async fn register_oauth_user(
    req: HttpRequest,
    state: web::Data<AppState>,
    payload: web::Json<RegisterOauthRequest>,
) -> HandlerResult {
    if payload.nickname.trim().is_empty() {
        return Err(ApiError::BadRequest("nickname must not be empty".to_string()));
    }

    let pending_token = SessionCookies::new(RequestCookies::new(&req), state.settings.cookie)
        .access_token();
    let done = state
        .core_api
        .register_oauth_user(&payload, pending_token.as_deref())
        .await?;

    let mut session = SessionCookies::new(ResponseCookies::new(&req), state.settings.cookie);
    session.store_registration(&done, Utc::now());

    let mut builder = no_store(HttpResponse::Ok());
    for cookie in session.into_inner().into_cookies() {
        builder.cookie(cookie);
    }
    // Same tagged shape as a completed login.
    Ok(builder.json(ApiResponse::success(OauthLoginResponse::Completed(done))))
}

/// Drop the session cookies
pub async fn logout(req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    let mut session = SessionCookies::new(ResponseCookies::new(&req), state.settings.cookie);
    session.clear_tokens();

    let mut builder = no_store(HttpResponse::Ok());
    for cookie in session.into_inner().into_cookies() {
        builder.cookie(cookie);
    }
    builder.insert_header((header::VARY, "Cookie"));
    builder.json(ApiResponse::success(serde_json::json!({ "loggedOut": true })))
}

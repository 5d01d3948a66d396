// API route configuration

use crate::api::handlers;
use actix_web::web;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(handlers::health_check))
        .route("/", web::get().to(handlers::health_check))
        .service(
            web::scope("/api/v1")
                // Catalog reads
                .route("/games", web::get().to(handlers::list_games))
                .route("/games/{public_id}", web::get().to(handlers::get_game))
                .route(
                    "/games/{public_id}/prices",
                    web::get().to(handlers::get_game_prices),
                )
                .route(
                    "/games/{public_id}/price-history",
                    web::get().to(handlers::get_price_history),
                )
                // OAuth session
                .route("/auth/kakao", web::post().to(handlers::login_kakao))
                .route(
                    "/auth/registration/oauth-user",
                    web::post().to(handlers::register_oauth_user),
                )
                .route("/auth/logout", web::post().to(handlers::logout)),
        );
}

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::{routing::get, routing::post, Extension, Router};
use chess_coach::advisor::OllamaAdvisor;
use chess_coach::config::CoachConfig;
use chess_coach::db::SqliteStore;
use tower_http::cors::{Any, CorsLayer};

/// Build the HTTP application around shared coach state.
pub fn app(config: CoachConfig, store: SqliteStore, advisor: Arc<OllamaAdvisor>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(routes::root::welcome))
        .route("/analyze", post(routes::analyze::analyze_game))
        .route("/analysis/{source}", get(routes::analyze::get_analysis))
        .layer(Extension(config))
        .layer(Extension(store))
        .layer(Extension(advisor))
        .layer(cors)
}

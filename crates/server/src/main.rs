use std::sync::Arc;

use chess_coach::advisor::OllamaAdvisor;
use chess_coach::db::SqliteStore;
use server::config;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = config::Config::from_env()?;

    tracing::info!("Opening database...");
    let store = SqliteStore::connect(&config.coach.database_url).await?;

    tracing::info!("Running migrations...");
    store.run_migrations().await?;

    let advisor = Arc::new(OllamaAdvisor::from_config(&config.coach)?);
    let app = server::app(config.coach.clone(), store, advisor);

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("Starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

//! Comic Store - order and inventory API server

use anyhow::Result;
use comic_store::{
    api::{self, AppState},
    config::Config,
    store::{MemoryStore, PgStore},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let state = match &config.database_url {
        Some(url) => {
            let store = PgStore::connect(url, config.max_connections).await?;
            store.migrate().await?;
            AppState::new(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory store; data is lost on exit");
            AppState::new(MemoryStore::new())
        }
    };

    let addr = config.bind_addr();
    tracing::info!("Comic store listening on {}", addr);
    axum::serve(tokio::net::TcpListener::bind(&addr).await?, api::router(state)).await?;
    Ok(())
}

// Main entry point for the crawler API server

use std::sync::Arc;

use anyhow::{Context, Result};
use server_core::{
    server::{build_app, AppState},
    Config,
};
use site_crawler::{HttpFetcher, MemoryStore, ScraperParser, Store};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "info,server_core=debug,site_crawler=debug,sqlx=warn".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting site crawler API");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(
        max_pages = config.crawl.max_pages,
        max_depth = config.crawl.max_depth,
        batch_size = config.extraction.batch_size,
        "Configuration loaded"
    );

    let store = connect_store(config.database_url.as_deref()).await?;
    let fetcher = Arc::new(HttpFetcher::new().context("Failed to build HTTP client")?);
    let parser = Arc::new(ScraperParser::new());

    // Build application
    let state = AppState::new(
        store,
        fetcher,
        parser,
        config.crawl.clone(),
        config.extraction.clone(),
    );
    let app = build_app(state, &config.allowed_origins);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

#[cfg(feature = "postgres")]
async fn connect_store(database_url: Option<&str>) -> Result<Arc<dyn Store>> {
    match database_url {
        Some(url) => {
            tracing::info!("Connecting to database...");
            let store = site_crawler::PostgresStore::new(url)
                .await
                .context("Failed to connect to database")?;
            tracing::info!("Database connected, migrations complete");
            Ok(Arc::new(store))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory store");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

#[cfg(not(feature = "postgres"))]
async fn connect_store(database_url: Option<&str>) -> Result<Arc<dyn Store>> {
    if database_url.is_some() {
        tracing::warn!("DATABASE_URL ignored: built without the postgres feature");
    }
    Ok(Arc::new(MemoryStore::new()))
}

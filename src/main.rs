//! Bloom storefront service binary.

use std::sync::Arc;

use anyhow::{Context, Result};
use bloom_storefront::api;
use bloom_storefront::config::{Config, StoreBackend};
use bloom_storefront::services::{spawn_reaper, EventPublisher, Storefront};
use bloom_storefront::store::{CartRepository, Catalog, FixtureCatalog, LiveCatalog, MemoryStore, OrderRepository, PgStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type Stores = (Arc<dyn CartRepository>, Arc<dyn OrderRepository>, Arc<dyn Catalog>);

async fn open_stores(config: &Config) -> Result<Stores> {
    match config.backend {
        StoreBackend::Postgres => {
            let url = config.database_url.as_deref().context("DATABASE_URL not set")?;
            let store = PgStore::connect(url, config.db_max_connections, config.db_connect_timeout)
                .await
                .context("Failed to connect to Postgres")?;
            store.migrate().await?;
            let catalog = LiveCatalog::new(store.pool().clone());
            let store = Arc::new(store);
            let stores: Stores = (store.clone(), store, Arc::new(catalog));
            Ok(stores)
        }
        StoreBackend::Memory => {
            let catalog = match &config.catalog_fixture_path {
                Some(path) => FixtureCatalog::from_file(path)?,
                None => FixtureCatalog::sample(),
            };
            tracing::warn!("Using in-memory store, nothing will survive a restart");
            let store = Arc::new(MemoryStore::new());
            let stores: Stores = (store.clone(), store, Arc::new(catalog));
            Ok(stores)
        }
    }
}

async fn event_publisher(config: &Config) -> EventPublisher {
    let Some(url) = &config.nats_url else { return EventPublisher::disabled() };
    match async_nats::connect(url.as_str()).await {
        Ok(client) => {
            tracing::info!(%url, "Publishing domain events to NATS");
            EventPublisher::nats(client, config.nats_subject_prefix.clone())
        }
        Err(e) => {
            tracing::warn!(%url, error = %e, "NATS unavailable, domain events will only be logged");
            EventPublisher::disabled()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Invalid configuration")?;
    let (carts, orders, catalog) = open_stores(&config).await?;
    let events = event_publisher(&config).await;
    let storefront = Arc::new(Storefront::new(carts, orders, catalog, config.storefront.clone(), events)?);
    spawn_reaper(storefront.clone(), config.reaper_interval);

    let app = api::router(storefront);
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(backend = ?config.backend, "Bloom storefront listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

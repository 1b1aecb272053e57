use txsub::{
    api::{AppState, Server},
    config::Config,
    history::{AccountHistoryCache, IngestionWatcher, InvalidationListener, SqliteHistory},
    state::SqliteLedger,
    ValidationManager,
};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Capacity of the ingestion event channel. A listener falling further
/// behind clears the whole cache.
const EVENT_CAPACITY: usize = 1024;

/// The main entry point for the gateway.
///
/// Initializes logging, loads configuration, connects both databases, starts
/// the ingestion watcher and cache invalidation listener in the background,
/// and serves the submission API.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let path = std::env::args().nth(1).unwrap_or_else(|| "config/default.toml".to_string());
    let config = Config::load(&path)?;
    info!("Gateway starting with config: {:?}", config);

    // Restrictions are fixed for the lifetime of the process
    let policy = config.restrictions.to_policy()?;

    let ledger = SqliteLedger::connect(
        &config.database.core_url,
        config.database.max_connections,
        config.database.acquire_timeout(),
    )
    .await?;
    let history = Arc::new(
        SqliteHistory::connect(
            &config.database.history_url,
            config.database.max_connections,
            config.database.acquire_timeout(),
        )
        .await?,
    );

    let cache = Arc::new(AccountHistoryCache::with_capacity(
        history.clone(),
        config.cache.capacity,
    ));
    let (events_tx, events_rx) = broadcast::channel(EVENT_CAPACITY);

    let listener = InvalidationListener::new(cache.clone(), events_rx);
    tokio::spawn(async move {
        if let Err(e) = listener.run().await {
            tracing::error!("Invalidation listener error: {:?}", e);
        }
    });

    let watcher = IngestionWatcher::new(history, events_tx, config.ingestion.poll_interval());
    tokio::spawn(async move {
        if let Err(e) = watcher.run().await {
            tracing::error!("Ingestion watcher error: {:?}", e);
        }
    });
    info!("Ingestion watcher started");

    let manager = Arc::new(ValidationManager::new(Arc::new(ledger), cache, policy));
    let server = Server::new(
        config.api.clone(),
        AppState::new(manager, config.validation.timeout()),
    );
    server.start().await?;

    Ok(())
}

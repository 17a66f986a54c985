pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod logging;
pub mod server;
pub mod store;
pub mod validation;

use std::sync::Arc;

use tokio::sync::watch;

use config::Config;
use db::catalog::MonumentCatalog;
use engine::assets::FsAssetSource;
use engine::intent::IntentMatcher;
use engine::responses::ResponseTable;
use error::AppError;
use server::AppState;
use store::{KeyValueStore, SqliteStore, VisitCounter, WelcomeGate};

/// Start the Historica backend and serve until Ctrl-C.
pub async fn run() -> Result<(), AppError> {
    let config = Config::from_env()?;
    let _log_guard = logging::init(config.log_dir.as_deref());

    tracing::info!("Starting Historica v{}", env!("CARGO_PKG_VERSION"));
    tracing::debug!(
        data_dir = %config.data_dir.display(),
        assets_dir = %config.assets_dir.display(),
        chat_reply_ms = config.chat_reply_delay.as_millis() as u64,
        settle_ms = config.settle_delay.as_millis() as u64,
        "Configuration loaded"
    );

    logging::install_crash_hook(&config.data_dir);
    let crashes = logging::read_crash_logs(&config.data_dir);
    if let Some(last) = crashes.first() {
        tracing::warn!(count = crashes.len(), last = %last.filename, "Previous crash reports found");
    }

    let pool = db::init_db(&config.data_dir)?;
    let catalog = MonumentCatalog::builtin()?;
    tracing::info!(monuments = catalog.len(), "Monument catalogue ready");

    let client_store: Arc<dyn KeyValueStore> = Arc::new(SqliteStore::new(pool.clone()));
    let visits = VisitCounter::load(client_store.clone())?;
    let welcome = WelcomeGate::new(client_store);

    let state = AppState {
        catalog: Arc::new(catalog),
        pool,
        assets: Arc::new(FsAssetSource::new(config.assets_dir.clone())),
        fallback_model: config.fallback_model.clone(),
        matcher: Arc::new(IntentMatcher::new(Arc::new(ResponseTable::somnath()))),
        visits: Arc::new(visits),
        welcome: Arc::new(welcome),
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            return;
        }
        let _ = shutdown_tx.send(true);
    });

    server::start_server(state, config.bind, shutdown_rx).await
}

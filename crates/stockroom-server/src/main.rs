//! Stockroom server binary.
//!
//! Wires the configuration, the file-backed stores and the HTTP server
//! together, then serves until `Ctrl-C`.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing); `LOG_FORMAT=json` selects
//!    JSON lines
//! 2. Load configuration from the first argument, `STOCKROOM_CONFIG`, or
//!    `config.json`
//! 3. Open the catalog and account stores
//! 4. Create the bootstrap admin if there are no accounts
//! 5. Serve HTTP until shutdown

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use stockroom_core::AppConfig;
use stockroom_store::{CatalogStore, PhotoStore, UserStore};
use stockroom_web::{AppState, ServerConfig, start_server};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Config file used when neither an argument nor `STOCKROOM_CONFIG` is set.
const DEFAULT_CONFIG_PATH: &str = "config.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize structured logging.
    init_tracing();
    info!("stockroom starting");

    // 2. Load configuration.
    let config_path = config_path();
    let config = AppConfig::load(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    info!(
        path = %config_path.display(),
        title = %config.title,
        page_size = config.page_size,
        data_file = %config.storage.data_file.display(),
        users_file = %config.storage.users_file.display(),
        "configuration loaded"
    );

    // 3. Open stores.
    let catalog = CatalogStore::open(&config.storage.data_file)
        .with_context(|| format!("opening {}", config.storage.data_file.display()))?;
    let mut users = UserStore::open(&config.storage.users_file)
        .with_context(|| format!("opening {}", config.storage.users_file.display()))?;

    // 4. Bootstrap admin.
    let admin = &config.bootstrap_admin;
    users
        .ensure_admin(&admin.username, &admin.password, config.bcrypt_cost)
        .context("creating bootstrap admin")?;

    let photos = PhotoStore::new(
        config.upload_dir(),
        config.thumbnail.width,
        config.thumbnail.height,
    );
    info!(dir = %photos.dir().display(), "photo uploads directory");

    // 5. Serve.
    let server_config = ServerConfig::from(&config.server);
    let state = Arc::new(AppState::new(config, catalog, users, photos)?);
    start_server(&server_config, state).await?;

    info!("stockroom stopped");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

fn config_path() -> PathBuf {
    std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("STOCKROOM_CONFIG").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

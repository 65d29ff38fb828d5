use std::sync::Arc;

use anyhow::Context;
use common::storage::UploadRoot;
use tracing::info;
use tracing_subscriber::EnvFilter;

use server::config::AppConfig;
use server::state::AppState;
use server::store::SeaOrmCatalogStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = server::database::init_db(&config.database)
        .await
        .context("Failed to connect to the metadata store")?;
    let store = Arc::new(SeaOrmCatalogStore::new(db, config.database.retry.clone()));

    let uploads = UploadRoot::new(
        config.storage.upload_root.clone(),
        config.storage.max_upload_size,
    )
    .await
    .with_context(|| {
        format!(
            "Failed to prepare upload root {}",
            config.storage.upload_root.display()
        )
    })?;
    info!(path = %uploads.base_path().display(), "Upload root ready");

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(config, store, Arc::new(uploads))
        .context("Failed to compile page templates")?;
    let app = server::build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server running at http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

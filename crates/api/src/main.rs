use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use flashweb_infra::AppConfig;
use flashweb_observability::LogOptions;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("invalid configuration")?;

    let log_options = LogOptions::with_files_under(&config.base_dir);
    let _log_guard = flashweb_observability::init(&log_options);

    info!(
        development = config.development,
        database = ?config.database.kind,
        "starting flashweb"
    );

    let services = flashweb_api::app::services::build_services(&config)
        .await
        .context("failed to prepare user store")?;
    let app = flashweb_api::app::build_app(Arc::new(services));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}

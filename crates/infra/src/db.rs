//! Connection pool for the configured backend.

use sqlx::AnyPool;
use sqlx::any::AnyPoolOptions;
use tracing::info;

use crate::config::DatabaseConfig;

/// Open a pool for `db`.
///
/// `max_connections` must be 1 for `sqlite::memory:`, where every connection
/// would otherwise see its own empty database.
pub async fn connect(db: &DatabaseConfig, max_connections: u32) -> Result<AnyPool, sqlx::Error> {
    sqlx::any::install_default_drivers();
    let pool = AnyPoolOptions::new()
        .max_connections(max_connections)
        .connect(&db.url)
        .await?;
    info!(kind = ?db.kind, "database pool ready");
    Ok(pool)
}

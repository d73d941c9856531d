//! Infrastructure layer: configuration, database pool, user storage.

pub mod config;
pub mod db;
pub mod users;

pub use config::{AdminSeed, AppConfig, ConfigError, DatabaseConfig, DatabaseKind};
pub use users::{InMemoryUserStore, SqlUserStore, UserStore, UserStoreError, seed_admin};

//! SQL-backed user table over `sqlx::AnyPool`.
//!
//! The same code serves PostgreSQL, MySQL and SQLite; the only per-backend
//! differences are the auto-increment column type and the bind placeholder
//! syntax. `created_at` is stored as RFC 3339 text so every backend maps it
//! the same way.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::any::AnyRow;
use sqlx::{AnyPool, Row};
use tracing::{debug, instrument};

use flashweb_auth::{NewUser, Role, UserInfo};
use flashweb_core::UserId;

use super::r#trait::{UserStore, UserStoreError};
use crate::config::DatabaseKind;

const SELECT_COLUMNS: &str =
    "SELECT user_id, username, password_hash, role, created_at FROM user_info";

#[derive(Debug, Clone)]
pub struct SqlUserStore {
    pool: AnyPool,
    kind: DatabaseKind,
}

impl SqlUserStore {
    pub fn new(pool: AnyPool, kind: DatabaseKind) -> Self {
        Self { pool, kind }
    }

    fn placeholder(&self, n: usize) -> String {
        placeholder(self.kind, n)
    }

    fn create_table_sql(&self) -> String {
        let id_column = match self.kind {
            DatabaseKind::Postgresql => "user_id BIGSERIAL PRIMARY KEY",
            DatabaseKind::Mysql => "user_id BIGINT NOT NULL AUTO_INCREMENT PRIMARY KEY",
            _ => "user_id INTEGER PRIMARY KEY AUTOINCREMENT",
        };
        format!(
            "CREATE TABLE IF NOT EXISTS user_info (
                {id_column},
                username      VARCHAR(64)  NOT NULL UNIQUE,
                password_hash VARCHAR(255) NOT NULL,
                role          VARCHAR(32)  NOT NULL,
                created_at    VARCHAR(40)  NOT NULL
            )"
        )
    }
}

/// Positional bind marker: `$n` for PostgreSQL, `?` elsewhere.
fn placeholder(kind: DatabaseKind, n: usize) -> String {
    match kind {
        DatabaseKind::Postgresql => format!("${n}"),
        _ => "?".to_string(),
    }
}

fn user_from_row(row: &AnyRow) -> Result<UserInfo, UserStoreError> {
    let role_name: String = row.try_get("role")?;
    let role: Role = role_name
        .parse()
        .map_err(|e: flashweb_auth::UnknownRole| UserStoreError::Corrupt(e.to_string()))?;

    let created_raw: String = row.try_get("created_at")?;
    let created_at = DateTime::parse_from_rfc3339(&created_raw)
        .map_err(|e| UserStoreError::Corrupt(format!("created_at '{created_raw}': {e}")))?
        .with_timezone(&Utc);

    Ok(UserInfo {
        user_id: UserId::new(row.try_get::<i64, _>("user_id")?),
        username: row.try_get("username")?,
        password_hash: row.try_get("password_hash")?,
        role,
        created_at,
    })
}

#[async_trait]
impl UserStore for SqlUserStore {
    #[instrument(skip(self), fields(kind = ?self.kind))]
    async fn ensure_created(&self) -> Result<(), UserStoreError> {
        sqlx::query(&self.create_table_sql()).execute(&self.pool).await?;
        debug!("user_info table ready");
        Ok(())
    }

    #[instrument(skip(self, user), fields(username = %user.username))]
    async fn insert(&self, user: NewUser) -> Result<UserInfo, UserStoreError> {
        let sql = format!(
            "INSERT INTO user_info (username, password_hash, role, created_at) \
             VALUES ({}, {}, {}, {})",
            self.placeholder(1),
            self.placeholder(2),
            self.placeholder(3),
            self.placeholder(4),
        );

        let result = sqlx::query(&sql)
            .bind(user.username.as_str().to_string())
            .bind(user.password_hash)
            .bind(user.role.as_str().to_string())
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => {}
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                return Err(UserStoreError::DuplicateUsername(user.username.to_string()));
            }
            Err(e) => return Err(e.into()),
        }

        self.find_by_username(user.username.as_str())
            .await?
            .ok_or_else(|| UserStoreError::Storage("inserted row not found".into()))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserInfo>, UserStoreError> {
        let sql = format!("{SELECT_COLUMNS} WHERE username = {}", self.placeholder(1));
        let row = sqlx::query(&sql)
            .bind(username.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_by_id(&self, user_id: UserId) -> Result<Option<UserInfo>, UserStoreError> {
        let sql = format!("{SELECT_COLUMNS} WHERE user_id = {}", self.placeholder(1));
        let row = sqlx::query(&sql)
            .bind(user_id.get())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn list(&self) -> Result<Vec<UserInfo>, UserStoreError> {
        let sql = format!("{SELECT_COLUMNS} ORDER BY user_id");
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(user_from_row).collect()
    }
}

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use flashweb_auth::{NewUser, UserInfo};
use flashweb_core::UserId;

use super::r#trait::{UserStore, UserStoreError};

#[derive(Debug, Default)]
struct Table {
    rows: Vec<UserInfo>,
    next_id: i64,
}

/// In-memory user table.
///
/// Intended for tests/dev. Same uniqueness rule as the SQL table.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    table: RwLock<Table>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn ensure_created(&self) -> Result<(), UserStoreError> {
        Ok(())
    }

    async fn insert(&self, user: NewUser) -> Result<UserInfo, UserStoreError> {
        let mut table = self.table.write();
        if table.rows.iter().any(|u| u.username == user.username.as_str()) {
            return Err(UserStoreError::DuplicateUsername(user.username.to_string()));
        }

        table.next_id += 1;
        let row = UserInfo {
            user_id: UserId::new(table.next_id),
            username: user.username.to_string(),
            password_hash: user.password_hash,
            role: user.role,
            created_at: Utc::now(),
        };
        table.rows.push(row.clone());
        Ok(row)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserInfo>, UserStoreError> {
        Ok(self.table.read().rows.iter().find(|u| u.username == username).cloned())
    }

    async fn find_by_id(&self, user_id: UserId) -> Result<Option<UserInfo>, UserStoreError> {
        Ok(self.table.read().rows.iter().find(|u| u.user_id == user_id).cloned())
    }

    async fn list(&self) -> Result<Vec<UserInfo>, UserStoreError> {
        Ok(self.table.read().rows.clone())
    }
}

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use flashweb_auth::{NewUser, UserInfo};
use flashweb_core::UserId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UserStoreError {
    #[error("username '{0}' is already taken")]
    DuplicateUsername(String),

    #[error("invalid user data: {0}")]
    Invalid(String),

    /// A stored row could not be mapped back (e.g. unknown role name).
    #[error("corrupt user row: {0}")]
    Corrupt(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl From<sqlx::Error> for UserStoreError {
    fn from(err: sqlx::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

/// Store for `UserInfo` rows.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Create the table (and its unique username constraint) if missing.
    async fn ensure_created(&self) -> Result<(), UserStoreError>;

    async fn insert(&self, user: NewUser) -> Result<UserInfo, UserStoreError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<UserInfo>, UserStoreError>;

    async fn find_by_id(&self, user_id: UserId) -> Result<Option<UserInfo>, UserStoreError>;

    /// All users, ordered by `user_id`.
    async fn list(&self) -> Result<Vec<UserInfo>, UserStoreError>;
}

#[async_trait]
impl<S> UserStore for Arc<S>
where
    S: UserStore + ?Sized,
{
    async fn ensure_created(&self) -> Result<(), UserStoreError> {
        (**self).ensure_created().await
    }

    async fn insert(&self, user: NewUser) -> Result<UserInfo, UserStoreError> {
        (**self).insert(user).await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserInfo>, UserStoreError> {
        (**self).find_by_username(username).await
    }

    async fn find_by_id(&self, user_id: UserId) -> Result<Option<UserInfo>, UserStoreError> {
        (**self).find_by_id(user_id).await
    }

    async fn list(&self) -> Result<Vec<UserInfo>, UserStoreError> {
        (**self).list().await
    }
}

//! Durable client-side token storage.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use thiserror::Error;

/// Well-known key the session token lives under.
pub const TOKEN_KEY: &str = "token";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenStoreError {
    #[error("token storage unavailable: {0}")]
    Unavailable(String),
}

/// Key/value storage that outlives a `UserSession`.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Absence is `Ok(None)`, never an error.
    async fn get(&self, key: &str) -> Result<Option<String>, TokenStoreError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), TokenStoreError>;

    /// Idempotent: removing a missing key succeeds.
    async fn remove(&self, key: &str) -> Result<(), TokenStoreError>;
}

#[async_trait]
impl<S> TokenStore for Arc<S>
where
    S: TokenStore + ?Sized,
{
    async fn get(&self, key: &str) -> Result<Option<String>, TokenStoreError> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), TokenStoreError> {
        (**self).set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), TokenStoreError> {
        (**self).remove(key).await
    }
}

/// In-memory token store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryTokenStore {
    inner: RwLock<HashMap<String, String>>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        let store = Self::new();
        if let Ok(mut map) = store.inner.write() {
            map.insert(TOKEN_KEY.to_string(), token.into());
        }
        store
    }

    /// Synchronous peek, for assertions.
    pub fn snapshot(&self, key: &str) -> Option<String> {
        self.inner.read().ok()?.get(key).cloned()
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn get(&self, key: &str) -> Result<Option<String>, TokenStoreError> {
        let map = self
            .inner
            .read()
            .map_err(|_| TokenStoreError::Unavailable("lock poisoned".into()))?;
        Ok(map.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), TokenStoreError> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| TokenStoreError::Unavailable("lock poisoned".into()))?;
        map.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), TokenStoreError> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| TokenStoreError::Unavailable("lock poisoned".into()))?;
        map.remove(key);
        Ok(())
    }
}

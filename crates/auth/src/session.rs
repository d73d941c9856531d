use tokio::sync::{Mutex, MutexGuard};

/// Per-connection session cache: zero or one token.
///
/// A cache, not an authority. Nothing here validates the token. A fresh
/// session starts empty. Hosts create one per client connection and pass it
/// to the guard explicitly.
#[derive(Debug, Default)]
pub struct UserSession {
    token: Mutex<Option<String>>,
}

impl UserSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn token(&self) -> Option<String> {
        self.token.lock().await.clone()
    }

    pub async fn set_token(&self, token: Option<String>) {
        *self.token.lock().await = token;
    }

    /// Exclusive access to the cached slot, held across a store round-trip.
    pub(crate) async fn lock(&self) -> MutexGuard<'_, Option<String>> {
        self.token.lock().await
    }
}

//! Browser-backed adapters for the auth guard.
//!
//! The token cookie plays the durable store, and navigation requests turn
//! into a `303 See Other` once the handler finishes.

use std::sync::Arc;

use async_trait::async_trait;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use parking_lot::Mutex;
use tracing::debug;

use flashweb_auth::{
    AuthGuard, JwtClaims, Navigator, Role, TokenStore, TokenStoreError, UserSession,
};
use flashweb_core::SessionId;

use crate::app::services::AppServices;
use crate::sessions::SESSION_COOKIE;

/// Token storage over the request's cookies; changes are emitted with the response.
#[derive(Debug, Default)]
pub struct CookieTokenStore {
    jar: Mutex<CookieJar>,
}

impl CookieTokenStore {
    pub fn new(jar: CookieJar) -> Self {
        Self { jar: Mutex::new(jar) }
    }

    /// The jar with every pending `Set-Cookie`.
    pub fn into_jar(self) -> CookieJar {
        self.jar.into_inner()
    }

    fn take_jar(&self) -> CookieJar {
        std::mem::take(&mut *self.jar.lock())
    }
}

fn cookie(key: &str, value: String) -> Cookie<'static> {
    Cookie::build((key.to_owned(), value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

#[async_trait]
impl TokenStore for CookieTokenStore {
    async fn get(&self, key: &str) -> Result<Option<String>, TokenStoreError> {
        Ok(self.jar.lock().get(key).map(|c| c.value().to_owned()))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), TokenStoreError> {
        let mut jar = self.jar.lock();
        *jar = std::mem::take(&mut *jar).add(cookie(key, value.to_owned()));
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), TokenStoreError> {
        let mut jar = self.jar.lock();
        *jar = std::mem::take(&mut *jar).remove(Cookie::build((key.to_owned(), "")).path("/"));
        Ok(())
    }
}

/// Remembers the last navigation target instead of performing it.
#[derive(Debug, Default)]
pub struct RedirectNavigator {
    target: Mutex<Option<String>>,
}

impl RedirectNavigator {
    pub fn target(&self) -> Option<String> {
        self.target.lock().clone()
    }
}

impl Navigator for RedirectNavigator {
    fn navigate_to(&self, path: &str) {
        *self.target.lock() = Some(path.to_owned());
    }
}

/// One request's view of its session: the cached token, the cookie store and
/// a guard wired to both.
pub struct Visit {
    session_id: SessionId,
    session: Arc<UserSession>,
    store: Arc<CookieTokenStore>,
    navigator: Arc<RedirectNavigator>,
    guard: AuthGuard,
}

impl Visit {
    /// Attach to the session named by the `sid` cookie, opening a new one if needed.
    pub fn begin(services: &AppServices, jar: CookieJar) -> Self {
        let requested = jar.get(SESSION_COOKIE).and_then(|c| c.value().parse().ok());
        let (session_id, session, created) = services.sessions.resolve(requested);

        let jar = if created {
            debug!(%session_id, "opened session");
            jar.add(cookie(SESSION_COOKIE, session_id.to_string()))
        } else {
            jar
        };

        let store = Arc::new(CookieTokenStore::new(jar));
        let navigator = Arc::new(RedirectNavigator::default());
        let guard = AuthGuard::new(services.jwt.clone(), store.clone(), navigator.clone());

        Self {
            session_id,
            session,
            store,
            navigator,
            guard,
        }
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub async fn authenticate(&self, required: &[Role]) -> bool {
        self.guard.authenticate(&self.session, required).await
    }

    pub async fn sign_in(&self, token: &str) -> Result<(), TokenStoreError> {
        self.guard.sign_in(&self.session, token).await
    }

    pub async fn sign_out(&self) {
        self.guard.sign_out(&self.session).await
    }

    /// Claims of the cached token, if it still decodes.
    pub async fn claims(&self, services: &AppServices) -> Option<JwtClaims> {
        let token = self.session.token().await?;
        services.jwt.decode(&token).ok()
    }

    /// Redirect if the guard asked for navigation, otherwise serve `page`.
    pub fn finish(self, page: impl IntoResponse) -> Response {
        match self.navigator.target() {
            Some(target) => self.redirect(&target),
            None => (self.jar(), page).into_response(),
        }
    }

    /// Send the browser to `target`, carrying any cookie changes along.
    pub fn redirect(self, target: &str) -> Response {
        (self.jar(), Redirect::to(target)).into_response()
    }

    fn jar(&self) -> CookieJar {
        self.store.take_jar()
    }
}

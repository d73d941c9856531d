//! Page activation guard: read the token, validate it, redirect on failure.
//!
//! Every failure (no token, rejected token, a store or validator that could
//! not answer) ends the same way for the caller: `false` plus a navigation to
//! [`LOGIN_PATH`]. Reasons only show up in the logs.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::{
    LOGIN_PATH, Navigator, Role, TOKEN_KEY, TokenServiceError, TokenStore, TokenStoreError,
    TokenValidator, UserSession,
};

pub struct AuthGuard {
    validator: Arc<dyn TokenValidator>,
    store: Arc<dyn TokenStore>,
    navigator: Arc<dyn Navigator>,
}

impl AuthGuard {
    pub fn new(
        validator: Arc<dyn TokenValidator>,
        store: Arc<dyn TokenStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            validator,
            store,
            navigator,
        }
    }

    /// Check the session's token against `required` roles.
    ///
    /// An empty `required` means "any valid token". Otherwise roles are tried
    /// in the given order and the first one that validates grants access.
    ///
    /// The session lock is held for the whole check, so overlapping checks on
    /// one session run one after another.
    pub async fn authenticate(&self, session: &UserSession, required: &[Role]) -> bool {
        let mut cached = session.lock().await;

        if cached.as_deref().is_none_or(str::is_empty) {
            match self.store.get(TOKEN_KEY).await {
                Ok(stored) => *cached = stored,
                Err(err) => {
                    warn!(error = %err, "token store read failed; treating as invalid");
                    self.reject(&mut cached).await;
                    return false;
                }
            }
        }

        let token = match cached.as_deref() {
            Some(token) if !token.is_empty() => token.to_owned(),
            _ => {
                debug!("no credential in session or store");
                self.navigator.navigate_to(LOGIN_PATH);
                return false;
            }
        };

        let valid = if required.is_empty() {
            accepted(self.validator.validate(&token).await, None)
        } else {
            let mut valid = false;
            for role in required {
                let result = self.validator.validate_with_role(&token, role.as_str()).await;
                if accepted(result, Some(*role)) {
                    valid = true;
                    break;
                }
            }
            valid
        };

        if !valid {
            debug!(?required, "credential rejected");
            self.reject(&mut cached).await;
            return false;
        }

        true
    }

    /// Role-agnostic check: any token with a valid signature and lifetime.
    pub async fn authenticate_any(&self, session: &UserSession) -> bool {
        self.authenticate(session, &[]).await
    }

    /// Remember a freshly issued token in both the session and durable storage.
    pub async fn sign_in(&self, session: &UserSession, token: &str) -> Result<(), TokenStoreError> {
        let mut cached = session.lock().await;
        self.store.set(TOKEN_KEY, token).await?;
        *cached = Some(token.to_owned());
        Ok(())
    }

    /// Forget the token everywhere and go to the login page. Safe to repeat.
    pub async fn sign_out(&self, session: &UserSession) {
        let mut cached = session.lock().await;
        self.reject(&mut cached).await;
    }

    async fn reject(&self, cached: &mut Option<String>) {
        self.navigator.navigate_to(LOGIN_PATH);
        *cached = None;
        if let Err(err) = self.store.remove(TOKEN_KEY).await {
            warn!(error = %err, "failed to remove token from store");
        }
    }
}

fn accepted(result: Result<bool, TokenServiceError>, role: Option<Role>) -> bool {
    match result {
        Ok(valid) => valid,
        Err(err) => {
            warn!(error = %err, ?role, "token validation failed; treating as invalid");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::{InMemoryTokenStore, RecordingNavigator};

    /// Validator with a fixed answer table and a call log.
    #[derive(Default)]
    struct ScriptedValidator {
        valid_tokens: HashSet<String>,
        grants: HashSet<(String, String)>,
        fail: bool,
        calls: Mutex<Vec<(String, Option<String>)>>,
    }

    impl ScriptedValidator {
        fn accepting(token: &str) -> Self {
            Self {
                valid_tokens: [token.to_string()].into(),
                ..Self::default()
            }
        }

        fn granting(token: &str, roles: &[&str]) -> Self {
            Self {
                valid_tokens: [token.to_string()].into(),
                grants: roles.iter().map(|r| (token.to_string(), r.to_string())).collect(),
                ..Self::default()
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        fn calls(&self) -> Vec<(String, Option<String>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TokenValidator for ScriptedValidator {
        async fn validate(&self, token: &str) -> Result<bool, TokenServiceError> {
            self.calls.lock().unwrap().push((token.to_string(), None));
            if self.fail {
                return Err(TokenServiceError::Unavailable("down".into()));
            }
            Ok(self.valid_tokens.contains(token))
        }

        async fn validate_with_role(
            &self,
            token: &str,
            role: &str,
        ) -> Result<bool, TokenServiceError> {
            self.calls
                .lock()
                .unwrap()
                .push((token.to_string(), Some(role.to_string())));
            if self.fail {
                return Err(TokenServiceError::Unavailable("down".into()));
            }
            Ok(self.grants.contains(&(token.to_string(), role.to_string())))
        }
    }

    /// Store whose every operation fails.
    struct BrokenStore;

    #[async_trait]
    impl TokenStore for BrokenStore {
        async fn get(&self, _key: &str) -> Result<Option<String>, TokenStoreError> {
            Err(TokenStoreError::Unavailable("disconnected".into()))
        }

        async fn set(&self, _key: &str, _value: &str) -> Result<(), TokenStoreError> {
            Err(TokenStoreError::Unavailable("disconnected".into()))
        }

        async fn remove(&self, _key: &str) -> Result<(), TokenStoreError> {
            Err(TokenStoreError::Unavailable("disconnected".into()))
        }
    }

    struct Fixture {
        validator: Arc<ScriptedValidator>,
        store: Arc<InMemoryTokenStore>,
        navigator: Arc<RecordingNavigator>,
        guard: AuthGuard,
    }

    fn fixture(validator: ScriptedValidator, store: InMemoryTokenStore) -> Fixture {
        let validator = Arc::new(validator);
        let store = Arc::new(store);
        let navigator = Arc::new(RecordingNavigator::new());
        let guard = AuthGuard::new(validator.clone(), store.clone(), navigator.clone());
        Fixture {
            validator,
            store,
            navigator,
            guard,
        }
    }

    #[tokio::test]
    async fn missing_token_redirects_without_validation() {
        let f = fixture(ScriptedValidator::default(), InMemoryTokenStore::new());
        let session = UserSession::new();

        assert!(!f.guard.authenticate(&session, &[Role::Admin]).await);
        assert!(!f.guard.authenticate_any(&session).await);

        assert!(f.validator.calls().is_empty());
        assert_eq!(f.navigator.visits(), vec!["/login", "/login"]);
    }

    #[tokio::test]
    async fn empty_stored_token_counts_as_missing() {
        let f = fixture(ScriptedValidator::default(), InMemoryTokenStore::with_token(""));
        let session = UserSession::new();

        assert!(!f.guard.authenticate_any(&session).await);
        assert!(f.validator.calls().is_empty());
        assert_eq!(f.navigator.count(), 1);
    }

    #[tokio::test]
    async fn store_token_fills_cache_and_is_left_in_place() {
        let f = fixture(
            ScriptedValidator::granting("abc123", &["Admin"]),
            InMemoryTokenStore::with_token("abc123"),
        );
        let session = UserSession::new();

        assert!(f.guard.authenticate(&session, &[Role::Admin]).await);

        assert_eq!(session.token().await.as_deref(), Some("abc123"));
        assert_eq!(f.store.snapshot(TOKEN_KEY).as_deref(), Some("abc123"));
        assert_eq!(f.navigator.count(), 0);
    }

    #[tokio::test]
    async fn cached_token_skips_the_store() {
        let f = fixture(
            ScriptedValidator::accepting("cached"),
            InMemoryTokenStore::with_token("stored"),
        );
        let session = UserSession::new();
        session.set_token(Some("cached".into())).await;

        assert!(f.guard.authenticate_any(&session).await);
        assert_eq!(f.validator.calls(), vec![("cached".to_string(), None)]);
    }

    #[tokio::test]
    async fn no_roles_means_plain_validity_check() {
        let f = fixture(ScriptedValidator::accepting("t"), InMemoryTokenStore::with_token("t"));
        let session = UserSession::new();

        assert!(f.guard.authenticate(&session, &[]).await);
        assert_eq!(f.validator.calls(), vec![("t".to_string(), None)]);
    }

    #[tokio::test]
    async fn roles_are_tried_in_order_and_stop_at_first_match() {
        let f = fixture(
            ScriptedValidator::granting("t", &["User", "Admin"]),
            InMemoryTokenStore::with_token("t"),
        );
        let session = UserSession::new();

        assert!(f.guard.authenticate(&session, &[Role::User, Role::Admin]).await);
        assert_eq!(f.validator.calls(), vec![("t".to_string(), Some("User".to_string()))]);
    }

    #[tokio::test]
    async fn later_role_can_grant_access() {
        let f = fixture(
            ScriptedValidator::granting("t", &["Admin"]),
            InMemoryTokenStore::with_token("t"),
        );
        let session = UserSession::new();

        assert!(f.guard.authenticate(&session, &[Role::User, Role::Admin]).await);
        let roles: Vec<_> = f.validator.calls().into_iter().map(|(_, r)| r.unwrap()).collect();
        assert_eq!(roles, vec!["User", "Admin"]);
    }

    #[tokio::test]
    async fn exhausted_roles_clear_everything_and_redirect_once() {
        let f = fixture(
            ScriptedValidator::granting("t", &["User"]),
            InMemoryTokenStore::with_token("t"),
        );
        let session = UserSession::new();

        assert!(!f.guard.authenticate(&session, &[Role::Admin]).await);

        assert_eq!(session.token().await, None);
        assert_eq!(f.store.snapshot(TOKEN_KEY), None);
        assert_eq!(f.navigator.visits(), vec!["/login"]);
    }

    #[tokio::test]
    async fn expired_cached_token_is_cleared() {
        let f = fixture(ScriptedValidator::default(), InMemoryTokenStore::with_token("expired"));
        let session = UserSession::new();
        session.set_token(Some("expired".into())).await;

        assert!(!f.guard.authenticate(&session, &[]).await);

        assert_eq!(session.token().await, None);
        assert_eq!(f.store.snapshot(TOKEN_KEY), None);
        assert_eq!(f.navigator.count(), 1);
    }

    #[tokio::test]
    async fn repeated_failure_is_stable() {
        let f = fixture(ScriptedValidator::default(), InMemoryTokenStore::with_token("bad"));
        let session = UserSession::new();

        let first = f.guard.authenticate(&session, &[Role::User]).await;
        let second = f.guard.authenticate(&session, &[Role::User]).await;

        assert!(!first);
        assert_eq!(first, second);
        assert_eq!(session.token().await, None);
        assert_eq!(f.store.snapshot(TOKEN_KEY), None);
        // Second call finds nothing to validate.
        assert_eq!(f.validator.calls().len(), 1);
        assert_eq!(f.navigator.count(), 2);
    }

    #[tokio::test]
    async fn validator_errors_fail_closed() {
        let f = fixture(ScriptedValidator::failing(), InMemoryTokenStore::with_token("t"));
        let session = UserSession::new();

        assert!(!f.guard.authenticate(&session, &[Role::User, Role::Admin]).await);

        // Errors count as "try the next role", not as an early exit.
        assert_eq!(f.validator.calls().len(), 2);
        assert_eq!(session.token().await, None);
        assert_eq!(f.store.snapshot(TOKEN_KEY), None);
        assert_eq!(f.navigator.count(), 1);
    }

    #[tokio::test]
    async fn store_errors_fail_closed() {
        let validator = Arc::new(ScriptedValidator::accepting("t"));
        let navigator = Arc::new(RecordingNavigator::new());
        let guard = AuthGuard::new(validator.clone(), Arc::new(BrokenStore), navigator.clone());
        let session = UserSession::new();

        assert!(!guard.authenticate_any(&session).await);
        assert!(validator.calls().is_empty());
        assert_eq!(navigator.count(), 1);

        // Sign-out against a broken store still completes.
        guard.sign_out(&session).await;
        assert_eq!(navigator.count(), 2);
    }

    #[tokio::test]
    async fn sign_in_then_sign_out() {
        let f = fixture(ScriptedValidator::accepting("fresh"), InMemoryTokenStore::new());
        let session = UserSession::new();

        f.guard.sign_in(&session, "fresh").await.unwrap();
        assert_eq!(session.token().await.as_deref(), Some("fresh"));
        assert_eq!(f.store.snapshot(TOKEN_KEY).as_deref(), Some("fresh"));
        assert!(f.guard.authenticate_any(&session).await);

        f.guard.sign_out(&session).await;
        f.guard.sign_out(&session).await;
        assert_eq!(session.token().await, None);
        assert_eq!(f.store.snapshot(TOKEN_KEY), None);
        assert_eq!(f.navigator.count(), 2);
    }

    #[tokio::test]
    async fn fresh_session_recovers_token_from_store() {
        let f = fixture(
            ScriptedValidator::accepting("durable"),
            InMemoryTokenStore::with_token("durable"),
        );

        let first = UserSession::new();
        assert!(f.guard.authenticate_any(&first).await);

        // Reconnect: new, empty session cache; the store still has the token.
        let second = UserSession::new();
        assert!(f.guard.authenticate_any(&second).await);
        assert_eq!(second.token().await.as_deref(), Some("durable"));
    }

    /// Store that suspends inside `get` and counts reads.
    struct SlowStore {
        token: String,
        reads: AtomicUsize,
    }

    #[async_trait]
    impl TokenStore for SlowStore {
        async fn get(&self, _key: &str) -> Result<Option<String>, TokenStoreError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            for _ in 0..8 {
                tokio::task::yield_now().await;
            }
            Ok(Some(self.token.clone()))
        }

        async fn set(&self, _key: &str, _value: &str) -> Result<(), TokenStoreError> {
            Ok(())
        }

        async fn remove(&self, _key: &str) -> Result<(), TokenStoreError> {
            Ok(())
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_checks_on_one_session_read_the_store_once() {
        let store = Arc::new(SlowStore {
            token: "shared".into(),
            reads: AtomicUsize::new(0),
        });
        let guard = Arc::new(AuthGuard::new(
            Arc::new(ScriptedValidator::granting("shared", &["User"])),
            store.clone(),
            Arc::new(RecordingNavigator::new()),
        ));
        let session = Arc::new(UserSession::new());

        let checks: Vec<_> = (0..8)
            .map(|_| {
                let guard = guard.clone();
                let session = session.clone();
                tokio::spawn(async move { guard.authenticate(&session, &[Role::User]).await })
            })
            .collect();

        for check in checks {
            assert!(check.await.unwrap());
        }
        assert_eq!(store.reads.load(Ordering::SeqCst), 1);
        assert_eq!(session.token().await.as_deref(), Some("shared"));
    }
}

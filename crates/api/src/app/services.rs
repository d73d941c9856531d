//! Shared services behind every handler.

use std::sync::{Arc, OnceLock};

use thiserror::Error;
use tracing::info;

use flashweb_auth::{
    JwtService, NewUser, PasswordError, Role, TokenOptions, TokenServiceError, UserInfo,
    hash_password, verify_password,
};
use flashweb_core::{DomainError, Password, Username};
use flashweb_infra::{AppConfig, SqlUserStore, UserStore, UserStoreError, db, seed_admin};

use crate::sessions::SessionRegistry;

const MAX_DB_CONNECTIONS: u32 = 5;

/// PHC hash that unknown usernames are checked against, so a miss costs a full verify.
fn dummy_hash() -> &'static str {
    static DUMMY: OnceLock<String> = OnceLock::new();
    DUMMY.get_or_init(|| {
        Password::parse("flashweb-no-such-user")
            .ok()
            .and_then(|pw| hash_password(&pw).ok())
            .unwrap_or_default()
    })
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Invalid(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] UserStoreError),

    #[error(transparent)]
    Hash(#[from] PasswordError),

    #[error(transparent)]
    Token(#[from] TokenServiceError),

    #[error("background task failed: {0}")]
    Task(String),
}

pub struct AppServices {
    pub jwt: Arc<JwtService>,
    pub users: Arc<dyn UserStore>,
    pub sessions: SessionRegistry,
}

impl AppServices {
    pub fn new(token: TokenOptions, users: Arc<dyn UserStore>) -> Self {
        Self {
            jwt: Arc::new(JwtService::new(token)),
            users,
            sessions: SessionRegistry::default(),
        }
    }

    /// Check a username/password pair and issue a token for it.
    ///
    /// `Ok(None)` covers both an unknown user and a wrong password.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<(UserInfo, String)>, ServiceError> {
        let Ok(password) = Password::parse(password) else {
            return Ok(None);
        };
        let found = self.users.find_by_username(username.trim()).await?;

        let hash = match &found {
            Some(user) => user.password_hash.clone(),
            None => dummy_hash().to_owned(),
        };
        let matches = tokio::task::spawn_blocking(move || verify_password(&hash, &password))
            .await
            .map_err(|e| ServiceError::Task(e.to_string()))?;
        let Some(user) = found.filter(|_| matches) else {
            return Ok(None);
        };

        let token = self.jwt.issue(&user)?;
        Ok(Some((user, token)))
    }

    /// Create a new account with the `User` role.
    pub async fn register(
        &self,
        username: &str,
        password: &str,
    ) -> Result<UserInfo, ServiceError> {
        let username = Username::parse(username)?;
        let password = Password::parse(password)?;

        let new_user = tokio::task::spawn_blocking(move || {
            NewUser::with_password(username, &password, Role::User)
        })
        .await
        .map_err(|e| ServiceError::Task(e.to_string()))??;

        let user = self.users.insert(new_user).await?;
        info!(user_id = %user.user_id, username = %user.username, "registered user");
        Ok(user)
    }
}

/// Connect the configured database, create the schema and seed the administrator.
pub async fn build_services(config: &AppConfig) -> Result<AppServices, UserStoreError> {
    let pool = db::connect(&config.database, MAX_DB_CONNECTIONS).await?;
    let users = SqlUserStore::new(pool, config.database.kind);
    users.ensure_created().await?;

    if let Some(seed) = &config.admin {
        seed_admin(&users, seed).await?;
    }

    Ok(AppServices::new(config.token.clone(), Arc::new(users)))
}

//! `UserInfo` persistence.

pub mod in_memory;
pub mod sql;
pub mod r#trait;

pub use in_memory::InMemoryUserStore;
pub use r#trait::{UserStore, UserStoreError};
pub use sql::SqlUserStore;

use flashweb_auth::{NewUser, Role, UserInfo};
use flashweb_core::{Password, Username};
use tracing::info;

use crate::config::AdminSeed;

/// Create the configured administrator unless the username is already taken.
///
/// An existing account keeps its current password and role.
pub async fn seed_admin<S>(store: &S, seed: &AdminSeed) -> Result<UserInfo, UserStoreError>
where
    S: UserStore + ?Sized,
{
    let username =
        Username::parse(&seed.username).map_err(|e| UserStoreError::Invalid(e.to_string()))?;
    if let Some(existing) = store.find_by_username(username.as_str()).await? {
        return Ok(existing);
    }

    let password =
        Password::parse(&seed.password).map_err(|e| UserStoreError::Invalid(e.to_string()))?;
    let new_user = NewUser::with_password(username, &password, Role::Admin)
        .map_err(|e| UserStoreError::Invalid(e.to_string()))?;
    let user = store.insert(new_user).await?;
    info!(user_id = %user.user_id, username = %user.username, "seeded administrator");
    Ok(user)
}

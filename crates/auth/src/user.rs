//! The `UserInfo` record: who may sign in, and with which role.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use flashweb_core::{Password, UserId, Username};

use crate::{PasswordError, Role, hash_password};

/// A stored user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub user_id: UserId,
    pub username: String,
    /// Argon2 PHC string. Never leaves the process.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// An account about to be inserted (the store assigns `user_id`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: Username,
    pub password_hash: String,
    pub role: Role,
}

impl NewUser {
    /// Hash `password` and build the insert payload.
    pub fn with_password(
        username: Username,
        password: &Password,
        role: Role,
    ) -> Result<Self, PasswordError> {
        Ok(Self {
            username,
            password_hash: hash_password(password)?,
            role,
        })
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use flashweb_auth::{Role, UserInfo};

// -------------------------
// Request DTOs
// -------------------------

/// Body of `POST /login`, `POST /register` and `POST /api/token`.
#[derive(Debug, Deserialize)]
pub struct CredentialsForm {
    pub username: String,
    pub password: String,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

impl TokenResponse {
    pub fn bearer(access_token: String, expire_minutes: i64) -> Self {
        Self {
            access_token,
            token_type: "Bearer",
            expires_in: expire_minutes.saturating_mul(60),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserView {
    pub user_id: i64,
    pub username: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<UserInfo> for UserView {
    fn from(user: UserInfo) -> Self {
        Self {
            user_id: user.user_id.get(),
            username: user.username,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

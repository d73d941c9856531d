use flashweb_auth::{JwtClaims, Role};

/// Principal context for a bearer-authenticated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    user_id: String,
    username: String,
    roles: Vec<Role>,
}

impl PrincipalContext {
    pub fn new(user_id: impl Into<String>, username: impl Into<String>, roles: Vec<Role>) -> Self {
        Self {
            user_id: user_id.into(),
            username: username.into(),
            roles,
        }
    }

    pub fn from_claims(claims: &JwtClaims) -> Self {
        Self::new(claims.sub.clone(), claims.unique_name.clone(), claims.roles())
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }
}

//! HS256 token issuance and validation.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{JwtClaims, TokenServiceError, TokenValidator, UserInfo, validate_claims};

/// Longest accepted token lifetime: one year.
pub const MAX_EXPIRE_MINUTES: i64 = 525_600;

/// Signing and lifetime settings for session tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenOptions {
    pub secret_key: String,
    pub issuer: String,
    pub audience: String,
    pub expire_minutes: i64,
}

impl Default for TokenOptions {
    fn default() -> Self {
        Self {
            secret_key: String::new(),
            issuer: String::new(),
            audience: String::new(),
            expire_minutes: 60,
        }
    }
}

impl TokenOptions {
    /// Replace every empty secret/issuer/audience with a random UUID.
    ///
    /// Tokens signed with generated values do not survive a restart.
    pub fn with_generated_defaults(mut self) -> Self {
        for value in [&mut self.secret_key, &mut self.issuer, &mut self.audience] {
            if value.is_empty() {
                *value = Uuid::new_v4().to_string();
            }
        }
        self
    }
}

pub struct JwtService {
    options: TokenOptions,
    header: Header,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl core::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("JwtService")
            .field("issuer", &self.options.issuer)
            .field("audience", &self.options.audience)
            .field("expire_minutes", &self.options.expire_minutes)
            .finish_non_exhaustive()
    }
}

impl JwtService {
    pub fn new(options: TokenOptions) -> Self {
        let options = options.with_generated_defaults();
        let secret = options.secret_key.as_bytes();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[options.issuer.as_str()]);
        validation.set_audience(&[options.audience.as_str()]);
        validation.set_required_spec_claims(&["exp", "nbf", "iss", "aud", "sub"]);
        validation.validate_nbf = true;
        validation.leeway = 0;

        Self {
            header: Header::new(Algorithm::HS256),
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            options,
        }
    }

    pub fn options(&self) -> &TokenOptions {
        &self.options
    }

    pub fn issue(&self, user: &UserInfo) -> Result<String, TokenServiceError> {
        self.issue_at(user, Utc::now())
    }

    /// Issue a token as if the current time were `now`.
    pub fn issue_at(
        &self,
        user: &UserInfo,
        now: DateTime<Utc>,
    ) -> Result<String, TokenServiceError> {
        let minutes = self.options.expire_minutes;
        let expires = Duration::try_minutes(minutes)
            .filter(|_| (1..=MAX_EXPIRE_MINUTES).contains(&minutes))
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or(TokenServiceError::InvalidLifetime(minutes))?;
        let claims = JwtClaims {
            sub: user.user_id.to_string(),
            unique_name: user.username.clone(),
            role: vec![user.role.as_str().to_string()],
            iss: self.options.issuer.clone(),
            aud: self.options.audience.clone(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: expires.timestamp(),
        };

        Ok(encode(&self.header, &claims, &self.encoding_key)?)
    }

    /// Verify and decode a token. Any rejection is an `Err`.
    pub fn decode(&self, token: &str) -> Result<JwtClaims, TokenServiceError> {
        let data = decode::<JwtClaims>(token, &self.decoding_key, &self.validation)?;
        validate_claims(&data.claims, Utc::now())?;
        Ok(data.claims)
    }

    fn accepts(&self, token: &str, role: Option<&str>) -> bool {
        match self.decode(token) {
            Ok(claims) => role.is_none_or(|r| claims.has_role(r)),
            Err(err) => {
                tracing::debug!(error = %err, "token rejected");
                false
            }
        }
    }
}

#[async_trait]
impl TokenValidator for JwtService {
    async fn validate(&self, token: &str) -> Result<bool, TokenServiceError> {
        Ok(self.accepts(token, None))
    }

    async fn validate_with_role(&self, token: &str, role: &str) -> Result<bool, TokenServiceError> {
        Ok(self.accepts(token, Some(role)))
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Role;

/// JWT claims carried by session tokens.
///
/// Timestamps are unix seconds, as on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject: the `UserInfo` primary key as a string.
    pub sub: String,

    /// Login name.
    pub unique_name: String,

    /// Canonical role names granted to the subject.
    #[serde(default)]
    pub role: Vec<String>,

    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
}

impl JwtClaims {
    /// Exact, case-sensitive membership test against the `role` claim.
    pub fn has_role(&self, role: &str) -> bool {
        self.role.iter().any(|r| r == role)
    }

    /// Roles from the claim that this build knows about; unknown names are skipped.
    pub fn roles(&self) -> Vec<Role> {
        self.role.iter().filter_map(|r| r.parse().ok()).collect()
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (nbf is in the future)")]
    NotYetValid,

    #[error("invalid token time window (exp <= iat)")]
    InvalidTimeWindow,
}

/// Deterministically validate the time window of decoded claims.
///
/// Signature, issuer and audience checks happen during decoding; this only
/// looks at `iat`/`nbf`/`exp` against `now`.
pub fn validate_claims(claims: &JwtClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    if claims.exp <= claims.iat {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    let now = now.timestamp();
    if now < claims.nbf {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.exp {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::TokenValidationError;

/// Errors a token service can report.
///
/// `validate`/`validate_with_role` answer `Ok(false)` for a token that is
/// simply not acceptable; `Err` means the service itself could not answer.
#[derive(Debug, Error)]
pub enum TokenServiceError {
    #[error("jwt error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error(transparent)]
    Claims(#[from] TokenValidationError),

    #[error("token lifetime of {0} minutes is out of range")]
    InvalidLifetime(i64),

    #[error("token service unavailable: {0}")]
    Unavailable(String),
}

/// Answers "is this token acceptable (for this role)?".
///
/// Implementations must be safe to call concurrently and must not mutate
/// shared state.
#[async_trait]
pub trait TokenValidator: Send + Sync {
    /// Signature, issuer, audience and expiry. No role check.
    async fn validate(&self, token: &str) -> Result<bool, TokenServiceError>;

    /// Everything `validate` checks, plus the `role` claim containing `role`
    /// exactly (canonical, case-sensitive name).
    async fn validate_with_role(&self, token: &str, role: &str) -> Result<bool, TokenServiceError>;
}

#[async_trait]
impl<V> TokenValidator for Arc<V>
where
    V: TokenValidator + ?Sized,
{
    async fn validate(&self, token: &str) -> Result<bool, TokenServiceError> {
        (**self).validate(token).await
    }

    async fn validate_with_role(&self, token: &str, role: &str) -> Result<bool, TokenServiceError> {
        (**self).validate_with_role(token, role).await
    }
}

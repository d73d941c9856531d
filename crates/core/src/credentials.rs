//! Credential value objects accepted at the login/registration boundary.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

const USERNAME_MAX: usize = 32;
const PASSWORD_MIN: usize = 6;
const PASSWORD_MAX: usize = 128;

/// A validated login name.
///
/// Surrounding whitespace is trimmed. Allowed characters: ASCII letters, digits,
/// `_`, `-` and `.`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    pub fn parse(raw: &str) -> DomainResult<Self> {
        let name = raw.trim();
        if name.is_empty() {
            return Err(DomainError::validation("username must not be empty"));
        }
        if name.chars().count() > USERNAME_MAX {
            return Err(DomainError::validation(format!(
                "username must be at most {USERNAME_MAX} characters"
            )));
        }
        if let Some(bad) = name
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')))
        {
            return Err(DomainError::validation(format!(
                "username contains invalid character '{bad}'"
            )));
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Username {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Username {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Username> for String {
    fn from(value: Username) -> Self {
        value.0
    }
}

/// A plaintext password on its way to being hashed or verified.
///
/// Never serialized and never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    pub fn parse(raw: &str) -> DomainResult<Self> {
        let len = raw.chars().count();
        if len < PASSWORD_MIN {
            return Err(DomainError::validation(format!(
                "password must be at least {PASSWORD_MIN} characters"
            )));
        }
        if len > PASSWORD_MAX {
            return Err(DomainError::validation(format!(
                "password must be at most {PASSWORD_MAX} characters"
            )));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Debug for Password {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("Password(***)")
    }
}

//! Argon2 password hashing (PHC string format).

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use thiserror::Error;

use flashweb_core::Password;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("password hashing failed: {0}")]
pub struct PasswordError(String);

pub fn hash_password(password: &Password) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.expose().as_bytes(), &salt)
        .map(|phc| phc.to_string())
        .map_err(|e| PasswordError(e.to_string()))
}

/// `false` for a wrong password and for an unparseable hash alike.
pub fn verify_password(hash: &str, password: &Password) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.expose().as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let pw = Password::parse("correct horse").unwrap();
        let hash = hash_password(&pw).unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password(&hash, &pw));
        assert!(!verify_password(&hash, &Password::parse("wrong horse").unwrap()));
    }

    #[test]
    fn salts_differ_between_hashes() {
        let pw = Password::parse("same-input").unwrap();
        assert_ne!(hash_password(&pw).unwrap(), hash_password(&pw).unwrap());
    }

    #[test]
    fn garbage_hash_never_verifies() {
        assert!(!verify_password("not-a-phc", &Password::parse("whatever").unwrap()));
    }
}

//! The single configured admin account.
//!
//! The password may be given in plain text or as an Argon2 PHC string
//! (`$argon2id$v=19$...`). The hashed form is recommended for production.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use domains::{AppError, CredentialVerifier, Result};
use secrecy::{ExposeSecret, SecretString};
use tracing::warn;

enum Password {
    Plain(SecretString),
    Hashed(String),
}

pub struct StaticCredentials {
    username: String,
    password: Password,
}

impl StaticCredentials {
    pub fn new(username: impl Into<String>, password: SecretString) -> Self {
        let password = if password.expose_secret().starts_with("$argon2") {
            Password::Hashed(password.expose_secret().to_string())
        } else {
            Password::Plain(password)
        };
        Self {
            username: username.into(),
            password,
        }
    }

    pub fn is_hashed(&self) -> bool {
        matches!(self.password, Password::Hashed(_))
    }
}

impl CredentialVerifier for StaticCredentials {
    fn verify(&self, username: &str, password: &str) -> bool {
        // Evaluate both halves so timing does not reveal which one failed.
        let user_ok = constant_time_eq(username.as_bytes(), self.username.as_bytes());
        let pass_ok = match &self.password {
            Password::Plain(expected) => {
                constant_time_eq(password.as_bytes(), expected.expose_secret().as_bytes())
            }
            Password::Hashed(phc) => verify_argon2(password, phc),
        };
        user_ok && pass_ok
    }
}

fn verify_argon2(password: &str, phc: &str) -> bool {
    let parsed = match PasswordHash::new(phc) {
        Ok(p) => p,
        Err(e) => {
            warn!(error = %e, "configured admin password hash is malformed");
            return false;
        }
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Produces an Argon2id PHC string suitable for `admin.password`.
pub fn hash_password(password: &str) -> Result<String> {
    let mut salt = [0u8; 16];
    getrandom::getrandom(&mut salt)
        .map_err(|e| AppError::Configuration(format!("secure random source unavailable: {e}")))?;
    let salt = SaltString::encode_b64(&salt)
        .map_err(|e| AppError::Configuration(format!("invalid salt: {e}")))?;
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Configuration(format!("password hashing failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret(s: &str) -> SecretString {
        SecretString::from(s.to_string())
    }

    #[test]
    fn plain_password_must_match_exactly() {
        let creds = StaticCredentials::new("admin", secret("hunter2"));
        assert!(!creds.is_hashed());
        assert!(creds.verify("admin", "hunter2"));
        assert!(!creds.verify("admin", "hunter"));
        assert!(!creds.verify("Admin", "hunter2"));
        assert!(!creds.verify("admin", ""));
    }

    #[test]
    fn argon2_hash_is_verified() {
        let phc = hash_password("correct horse").unwrap();
        assert!(phc.starts_with("$argon2id$"));

        let creds = StaticCredentials::new("admin", secret(&phc));
        assert!(creds.is_hashed());
        assert!(creds.verify("admin", "correct horse"));
        assert!(!creds.verify("admin", "wrong horse"));
        assert!(!creds.verify("admin", &phc));
    }

    #[test]
    fn malformed_hash_rejects_everything() {
        let creds = StaticCredentials::new("admin", secret("$argon2id$garbage"));
        assert!(!creds.verify("admin", "$argon2id$garbage"));
        assert!(!creds.verify("admin", "anything"));
    }
}

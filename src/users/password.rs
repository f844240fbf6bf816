use std::fmt;

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum HashError {
    #[error("argon2 hashing failed: {0}")]
    Hash(String),
    #[error("stored password hash is malformed: {0}")]
    Malformed(String),
}

/// An Argon2 PHC string. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretHash(String);

impl SecretHash {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[cfg(test)]
    pub(crate) fn from_stored(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }
}

impl fmt::Debug for SecretHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretHash(<redacted>)")
    }
}

/// Hashes plaintext passwords with a pepper shared by every record.
///
/// The pepper is appended to the plaintext before hashing; Argon2 still draws
/// its own random salt for every call.
#[derive(Clone)]
pub struct SecretHasher {
    pepper: String,
}

impl SecretHasher {
    pub fn new(pepper: impl Into<String>) -> Self {
        Self {
            pepper: pepper.into(),
        }
    }

    fn peppered(&self, plain: &str) -> String {
        let mut combined = String::with_capacity(plain.len() + self.pepper.len());
        combined.push_str(plain);
        combined.push_str(&self.pepper);
        combined
    }

    pub fn hash(&self, plain: &str) -> Result<SecretHash, HashError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(self.peppered(plain).as_bytes(), &salt)
            .map_err(|e| {
                error!(error = %e, "argon2 hash_password error");
                HashError::Hash(e.to_string())
            })?
            .to_string();
        Ok(SecretHash(hash))
    }

    pub fn verify(&self, plain: &str, hash: &SecretHash) -> Result<bool, HashError> {
        let parsed = PasswordHash::new(hash.as_str()).map_err(|e| {
            error!(error = %e, "argon2 parse hash error");
            HashError::Malformed(e.to_string())
        })?;
        Ok(Argon2::default()
            .verify_password(self.peppered(plain).as_bytes(), &parsed)
            .is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_roundtrip() {
        let hasher = SecretHasher::new("pepper");
        let password = "Secur3P@ssw0rd!";
        let hash = hasher.hash(password).expect("hashing should succeed");
        assert_ne!(hash.as_str(), password);
        assert!(hash.as_str().starts_with("$argon2"));
        assert!(hasher.verify(password, &hash).expect("verify should succeed"));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let hasher = SecretHasher::new("pepper");
        let hash = hasher.hash("correct-horse-battery-staple").expect("hash");
        assert!(!hasher.verify("wrong-password", &hash).expect("verify should not error"));
    }

    #[test]
    fn verify_rejects_different_pepper() {
        let hash = SecretHasher::new("pepper-a").hash("correct-horse").expect("hash");
        let other = SecretHasher::new("pepper-b");
        assert!(!other.verify("correct-horse", &hash).expect("verify"));
    }

    #[test]
    fn same_input_hashes_differently_each_call() {
        let hasher = SecretHasher::new("pepper");
        let a = hasher.hash("same-password").expect("hash");
        let b = hasher.hash("same-password").expect("hash");
        assert_ne!(a, b);
        assert!(hasher.verify("same-password", &a).expect("verify"));
        assert!(hasher.verify("same-password", &b).expect("verify"));
    }

    #[test]
    fn verify_errors_on_malformed_hash() {
        let hasher = SecretHasher::new("pepper");
        let err = hasher
            .verify("anything", &SecretHash::from_stored("not-a-valid-hash"))
            .unwrap_err();
        assert!(matches!(err, HashError::Malformed(_)));
    }

    #[test]
    fn debug_never_shows_digest() {
        let hash = SecretHasher::new("pepper").hash("pw-for-debug").expect("hash");
        assert_eq!(format!("{hash:?}"), "SecretHash(<redacted>)");
    }
}

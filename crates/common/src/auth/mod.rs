//! Credential hashing and verification
//!
//! Credentials are stored as salted argon2id PHC strings and compared through
//! the hash verifier only; plaintext never reaches the database.

use crate::errors::{AppError, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Credential storage and verification capability
pub trait CredentialVerifier: Send + Sync {
    /// Produce a storable hash for a new credential
    fn hash(&self, credential: &str) -> Result<String>;

    /// Check a presented credential against a stored hash
    fn verify(&self, credential: &str, stored_hash: &str) -> bool;
}

/// Argon2id-backed verifier
#[derive(Default)]
pub struct Argon2Verifier {
    argon2: Argon2<'static>,
}

impl Argon2Verifier {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialVerifier for Argon2Verifier {
    fn hash(&self, credential: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(credential.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::Internal {
                message: format!("Failed to hash credential: {}", e),
            })
    }

    fn verify(&self, credential: &str, stored_hash: &str) -> bool {
        match PasswordHash::new(stored_hash) {
            Ok(parsed) => self
                .argon2
                .verify_password(credential.as_bytes(), &parsed)
                .is_ok(),
            Err(e) => {
                tracing::warn!(error = %e, "Stored credential hash is not a valid PHC string");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let verifier = Argon2Verifier::new();
        let hash = verifier.hash("correct horse").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(!hash.contains("correct horse"));
        assert!(verifier.verify("correct horse", &hash));
        assert!(!verifier.verify("wrong horse", &hash));
    }

    #[test]
    fn test_hashes_are_salted() {
        let verifier = Argon2Verifier::new();
        let a = verifier.hash("same").unwrap();
        let b = verifier.hash("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_plaintext_stored_value_never_matches() {
        let verifier = Argon2Verifier::new();
        assert!(!verifier.verify("password123", "password123"));
    }
}

//! Credential verifier seam.
//!
//! The ledger never interprets a stored verifier; it only asks this trait
//! to derive one from a password or check a password against one.

use perk_core::{LedgerError, Result};

/// One-way password verifier.
pub trait PasswordHasher: Send + Sync {
    /// Derive a verifier from a plaintext password.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying primitive fails.
    fn hash(&self, password: &str) -> Result<String>;

    /// Check a plaintext password against a stored verifier. A mismatch is
    /// `Ok(false)`, not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored verifier is malformed.
    fn verify(&self, password: &str, hash: &str) -> Result<bool>;
}

/// bcrypt-backed verifier.
pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    /// Create a hasher with an explicit cost factor. Tests use
    /// `bcrypt::MIN_COST` to stay fast.
    #[must_use]
    pub const fn with_cost(cost: u32) -> Self {
        Self { cost }
    }
}

impl Default for BcryptHasher {
    fn default() -> Self {
        Self {
            cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl PasswordHasher for BcryptHasher {
    fn hash(&self, password: &str) -> Result<String> {
        bcrypt::hash(password, self.cost)
            .map_err(|e| LedgerError::storage("password_hasher.hash", e))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool> {
        bcrypt::verify(password, hash)
            .map_err(|e| LedgerError::storage("password_hasher.verify", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_roundtrip() {
        let hasher = BcryptHasher::with_cost(4);
        let hash = hasher.hash("hunter2").unwrap();

        assert!(hasher.verify("hunter2", &hash).unwrap());
        assert!(!hasher.verify("hunter3", &hash).unwrap());
    }

    #[test]
    fn verify_rejects_malformed_hash() {
        let hasher = BcryptHasher::with_cost(4);
        assert!(hasher.verify("hunter2", "not-a-bcrypt-hash").is_err());
    }
}

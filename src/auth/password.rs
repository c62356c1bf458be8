//! Password hashing and verification using Argon2
//!
//! Uses the argon2id variant. Work factors default to the argon2 crate's
//! recommended parameters and can be lowered for tests.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

use crate::types::MemberError;

/// Credential interface consumed by the identity service
pub trait CredentialHasher: Send + Sync {
    /// Hash a password into an opaque, self-describing string
    fn hash(&self, password: &str) -> Result<String, MemberError>;

    /// Check a password against a stored hash
    fn verify(&self, password: &str, hash: &str) -> Result<bool, MemberError>;
}

/// Argon2id implementation of [`CredentialHasher`]
#[derive(Clone)]
pub struct Argon2Hasher {
    params: Params,
}

impl Argon2Hasher {
    pub fn new() -> Self {
        Self {
            params: Params::default(),
        }
    }

    /// Build with explicit work factors (memory in KiB, iterations, lanes)
    pub fn with_params(m_cost: u32, t_cost: u32, p_cost: u32) -> Result<Self, MemberError> {
        let params = Params::new(m_cost, t_cost, p_cost, None)
            .map_err(|e| MemberError::Config(format!("Invalid argon2 parameters: {e}")))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl Default for Argon2Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> Result<String, MemberError> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| MemberError::Internal(format!("Failed to hash password: {e}")))
    }

    /// The stored hash carries its own parameters, so verification works
    /// regardless of the work factors this hasher was built with.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, MemberError> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| MemberError::Internal(format!("Invalid password hash format: {e}")))?;

        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_hasher() -> Argon2Hasher {
        Argon2Hasher::with_params(1024, 1, 1).unwrap()
    }

    #[test]
    fn test_hash_and_verify() {
        let hasher = fast_hasher();
        let password = "correct-horse-battery-staple";
        let hash = hasher.hash(password).unwrap();

        // PHC format
        assert!(hash.starts_with("$argon2id"));

        assert!(hasher.verify(password, &hash).unwrap());
        assert!(!hasher.verify("wrong-password", &hash).unwrap());
    }

    #[test]
    fn test_different_salts() {
        let hasher = fast_hasher();
        let hash1 = hasher.hash("same-password").unwrap();
        let hash2 = hasher.hash("same-password").unwrap();

        assert_ne!(hash1, hash2);
        assert!(hasher.verify("same-password", &hash1).unwrap());
        assert!(hasher.verify("same-password", &hash2).unwrap());
    }

    #[test]
    fn test_verify_across_work_factors() {
        let hash = fast_hasher().hash("pw123456").unwrap();
        assert!(Argon2Hasher::new().verify("pw123456", &hash).unwrap());
    }

    #[test]
    fn test_invalid_hash_format() {
        assert!(fast_hasher().verify("password", "not-a-valid-hash").is_err());
    }

    #[test]
    fn test_invalid_params_rejected() {
        assert!(Argon2Hasher::with_params(1, 1, 1).is_err());
    }
}

//! Password hashing and verification using Argon2id.
//!
//! Hashes are PHC strings, so algorithm parameters and salt travel with
//! the hash. Verification delegates to the `argon2` crate, which compares
//! digests in constant time.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use thiserror::Error;

use crate::config::AuthConfig;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("password comparison failed: {0}")]
    Comparison(String),
}

/// One-way password hashing used at registration and login.
pub trait CredentialVerifier: Send + Sync {
    /// Hash a plaintext password for storage.
    fn hash(&self, password: &str) -> Result<String, PasswordError>;

    /// Compare `password` against a stored `hash`.
    ///
    /// `Ok(false)` is a mismatch; `Err` means the comparison could not
    /// be carried out (e.g. a malformed stored hash).
    fn verify(&self, hash: &str, password: &str) -> Result<bool, PasswordError>;
}

// OWASP ASVS recommended: m=19456 (19 MiB), t=2, p=1
const MEMORY_COST_KIB: u32 = 19_456;
const TIME_COST: u32 = 2;
const PARALLELISM: u32 = 1;

/// Argon2id implementation of [`CredentialVerifier`].
#[derive(Clone, Default)]
pub struct Argon2Verifier {
    /// Server-side secret prepended to every password.
    pepper: Option<String>,
}

impl Argon2Verifier {
    pub fn new(pepper: Option<String>) -> Self {
        Self { pepper }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(config.pepper.clone())
    }

    fn hasher(&self) -> Result<Argon2<'static>, PasswordError> {
        let params = Params::new(MEMORY_COST_KIB, TIME_COST, PARALLELISM, None)
            .map_err(|e| PasswordError::Hashing(format!("argon2 params error: {e}")))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }

    fn peppered(&self, password: &str) -> Vec<u8> {
        match self.pepper.as_deref() {
            Some(p) => format!("{p}{password}").into_bytes(),
            None => password.as_bytes().to_vec(),
        }
    }
}

impl std::fmt::Debug for Argon2Verifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Argon2Verifier")
            .field("peppered", &self.pepper.is_some())
            .finish()
    }
}

impl CredentialVerifier for Argon2Verifier {
    fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let input = self.peppered(password);
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .hasher()?
            .hash_password(&input, &salt)
            .map_err(|e| PasswordError::Hashing(e.to_string()))?;

        Ok(hash.to_string())
    }

    fn verify(&self, hash: &str, password: &str) -> Result<bool, PasswordError> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| PasswordError::Comparison(format!("invalid hash format: {e}")))?;

        let input = self.peppered(password);
        match Argon2::default().verify_password(&input, &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(PasswordError::Comparison(format!("verify error: {e}"))),
        }
    }
}

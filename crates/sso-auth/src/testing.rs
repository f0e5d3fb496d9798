//! Deterministic in-process stand-ins for the cryptographic
//! collaborators.
//!
//! [`FakeVerifier`] and [`FakeSigner`] are cheap and predictable, and can
//! be told to fail, so engine tests can reach every error path without
//! paying for Argon2id or decoding JWTs.

use std::sync::atomic::{AtomicU64, Ordering};

use sha2::{Digest, Sha256};

use crate::password::{CredentialVerifier, PasswordError};
use crate::token::{TokenError, TokenSigner, TokenSubject};

const FAKE_HASH_PREFIX: &str = "fake-sha256$";

/// SHA-256 based [`CredentialVerifier`]. Not for production use.
#[derive(Debug, Clone, Default)]
pub struct FakeVerifier {
    fail_hashing: bool,
    fail_comparison: bool,
}

impl FakeVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `hash` call fails.
    pub fn failing_hash() -> Self {
        Self {
            fail_hashing: true,
            ..Self::default()
        }
    }

    /// Every `verify` call fails, even for the right password.
    pub fn failing_comparison() -> Self {
        Self {
            fail_comparison: true,
            ..Self::default()
        }
    }
}

impl CredentialVerifier for FakeVerifier {
    fn hash(&self, password: &str) -> Result<String, PasswordError> {
        if self.fail_hashing {
            return Err(PasswordError::Hashing("fake hashing failure".into()));
        }
        let digest = Sha256::digest(password.as_bytes());
        Ok(format!("{FAKE_HASH_PREFIX}{}", hex::encode(digest)))
    }

    fn verify(&self, hash: &str, password: &str) -> Result<bool, PasswordError> {
        if self.fail_comparison {
            return Err(PasswordError::Comparison("fake comparison failure".into()));
        }
        if !hash.starts_with(FAKE_HASH_PREFIX) {
            return Err(PasswordError::Comparison("not a fake hash".into()));
        }
        let digest = Sha256::digest(password.as_bytes());
        Ok(hash[FAKE_HASH_PREFIX.len()..] == hex::encode(digest))
    }
}

/// [`TokenSigner`] producing readable tokens of the form
/// `secret|user_id|email|app_id|ttl|serial`. Not for production use.
#[derive(Debug, Default)]
pub struct FakeSigner {
    fail: bool,
    serial: AtomicU64,
}

impl FakeSigner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `sign` call fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Number of tokens signed so far.
    pub fn signed(&self) -> u64 {
        self.serial.load(Ordering::SeqCst)
    }
}

impl TokenSigner for FakeSigner {
    fn sign(
        &self,
        secret: &str,
        subject: &TokenSubject<'_>,
        ttl_secs: u64,
    ) -> Result<String, TokenError> {
        if self.fail {
            return Err(TokenError::Signing("fake signing failure".into()));
        }
        let serial = self.serial.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!(
            "{secret}|{}|{}|{}|{ttl_secs}|{serial}",
            subject.user_id, subject.email, subject.app_id
        ))
    }
}

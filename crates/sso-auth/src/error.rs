//! Session-engine error taxonomy.
//!
//! A closed set of kinds callers can branch on. Variants that wrap an
//! unexpected collaborator failure carry a detail string for logs; the
//! transport layer shows only the kind.

use sso_core::error::SsoError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Rejected by the transport before reaching the engine.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Wrong password, or the comparison itself failed.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("user already exists")]
    UserAlreadyExists,

    #[error("user not found")]
    UserNotFound,

    #[error("application not found")]
    AppNotFound,

    /// Never issued, expired, or already rotated away.
    #[error("refresh session not found")]
    SessionNotFound,

    #[error("credential hashing failed: {0}")]
    CredentialHashingFailed(String),

    #[error("token signing failed: {0}")]
    TokenSigningFailed(String),

    #[error("session persist failed: {0}")]
    SessionPersistFailed(String),

    /// Catch-all for unexpected storage errors.
    #[error("directory failure: {0}")]
    DirectoryFailure(String),
}

impl AuthError {
    /// Whether this is a server-side fault rather than a caller mistake.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::CredentialHashingFailed(_)
                | Self::TokenSigningFailed(_)
                | Self::SessionPersistFailed(_)
                | Self::DirectoryFailure(_)
        )
    }
}

impl From<SsoError> for AuthError {
    fn from(err: SsoError) -> Self {
        Self::DirectoryFailure(err.to_string())
    }
}

//! Authentication configuration.

use chrono::{DateTime, Duration, Utc};

/// Configuration for the session engine.
///
/// TTLs are plain constructor input so tests can use arbitrary values,
/// including zero.
#[derive(Clone)]
pub struct AuthConfig {
    /// Access token lifetime in seconds (default: 900 = 15 minutes).
    pub access_token_ttl_secs: u64,
    /// Refresh token lifetime in seconds (default: 1_296_000 = 15 days).
    pub refresh_token_ttl_secs: u64,
    /// Random bytes per refresh token before base64url encoding.
    pub refresh_token_bytes: usize,
    /// Optional pepper prepended to passwords before Argon2id hashing
    /// and verification.
    pub pepper: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_token_ttl_secs: 900,
            refresh_token_ttl_secs: 1_296_000,
            refresh_token_bytes: 32,
            pepper: None,
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("access_token_ttl_secs", &self.access_token_ttl_secs)
            .field("refresh_token_ttl_secs", &self.refresh_token_ttl_secs)
            .field("refresh_token_bytes", &self.refresh_token_bytes)
            .field("pepper", &self.pepper.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl AuthConfig {
    /// Absolute expiry for a refresh session created at `now`.
    pub fn refresh_expiry(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        expiry_after(now, self.refresh_token_ttl_secs)
    }
}

/// `now + secs`, saturating at the largest representable instant.
pub(crate) fn expiry_after(now: DateTime<Utc>, secs: u64) -> DateTime<Utc> {
    i64::try_from(secs)
        .ok()
        .and_then(Duration::try_seconds)
        .and_then(|ttl| now.checked_add_signed(ttl))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

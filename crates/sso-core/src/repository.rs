//! Storage contracts consumed by the session engine.
//!
//! All operations are async. Implementations live in `sso-db`
//! (SurrealDB for production, in-memory for tests and local runs).
//! Missing records are reported as [`SsoError::NotFound`], email
//! collisions as [`SsoError::AlreadyExists`].
//!
//! [`SsoError::NotFound`]: crate::error::SsoError::NotFound
//! [`SsoError::AlreadyExists`]: crate::error::SsoError::AlreadyExists

use crate::error::SsoResult;
use crate::models::{
    app::{App, CreateApp},
    session::RefreshSession,
    user::{CreateUser, User},
};

// ---------------------------------------------------------------------------
// User/App directory
// ---------------------------------------------------------------------------

pub trait UserRepository: Send + Sync {
    /// Insert a user and return the directory-assigned numeric ID.
    fn create(&self, input: CreateUser) -> impl Future<Output = SsoResult<i64>> + Send;
    fn get_by_email(&self, email: &str) -> impl Future<Output = SsoResult<User>> + Send;
}

pub trait AppRepository: Send + Sync {
    fn get_by_id(&self, id: i64) -> impl Future<Output = SsoResult<App>> + Send;
    /// Provisioning only; the session engine never writes applications.
    fn create(&self, input: CreateApp) -> impl Future<Output = SsoResult<App>> + Send;
    fn get_by_name(&self, name: &str) -> impl Future<Output = SsoResult<App>> + Send;
}

// ---------------------------------------------------------------------------
// Refresh-session store
// ---------------------------------------------------------------------------

/// Key-value store for refresh sessions, keyed by the raw refresh token.
///
/// Implementations derive the physical key with
/// [`session_key`](crate::models::session::session_key) and must make a
/// record unreachable once `expires_at` has passed, with no cleanup
/// required of the caller.
pub trait RefreshSessionStore: Send + Sync {
    /// Write `session` under `token` with a TTL derived from
    /// `session.expires_at`.
    fn save(
        &self,
        token: &str,
        session: &RefreshSession,
    ) -> impl Future<Output = SsoResult<()>> + Send;
    /// Fetch a live session. Absent and expired are both `NotFound`.
    fn get(&self, token: &str) -> impl Future<Output = SsoResult<RefreshSession>> + Send;
    /// Remove a session. Deleting a missing key is not an error.
    fn delete(&self, token: &str) -> impl Future<Output = SsoResult<()>> + Send;
    /// Reclaim space held by expired records. Returns how many were
    /// removed.
    fn purge_expired(&self) -> impl Future<Output = SsoResult<u64>> + Send;
}

//! In-memory implementations of the storage contracts.
//!
//! Used by tests and by `SSO_STORAGE=memory` deployments. Every type is
//! a cheap `Clone` handle over shared state, so a test can keep a handle
//! for inspection while the engine owns another.
//!
//! The session store keeps each session as a JSON document together with
//! its expiry, mirroring a key-value store with per-key TTL: a record
//! past its expiry is never returned, and [`purge_expired`] reclaims it.
//!
//! [`purge_expired`]: RefreshSessionStore::purge_expired

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};
use sso_core::error::{SsoError, SsoResult};
use sso_core::models::app::{App, CreateApp};
use sso_core::models::session::{RefreshSession, session_key};
use sso_core::models::user::{CreateUser, User};
use sso_core::repository::{AppRepository, RefreshSessionStore, UserRepository};
use tokio::sync::RwLock;

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Default)]
struct UserTable {
    by_email: HashMap<String, User>,
    last_id: i64,
}

/// In-memory user directory keyed by email.
#[derive(Clone, Default)]
pub struct MemoryUserRepository {
    inner: Arc<RwLock<UserTable>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered users.
    pub async fn len(&self) -> usize {
        self.inner.read().await.by_email.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl UserRepository for MemoryUserRepository {
    async fn create(&self, input: CreateUser) -> SsoResult<i64> {
        let mut table = self.inner.write().await;
        if table.by_email.contains_key(&input.email) {
            return Err(SsoError::AlreadyExists {
                entity: "user".into(),
            });
        }

        table.last_id += 1;
        let user = User {
            id: table.last_id,
            email: input.email.clone(),
            password_hash: input.password_hash,
            created_at: Utc::now(),
        };
        table.by_email.insert(input.email, user);

        Ok(table.last_id)
    }

    async fn get_by_email(&self, email: &str) -> SsoResult<User> {
        self.inner
            .read()
            .await
            .by_email
            .get(email)
            .cloned()
            .ok_or_else(|| SsoError::not_found("user", format!("email={email}")))
    }
}

// ---------------------------------------------------------------------------
// Applications
// ---------------------------------------------------------------------------

/// In-memory application directory.
#[derive(Clone, Default)]
pub struct MemoryAppRepository {
    apps: Arc<RwLock<HashMap<i64, App>>>,
    last_id: Arc<AtomicI64>,
}

impl MemoryAppRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an application with a caller-chosen ID, replacing any
    /// previous entry with that ID.
    pub async fn insert(&self, app: App) {
        self.last_id.fetch_max(app.id, Ordering::SeqCst);
        self.apps.write().await.insert(app.id, app);
    }
}

impl AppRepository for MemoryAppRepository {
    async fn get_by_id(&self, id: i64) -> SsoResult<App> {
        self.apps
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| SsoError::not_found("app", id.to_string()))
    }

    async fn create(&self, input: CreateApp) -> SsoResult<App> {
        let mut apps = self.apps.write().await;
        if apps.values().any(|app| app.name == input.name) {
            return Err(SsoError::AlreadyExists {
                entity: "app".into(),
            });
        }

        let id = self.last_id.fetch_add(1, Ordering::SeqCst) + 1;
        let app = App {
            id,
            name: input.name,
            access_secret: input.access_secret,
            refresh_secret: input.refresh_secret,
            created_at: Utc::now(),
        };
        apps.insert(id, app.clone());

        Ok(app)
    }

    async fn get_by_name(&self, name: &str) -> SsoResult<App> {
        self.apps
            .read()
            .await
            .values()
            .find(|app| app.name == name)
            .cloned()
            .ok_or_else(|| SsoError::not_found("app", format!("name={name}")))
    }
}

// ---------------------------------------------------------------------------
// Refresh sessions
// ---------------------------------------------------------------------------

struct StoredSession {
    payload: Vec<u8>,
    expires_at: DateTime<Utc>,
}

/// In-memory refresh-session store with lazy expiry.
#[derive(Clone, Default)]
pub struct MemoryRefreshSessionStore {
    entries: Arc<RwLock<HashMap<String, StoredSession>>>,
}

impl MemoryRefreshSessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records held, expired ones included until purged.
    pub async fn stored(&self) -> usize {
        self.entries.read().await.len()
    }
}

impl RefreshSessionStore for MemoryRefreshSessionStore {
    async fn save(&self, token: &str, session: &RefreshSession) -> SsoResult<()> {
        let payload = serde_json::to_vec(session)?;
        self.entries.write().await.insert(
            session_key(token),
            StoredSession {
                payload,
                expires_at: session.expires_at,
            },
        );
        Ok(())
    }

    async fn get(&self, token: &str) -> SsoResult<RefreshSession> {
        let key = session_key(token);
        let entries = self.entries.read().await;

        let Some(stored) = entries.get(&key) else {
            return Err(SsoError::not_found("refresh_session", key));
        };
        let session: RefreshSession = serde_json::from_slice(&stored.payload)?;
        if session.is_expired_at(Utc::now()) {
            return Err(SsoError::not_found("refresh_session", key));
        }
        Ok(session)
    }

    async fn delete(&self, token: &str) -> SsoResult<()> {
        self.entries.write().await.remove(&session_key(token));
        Ok(())
    }

    async fn purge_expired(&self) -> SsoResult<u64> {
        let now = Utc::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, stored| stored.expires_at > now);
        Ok((before - entries.len()) as u64)
    }
}

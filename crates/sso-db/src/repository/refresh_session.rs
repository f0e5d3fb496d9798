//! SurrealDB implementation of [`RefreshSessionStore`].
//!
//! Each session is one record in `refresh_session` whose record ID is
//! the derived [`session_key`]. Reads filter on `expires_at`, so an
//! expired record is invisible even before [`purge_expired`] removes it.
//!
//! [`purge_expired`]: RefreshSessionStore::purge_expired

use chrono::{DateTime, Utc};
use sso_core::error::SsoResult;
use sso_core::models::session::{RefreshSession, session_key};
use sso_core::repository::RefreshSessionStore;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct SessionRow {
    user_id: i64,
    user_email: String,
    app_id: i64,
    ip_address: Option<String>,
    user_agent: Option<String>,
    expires_at: DateTime<Utc>,
}

impl From<SessionRow> for RefreshSession {
    fn from(row: SessionRow) -> Self {
        RefreshSession {
            user_id: row.user_id,
            user_email: row.user_email,
            app_id: row.app_id,
            ip_address: row.ip_address,
            user_agent: row.user_agent,
            expires_at: row.expires_at,
        }
    }
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB-backed refresh-session store.
#[derive(Clone)]
pub struct SurrealRefreshSessionStore<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealRefreshSessionStore<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> RefreshSessionStore for SurrealRefreshSessionStore<C> {
    async fn save(&self, token: &str, session: &RefreshSession) -> SsoResult<()> {
        let result = self
            .db
            .query(
                "UPSERT type::record('refresh_session', $key) SET \
                 user_id = $user_id, \
                 user_email = $user_email, \
                 app_id = $app_id, \
                 ip_address = $ip_address, \
                 user_agent = $user_agent, \
                 expires_at = $expires_at",
            )
            .bind(("key", session_key(token)))
            .bind(("user_id", session.user_id))
            .bind(("user_email", session.user_email.clone()))
            .bind(("app_id", session.app_id))
            .bind(("ip_address", session.ip_address.clone()))
            .bind(("user_agent", session.user_agent.clone()))
            .bind(("expires_at", session.expires_at))
            .await
            .map_err(DbError::from)?;

        result.check().map_err(|e| DbError::Query(e.to_string()))?;

        Ok(())
    }

    async fn get(&self, token: &str) -> SsoResult<RefreshSession> {
        let key = session_key(token);

        let mut result = self
            .db
            .query(
                "SELECT user_id, user_email, app_id, ip_address, user_agent, expires_at \
                 FROM type::record('refresh_session', $key) \
                 WHERE expires_at > time::now()",
            )
            .bind(("key", key.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SessionRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "refresh_session".into(),
            id: key,
        })?;

        Ok(row.into())
    }

    async fn delete(&self, token: &str) -> SsoResult<()> {
        let result = self
            .db
            .query("DELETE type::record('refresh_session', $key)")
            .bind(("key", session_key(token)))
            .await
            .map_err(DbError::from)?;

        result.check().map_err(|e| DbError::Query(e.to_string()))?;

        Ok(())
    }

    async fn purge_expired(&self) -> SsoResult<u64> {
        let cutoff = Utc::now();

        // Count expired sessions first, then delete with the same cutoff.
        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM refresh_session \
                 WHERE expires_at <= $cutoff GROUP ALL",
            )
            .bind(("cutoff", cutoff))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        self.db
            .query("DELETE refresh_session WHERE expires_at <= $cutoff")
            .bind(("cutoff", cutoff))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        Ok(total)
    }
}

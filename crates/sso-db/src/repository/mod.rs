//! SurrealDB repository implementations.

mod app;
mod refresh_session;
mod user;

pub use app::SurrealAppRepository;
pub use refresh_session::SurrealRefreshSessionStore;
pub use user::SurrealUserRepository;

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct CounterRow {
    seq: i64,
}

/// Allocate the next numeric identifier for `kind` (`user`, `app`).
///
/// The counter record is created on first use; identifiers start at 1.
pub(crate) async fn next_id<C: Connection>(db: &Surreal<C>, kind: &str) -> Result<i64, DbError> {
    let result = db
        .query("UPSERT type::record('id_counter', $kind) SET seq += 1 RETURN seq")
        .bind(("kind", kind.to_string()))
        .await
        .map_err(DbError::from)?;

    let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

    let rows: Vec<CounterRow> = result.take(0).map_err(DbError::from)?;
    rows.into_iter()
        .next()
        .map(|row| row.seq)
        .ok_or_else(|| DbError::Query(format!("id counter '{kind}' returned no value")))
}

//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode. Users and applications
//! carry a numeric identifier allocated from the `id_counter` table;
//! refresh sessions are keyed by the hashed refresh token itself.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Identifier counters (one record per entity kind)
-- =======================================================================
DEFINE TABLE id_counter SCHEMAFULL;
DEFINE FIELD seq ON TABLE id_counter TYPE int DEFAULT 0;

-- =======================================================================
-- Users
-- =======================================================================
DEFINE TABLE user SCHEMAFULL;
DEFINE FIELD user_id ON TABLE user TYPE int;
DEFINE FIELD email ON TABLE user TYPE string \
    ASSERT string::len($value) > 0;
DEFINE FIELD password_hash ON TABLE user TYPE string;
DEFINE FIELD created_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_user_user_id ON TABLE user COLUMNS user_id UNIQUE;
DEFINE INDEX idx_user_email ON TABLE user COLUMNS email UNIQUE;

-- =======================================================================
-- Applications (relying parties with their signing secrets)
-- =======================================================================
DEFINE TABLE app SCHEMAFULL;
DEFINE FIELD app_id ON TABLE app TYPE int;
DEFINE FIELD name ON TABLE app TYPE string \
    ASSERT string::len($value) > 0;
DEFINE FIELD access_secret ON TABLE app TYPE string;
DEFINE FIELD refresh_secret ON TABLE app TYPE string;
DEFINE FIELD created_at ON TABLE app TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_app_app_id ON TABLE app COLUMNS app_id UNIQUE;
DEFINE INDEX idx_app_name ON TABLE app COLUMNS name UNIQUE;

-- =======================================================================
-- Refresh sessions (record id = refresh:<sha256 of token>)
-- =======================================================================
DEFINE TABLE refresh_session SCHEMAFULL;
DEFINE FIELD user_id ON TABLE refresh_session TYPE int;
DEFINE FIELD user_email ON TABLE refresh_session TYPE string;
DEFINE FIELD app_id ON TABLE refresh_session TYPE int;
DEFINE FIELD ip_address ON TABLE refresh_session TYPE option<string>;
DEFINE FIELD user_agent ON TABLE refresh_session TYPE option<string>;
DEFINE FIELD expires_at ON TABLE refresh_session TYPE datetime;
DEFINE INDEX idx_refresh_session_expires ON TABLE refresh_session \
    COLUMNS expires_at;
DEFINE INDEX idx_refresh_session_user ON TABLE refresh_session \
    COLUMNS user_id;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Run all pending migrations against the given SurrealDB client.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let mut result = db
        .query("SELECT version FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version <= current_version {
            continue;
        }

        info!(
            version = migration.version,
            name = migration.name,
            "Applying migration"
        );
        db.query(migration.sql).await?.check().map_err(|e| {
            DbError::Migration(format!(
                "Migration v{} '{}' failed: {}",
                migration.version, migration.name, e,
            ))
        })?;

        db.query("CREATE _migration SET version = $version, name = $name")
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

        info!(version = migration.version, "Migration applied successfully");
    }

    Ok(())
}

/// Returns the raw schema DDL for version 1.
///
/// Exposed for tests that want to apply the schema directly to an
/// in-memory SurrealDB instance.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}

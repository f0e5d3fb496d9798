//! Database-specific error types and conversions.

use sso_core::error::SsoError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Record already exists: {entity}")]
    AlreadyExists { entity: String },
}

impl DbError {
    /// Classify a failed statement. SurrealDB reports unique index
    /// violations only through the message, which names the index.
    pub(crate) fn from_statement(err: surrealdb::Error, unique_index: &str, entity: &str) -> Self {
        let message = err.to_string();
        if message.contains(unique_index) {
            DbError::AlreadyExists {
                entity: entity.into(),
            }
        } else {
            DbError::Query(message)
        }
    }
}

impl From<DbError> for SsoError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => SsoError::NotFound { entity, id },
            DbError::AlreadyExists { entity } => SsoError::AlreadyExists { entity },
            other => SsoError::Database(other.to_string()),
        }
    }
}

//! User domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered identity. Created once at registration and never
/// mutated by the session engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Numeric ID assigned by the directory.
    pub id: i64,
    /// Unique, compared case-sensitively as stored.
    pub email: String,
    /// Opaque output of the password hashing primitive (PHC string).
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub email: String,
    /// Already-hashed password. The directory never sees plaintext.
    pub password_hash: String,
}

//! Application (tenant) domain model.
//!
//! Every session and every access token is bound to exactly one
//! application. The access secret of that application is the only key
//! allowed to sign its tokens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct App {
    pub id: i64,
    /// Human-readable display name, unique across applications.
    pub name: String,
    /// HMAC key for access tokens issued to this application.
    pub access_secret: String,
    /// Secret reserved for refresh-token scoping.
    pub refresh_secret: String,
    pub created_at: DateTime<Utc>,
}

// Secrets stay out of logs and panic messages.
impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("access_secret", &"<redacted>")
            .field("refresh_secret", &"<redacted>")
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Fields required to provision a new application.
#[derive(Clone, Serialize, Deserialize)]
pub struct CreateApp {
    pub name: String,
    pub access_secret: String,
    pub refresh_secret: String,
}

impl std::fmt::Debug for CreateApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateApp")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

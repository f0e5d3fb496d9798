//! Refresh-session domain model.
//!
//! A refresh session is stored under a key derived from its opaque
//! refresh token; the token itself is never a field of the record.
//! A record exists exactly while its token is neither expired nor
//! consumed by rotation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Namespace prefix for refresh-session keys in a shared store.
pub const REFRESH_KEY_PREFIX: &str = "refresh:";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshSession {
    pub user_id: i64,
    /// Copied from the user at login so refresh needs no directory
    /// round trip. Never re-read from the directory afterwards.
    pub user_email: String,
    pub app_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Absolute expiry; stores refuse to return the record from then on.
    pub expires_at: DateTime<Utc>,
}

impl RefreshSession {
    /// Successor record for a rotation: identical identity, client
    /// metadata and application binding, fresh expiry.
    pub fn rotate(&self, expires_at: DateTime<Utc>) -> Self {
        Self {
            expires_at,
            ..self.clone()
        }
    }

    /// A session is dead from its expiry instant onwards.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Store key for a raw refresh token: `refresh:` + hex(SHA-256(token)).
///
/// Hashing keeps live bearer tokens out of the store at rest.
pub fn session_key(raw_token: &str) -> String {
    let digest = Sha256::digest(raw_token.as_bytes());
    format!("{REFRESH_KEY_PREFIX}{}", hex::encode(digest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample(expires_at: DateTime<Utc>) -> RefreshSession {
        RefreshSession {
            user_id: 7,
            user_email: "alice@example.com".into(),
            app_id: 1,
            ip_address: Some("10.0.0.1".into()),
            user_agent: Some("curl/8.5".into()),
            expires_at,
        }
    }

    #[test]
    fn rotate_keeps_everything_but_expiry() {
        let now = Utc::now();
        let old = sample(now + Duration::minutes(5));
        let new = old.rotate(now + Duration::days(15));

        assert_eq!(new.user_id, old.user_id);
        assert_eq!(new.user_email, old.user_email);
        assert_eq!(new.app_id, old.app_id);
        assert_eq!(new.ip_address, old.ip_address);
        assert_eq!(new.user_agent, old.user_agent);
        assert_eq!(new.expires_at, now + Duration::days(15));
    }

    #[test]
    fn json_keeps_sub_second_expiry() {
        let session = sample(Utc::now() + Duration::milliseconds(1500));
        let bytes = serde_json::to_vec(&session).unwrap();
        let back: RefreshSession = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back, session);
    }

    #[test]
    fn optional_client_fields_are_omitted() {
        let mut session = sample(Utc::now());
        session.ip_address = None;
        session.user_agent = None;
        let json = serde_json::to_string(&session).unwrap();
        assert!(!json.contains("ip_address"));
        assert!(!json.contains("user_agent"));

        let back: RefreshSession = serde_json::from_str(&json).unwrap();
        assert_eq!(back.ip_address, None);
    }

    #[test]
    fn expiry_instant_itself_counts_as_expired() {
        let now = Utc::now();
        assert!(sample(now).is_expired_at(now));
        assert!(sample(now - Duration::seconds(1)).is_expired_at(now));
        assert!(!sample(now + Duration::seconds(30)).is_expired_at(now));
    }

    #[test]
    fn session_key_is_namespaced_and_hides_token() {
        let key = session_key("raw-token-value");
        assert!(key.starts_with(REFRESH_KEY_PREFIX));
        assert!(!key.contains("raw-token-value"));
        assert_eq!(key.len(), REFRESH_KEY_PREFIX.len() + 64);
        assert_eq!(key, session_key("raw-token-value"));
        assert_ne!(key, session_key("raw-token-valuf"));
    }
}

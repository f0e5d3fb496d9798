//! HS256 access-token issuance/verification and opaque refresh token
//! generation.
//!
//! Access tokens are signed with the access secret of the application
//! they are issued to. Refresh tokens are random bearer strings with
//! no structure; they only mean something as a store key.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::expiry_after;

/// JWT claims embedded in every access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    pub user_id: i64,
    pub email: String,
    pub app_id: i64,
    /// Issued-at (Unix timestamp).
    pub iat: i64,
    /// Expiration (Unix timestamp).
    pub exp: i64,
}

/// Identity an access token is issued for.
#[derive(Debug, Clone, Copy)]
pub struct TokenSubject<'a> {
    pub user_id: i64,
    pub email: &'a str,
    pub app_id: i64,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token signing failed: {0}")]
    Signing(String),

    #[error("token has expired")]
    Expired,

    #[error("invalid token: {0}")]
    Invalid(String),
}

/// Produces signed, time-bounded access tokens.
///
/// Implementations must set both issued-at and expiry, and must not
/// persist or verify anything.
pub trait TokenSigner: Send + Sync {
    fn sign(
        &self,
        secret: &str,
        subject: &TokenSubject<'_>,
        ttl_secs: u64,
    ) -> Result<String, TokenError>;
}

/// HMAC-SHA256 JWT signer.
#[derive(Debug, Clone, Copy, Default)]
pub struct JwtSigner;

impl TokenSigner for JwtSigner {
    fn sign(
        &self,
        secret: &str,
        subject: &TokenSubject<'_>,
        ttl_secs: u64,
    ) -> Result<String, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::Signing("empty signing secret".into()));
        }

        let now = Utc::now();
        let claims = AccessTokenClaims {
            user_id: subject.user_id,
            email: subject.email.to_string(),
            app_id: subject.app_id,
            iat: now.timestamp(),
            exp: expiry_after(now, ttl_secs).timestamp(),
        };

        let header = Header::new(Algorithm::HS256);
        let key = EncodingKey::from_secret(secret.as_bytes());
        jsonwebtoken::encode(&header, &claims, &key)
            .map_err(|e| TokenError::Signing(format!("JWT encode: {e}")))
    }
}

/// Decode and verify an HS256 access token against an application's
/// access secret.
///
/// Not used by the session engine; provided for services that consume
/// the tokens.
pub fn decode_access_token(token: &str, secret: &str) -> Result<AccessTokenClaims, TokenError> {
    let key = DecodingKey::from_secret(secret.as_bytes());
    let validation = Validation::new(Algorithm::HS256);

    jsonwebtoken::decode::<AccessTokenClaims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid(e.to_string()),
        })
}

/// Generate a cryptographically random opaque refresh token
/// (`len` bytes → base64url-encoded, no padding).
pub fn generate_refresh_token(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

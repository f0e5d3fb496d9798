//! SSO Auth: password registration/login, HS256 access-token
//! issuance and one-time refresh-token rotation.

pub mod config;
pub mod error;
pub mod password;
pub mod service;
pub mod testing;
pub mod token;

pub use config::AuthConfig;
pub use error::AuthError;
pub use password::{Argon2Verifier, CredentialVerifier, PasswordError};
pub use service::{AuthService, LoginInput, TokenPair};
pub use token::{AccessTokenClaims, JwtSigner, TokenError, TokenSigner, TokenSubject};

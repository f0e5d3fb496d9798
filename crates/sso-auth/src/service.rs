//! Session engine: registration, login and refresh-token rotation.
//!
//! The engine holds no mutable state of its own: users and applications
//! live in the directory, refresh sessions in the session store. It is
//! safe to share one instance across any number of request handlers.
//!
//! Rotation writes the successor session before deleting the consumed
//! one. A failed write aborts the refresh and leaves the old token
//! usable; a failed delete is only logged, and the store TTL removes
//! the old record eventually. Two concurrent refreshes of the same token
//! may both succeed: the store offers no compare-and-delete, so the
//! delete is cleanup, not mutual exclusion.

use chrono::Utc;
use sso_core::error::SsoError;
use sso_core::models::app::App;
use sso_core::models::session::RefreshSession;
use sso_core::models::user::CreateUser;
use sso_core::repository::{AppRepository, RefreshSessionStore, UserRepository};
use tracing::{debug, error, info, warn};

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::password::CredentialVerifier;
use crate::token::{self, TokenSigner, TokenSubject};

/// Input for the login flow.
#[derive(Clone)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
    pub app_id: i64,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl std::fmt::Debug for LoginInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginInput")
            .field("email", &self.email)
            .field("app_id", &self.app_id)
            .field("ip_address", &self.ip_address)
            .field("user_agent", &self.user_agent)
            .finish_non_exhaustive()
    }
}

/// Successful login or refresh result.
#[derive(Debug, Clone)]
pub struct TokenPair {
    /// Signed access token bound to one application.
    pub access_token: String,
    /// Raw opaque refresh token (return to client, never stored).
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: u64,
}

/// Authentication service.
///
/// Generic over the storage and crypto collaborators so the engine has
/// no dependency on the database crate or on a concrete hash/signature
/// scheme.
pub struct AuthService<U, A, S, V, K> {
    user_repo: U,
    app_repo: A,
    session_store: S,
    verifier: V,
    signer: K,
    config: AuthConfig,
}

impl<U, A, S, V, K> AuthService<U, A, S, V, K>
where
    U: UserRepository,
    A: AppRepository,
    S: RefreshSessionStore,
    V: CredentialVerifier,
    K: TokenSigner,
{
    pub fn new(
        user_repo: U,
        app_repo: A,
        session_store: S,
        verifier: V,
        signer: K,
        config: AuthConfig,
    ) -> Self {
        Self {
            user_repo,
            app_repo,
            session_store,
            verifier,
            signer,
            config,
        }
    }

    /// Register a new user and return the directory-assigned ID.
    ///
    /// Callers validate that `email` and `password` are non-empty.
    pub async fn register(&self, email: &str, password: &str) -> Result<i64, AuthError> {
        let password_hash = self.verifier.hash(password).map_err(|e| {
            error!(email, error = %e, "failed to hash password");
            AuthError::CredentialHashingFailed(e.to_string())
        })?;

        let user_id = self
            .user_repo
            .create(CreateUser {
                email: email.to_string(),
                password_hash,
            })
            .await
            .map_err(|e| match e {
                SsoError::AlreadyExists { .. } => {
                    warn!(email, "user already exists");
                    AuthError::UserAlreadyExists
                }
                other => {
                    error!(email, error = %other, "failed to save user");
                    AuthError::DirectoryFailure(other.to_string())
                }
            })?;

        info!(user_id, email, "user registered");
        Ok(user_id)
    }

    /// Authenticate with email + password and issue a token pair bound
    /// to `input.app_id`.
    ///
    /// All-or-nothing: if the session cannot be persisted the access
    /// token already signed is dropped and an error returned.
    pub async fn login(&self, input: LoginInput) -> Result<TokenPair, AuthError> {
        // 1. Look up user by email.
        let user = self
            .user_repo
            .get_by_email(&input.email)
            .await
            .map_err(|e| match e {
                SsoError::NotFound { .. } => {
                    warn!(email = %input.email, "user not found");
                    AuthError::UserNotFound
                }
                other => {
                    error!(email = %input.email, error = %other, "failed to get user");
                    AuthError::DirectoryFailure(other.to_string())
                }
            })?;

        // 2. Verify password. Mismatch and comparison failure look the same.
        match self.verifier.verify(&user.password_hash, &input.password) {
            Ok(true) => {}
            Ok(false) => {
                info!(user_id = user.id, "invalid credentials");
                return Err(AuthError::InvalidCredentials);
            }
            Err(e) => {
                warn!(user_id = user.id, error = %e, "password comparison failed");
                return Err(AuthError::InvalidCredentials);
            }
        }

        // 3. Resolve the application and sign with its secret.
        let app = self.load_app(input.app_id).await?;
        let access_token = self.issue_access_token(&app, user.id, &user.email)?;

        // 4. Create the refresh session.
        let refresh_token = token::generate_refresh_token(self.config.refresh_token_bytes);
        let session = RefreshSession {
            user_id: user.id,
            user_email: user.email,
            app_id: app.id,
            ip_address: input.ip_address,
            user_agent: input.user_agent,
            expires_at: self.config.refresh_expiry(Utc::now()),
        };

        self.session_store
            .save(&refresh_token, &session)
            .await
            .map_err(|e| {
                error!(
                    user_id = session.user_id,
                    app_id = app.id,
                    error = %e,
                    "failed to save refresh session"
                );
                AuthError::SessionPersistFailed(e.to_string())
            })?;

        info!(user_id = session.user_id, app_id = app.id, "user logged in");

        Ok(TokenPair {
            access_token,
            refresh_token,
            expires_in: self.config.access_token_ttl_secs,
        })
    }

    /// Exchange a live refresh token for a new token pair, consuming it.
    ///
    /// Identity comes from the session record, not the directory, so an
    /// email changed after login is not reflected here.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        // 1. Look up the session. Absent, expired and rotated are one case.
        let session = self
            .session_store
            .get(refresh_token)
            .await
            .map_err(|e| match e {
                SsoError::NotFound { .. } => {
                    debug!("refresh session not found");
                    AuthError::SessionNotFound
                }
                other => {
                    error!(error = %other, "failed to read refresh session");
                    AuthError::DirectoryFailure(other.to_string())
                }
            })?;

        // 2. Sign a new access token for the session's application.
        let app = self.load_app(session.app_id).await?;
        let access_token =
            self.issue_access_token(&app, session.user_id, &session.user_email)?;

        // 3. Persist the successor before touching the old record.
        let new_refresh = token::generate_refresh_token(self.config.refresh_token_bytes);
        let new_session = session.rotate(self.config.refresh_expiry(Utc::now()));

        self.session_store
            .save(&new_refresh, &new_session)
            .await
            .map_err(|e| {
                error!(
                    user_id = session.user_id,
                    app_id = app.id,
                    error = %e,
                    "failed to save rotated refresh session"
                );
                AuthError::SessionPersistFailed(e.to_string())
            })?;

        // 4. Drop the consumed session. Not fatal: the TTL is the backstop.
        if let Err(e) = self.session_store.delete(refresh_token).await {
            error!(
                user_id = session.user_id,
                app_id = app.id,
                error = %e,
                "failed to delete old refresh session"
            );
        }

        info!(
            user_id = session.user_id,
            app_id = app.id,
            "refresh token rotated"
        );

        Ok(TokenPair {
            access_token,
            refresh_token: new_refresh,
            expires_in: self.config.access_token_ttl_secs,
        })
    }

    /// Remove expired refresh sessions from the store.
    pub async fn purge_expired_sessions(&self) -> Result<u64, AuthError> {
        let purged = self.session_store.purge_expired().await?;
        if purged > 0 {
            debug!(purged, "purged expired refresh sessions");
        }
        Ok(purged)
    }

    async fn load_app(&self, app_id: i64) -> Result<App, AuthError> {
        self.app_repo.get_by_id(app_id).await.map_err(|e| match e {
            SsoError::NotFound { .. } => {
                warn!(app_id, "app not found");
                AuthError::AppNotFound
            }
            other => {
                error!(app_id, error = %other, "failed to get app");
                AuthError::DirectoryFailure(other.to_string())
            }
        })
    }

    fn issue_access_token(
        &self,
        app: &App,
        user_id: i64,
        email: &str,
    ) -> Result<String, AuthError> {
        let subject = TokenSubject {
            user_id,
            email,
            app_id: app.id,
        };
        self.signer
            .sign(&app.access_secret, &subject, self.config.access_token_ttl_secs)
            .map_err(|e| {
                error!(user_id, app_id = app.id, error = %e, "failed to sign access token");
                AuthError::TokenSigningFailed(e.to_string())
            })
    }
}

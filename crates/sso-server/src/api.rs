//! The engine surface the transport depends on.
//!
//! Handlers are generic over [`AuthApi`] rather than over the five type
//! parameters of [`AuthService`], so the router can be built over any
//! storage and crypto wiring.

use sso_auth::{AuthError, AuthService, CredentialVerifier, LoginInput, TokenPair, TokenSigner};
use sso_core::repository::{AppRepository, RefreshSessionStore, UserRepository};

pub trait AuthApi: Send + Sync + 'static {
    fn register(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<i64, AuthError>> + Send;

    fn login(&self, input: LoginInput) -> impl Future<Output = Result<TokenPair, AuthError>> + Send;

    fn refresh(
        &self,
        refresh_token: &str,
    ) -> impl Future<Output = Result<TokenPair, AuthError>> + Send;

    fn purge_expired_sessions(&self) -> impl Future<Output = Result<u64, AuthError>> + Send;
}

impl<U, A, S, V, K> AuthApi for AuthService<U, A, S, V, K>
where
    U: UserRepository + 'static,
    A: AppRepository + 'static,
    S: RefreshSessionStore + 'static,
    V: CredentialVerifier + 'static,
    K: TokenSigner + 'static,
{
    async fn register(&self, email: &str, password: &str) -> Result<i64, AuthError> {
        AuthService::register(self, email, password).await
    }

    async fn login(&self, input: LoginInput) -> Result<TokenPair, AuthError> {
        AuthService::login(self, input).await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        AuthService::refresh(self, refresh_token).await
    }

    async fn purge_expired_sessions(&self) -> Result<u64, AuthError> {
        AuthService::purge_expired_sessions(self).await
    }
}

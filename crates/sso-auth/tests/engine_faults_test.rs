//! Session engine tests over in-memory storage and fake crypto, with
//! injectable failures for every collaborator.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use chrono::{Duration, Utc};
use sso_auth::config::AuthConfig;
use sso_auth::error::AuthError;
use sso_auth::password::CredentialVerifier;
use sso_auth::service::{AuthService, LoginInput};
use sso_auth::testing::{FakeSigner, FakeVerifier};
use sso_auth::token::TokenSigner;
use sso_core::error::{SsoError, SsoResult};
use sso_core::models::app::App;
use sso_core::models::session::RefreshSession;
use sso_core::models::user::{CreateUser, User};
use sso_core::repository::{RefreshSessionStore, UserRepository};
use sso_db::memory::{MemoryAppRepository, MemoryRefreshSessionStore, MemoryUserRepository};

// ---------------------------------------------------------------------------
// Fault-injecting collaborators
// ---------------------------------------------------------------------------

/// Session store that can be switched to fail individual operations.
#[derive(Clone, Default)]
struct FlakyStore {
    inner: MemoryRefreshSessionStore,
    fail_save: Arc<AtomicBool>,
    fail_get: Arc<AtomicBool>,
    fail_delete: Arc<AtomicBool>,
    /// When set, every delete waits here until the barrier fills.
    delete_gate: Arc<OnceLock<tokio::sync::Barrier>>,
}

impl RefreshSessionStore for FlakyStore {
    async fn save(&self, token: &str, session: &RefreshSession) -> SsoResult<()> {
        if self.fail_save.load(Ordering::SeqCst) {
            return Err(SsoError::Database("store unavailable".into()));
        }
        self.inner.save(token, session).await
    }

    async fn get(&self, token: &str) -> SsoResult<RefreshSession> {
        if self.fail_get.load(Ordering::SeqCst) {
            return Err(SsoError::Database("store unavailable".into()));
        }
        self.inner.get(token).await
    }

    async fn delete(&self, token: &str) -> SsoResult<()> {
        if let Some(gate) = self.delete_gate.get() {
            gate.wait().await;
        }
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(SsoError::Database("store unavailable".into()));
        }
        self.inner.delete(token).await
    }

    async fn purge_expired(&self) -> SsoResult<u64> {
        self.inner.purge_expired().await
    }
}

/// User directory whose reads can be switched to fail.
#[derive(Clone, Default)]
struct FlakyUsers {
    inner: MemoryUserRepository,
    fail_reads: Arc<AtomicBool>,
}

impl UserRepository for FlakyUsers {
    async fn create(&self, input: CreateUser) -> SsoResult<i64> {
        self.inner.create(input).await
    }

    async fn get_by_email(&self, email: &str) -> SsoResult<User> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(SsoError::Database("directory unavailable".into()));
        }
        self.inner.get_by_email(email).await
    }
}

// ---------------------------------------------------------------------------
// Fixture
// ---------------------------------------------------------------------------

const APP_ID: i64 = 1;
const APP_SECRET: &str = "app-one-secret";

struct Fixture<V: CredentialVerifier, K: TokenSigner> {
    engine: AuthService<FlakyUsers, MemoryAppRepository, FlakyStore, V, K>,
    users: FlakyUsers,
    store: FlakyStore,
}

async fn fixture_with<V, K>(verifier: V, signer: K, config: AuthConfig) -> Fixture<V, K>
where
    V: CredentialVerifier,
    K: TokenSigner,
{
    let apps = MemoryAppRepository::new();
    apps.insert(App {
        id: APP_ID,
        name: "app-one".into(),
        access_secret: APP_SECRET.into(),
        refresh_secret: "app-one-refresh".into(),
        created_at: Utc::now(),
    })
    .await;

    let users = FlakyUsers::default();
    let store = FlakyStore::default();
    let engine = AuthService::new(users.clone(), apps, store.clone(), verifier, signer, config);

    Fixture {
        engine,
        users,
        store,
    }
}

async fn fixture() -> Fixture<FakeVerifier, FakeSigner> {
    fixture_with(FakeVerifier::new(), FakeSigner::new(), AuthConfig::default()).await
}

fn login_input(email: &str, password: &str) -> LoginInput {
    LoginInput {
        email: email.into(),
        password: password.into(),
        app_id: APP_ID,
        ip_address: Some("192.0.2.10".into()),
        user_agent: Some("Mozilla/5.0".into()),
    }
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

#[tokio::test]
async fn register_assigns_sequential_ids() {
    let fx = fixture().await;

    assert_eq!(fx.engine.register("a@example.com", "pw").await.unwrap(), 1);
    assert_eq!(fx.engine.register("b@example.com", "pw").await.unwrap(), 2);
}

#[tokio::test]
async fn duplicate_register_leaves_original_user_untouched() {
    let fx = fixture().await;
    fx.engine
        .register("alice@example.com", "pw123")
        .await
        .unwrap();
    let before = fx.users.inner.get_by_email("alice@example.com").await.unwrap();

    let err = fx
        .engine
        .register("alice@example.com", "pw456")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::UserAlreadyExists), "got {err:?}");

    let after = fx.users.inner.get_by_email("alice@example.com").await.unwrap();
    assert_eq!(before, after);
    assert_eq!(fx.users.inner.len().await, 1);
}

#[tokio::test]
async fn hashing_failure_creates_no_user() {
    let fx = fixture_with(
        FakeVerifier::failing_hash(),
        FakeSigner::new(),
        AuthConfig::default(),
    )
    .await;

    let err = fx
        .engine
        .register("alice@example.com", "pw123")
        .await
        .unwrap_err();
    assert!(
        matches!(err, AuthError::CredentialHashingFailed(_)),
        "got {err:?}"
    );
    assert!(fx.users.inner.is_empty().await);
}

// ---------------------------------------------------------------------------
// Login
// ---------------------------------------------------------------------------

#[tokio::test]
async fn login_signs_with_app_secret_and_persists_session() {
    let fx = fixture().await;
    let user_id = fx
        .engine
        .register("alice@example.com", "pw123")
        .await
        .unwrap();

    let pair = fx
        .engine
        .login(login_input("alice@example.com", "pw123"))
        .await
        .unwrap();

    assert!(
        pair.access_token
            .starts_with(&format!("{APP_SECRET}|{user_id}|alice@example.com|{APP_ID}|900|"))
    );
    assert_eq!(pair.expires_in, 900);

    let session = fx.store.get(&pair.refresh_token).await.unwrap();
    assert_eq!(session.user_id, user_id);
    assert_eq!(session.user_email, "alice@example.com");
    assert_eq!(session.app_id, APP_ID);
    assert_eq!(session.ip_address.as_deref(), Some("192.0.2.10"));
    assert_eq!(session.user_agent.as_deref(), Some("Mozilla/5.0"));

    let ttl = session.expires_at - Utc::now();
    assert!(ttl > Duration::days(14) && ttl <= Duration::days(15));
}

#[tokio::test]
async fn wrong_password_and_unknown_email_are_distinct() {
    let fx = fixture().await;
    fx.engine
        .register("alice@example.com", "pw123")
        .await
        .unwrap();

    let err = fx
        .engine
        .login(login_input("alice@example.com", "nope"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials), "got {err:?}");

    let err = fx
        .engine
        .login(login_input("mallory@example.com", "pw123"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::UserNotFound), "got {err:?}");
    assert_eq!(fx.store.inner.stored().await, 0);
}

#[tokio::test]
async fn comparison_failure_reads_as_invalid_credentials() {
    let fx = fixture_with(
        FakeVerifier::failing_comparison(),
        FakeSigner::new(),
        AuthConfig::default(),
    )
    .await;
    fx.engine
        .register("alice@example.com", "pw123")
        .await
        .unwrap();

    let err = fx
        .engine
        .login(login_input("alice@example.com", "pw123"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials), "got {err:?}");
}

#[tokio::test]
async fn directory_read_failure_is_not_user_not_found() {
    let fx = fixture().await;
    fx.engine
        .register("alice@example.com", "pw123")
        .await
        .unwrap();
    fx.users.fail_reads.store(true, Ordering::SeqCst);

    let err = fx
        .engine
        .login(login_input("alice@example.com", "pw123"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::DirectoryFailure(_)), "got {err:?}");
    assert!(err.is_internal());
}

#[tokio::test]
async fn unknown_app_creates_no_session() {
    let fx = fixture().await;
    fx.engine
        .register("alice@example.com", "pw123")
        .await
        .unwrap();

    let mut input = login_input("alice@example.com", "pw123");
    input.app_id = 42;
    let err = fx.engine.login(input).await.unwrap_err();
    assert!(matches!(err, AuthError::AppNotFound), "got {err:?}");
    assert_eq!(fx.store.inner.stored().await, 0);
}

#[tokio::test]
async fn signing_failure_creates_no_session() {
    let fx = fixture_with(
        FakeVerifier::new(),
        FakeSigner::failing(),
        AuthConfig::default(),
    )
    .await;
    fx.engine
        .register("alice@example.com", "pw123")
        .await
        .unwrap();

    let err = fx
        .engine
        .login(login_input("alice@example.com", "pw123"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::TokenSigningFailed(_)), "got {err:?}");
    assert_eq!(fx.store.inner.stored().await, 0);
}

#[tokio::test]
async fn persist_failure_on_login_returns_no_tokens() {
    let fx = fixture().await;
    fx.engine
        .register("alice@example.com", "pw123")
        .await
        .unwrap();
    fx.store.fail_save.store(true, Ordering::SeqCst);

    let err = fx
        .engine
        .login(login_input("alice@example.com", "pw123"))
        .await
        .unwrap_err();
    assert!(
        matches!(err, AuthError::SessionPersistFailed(_)),
        "got {err:?}"
    );
    assert_eq!(fx.store.inner.stored().await, 0);
}

#[tokio::test]
async fn multiple_logins_keep_separate_sessions() {
    let fx = fixture().await;
    fx.engine
        .register("alice@example.com", "pw123")
        .await
        .unwrap();

    let a = fx
        .engine
        .login(login_input("alice@example.com", "pw123"))
        .await
        .unwrap();
    let b = fx
        .engine
        .login(login_input("alice@example.com", "pw123"))
        .await
        .unwrap();

    assert_ne!(a.refresh_token, b.refresh_token);
    assert_eq!(fx.store.inner.stored().await, 2);

    fx.engine.refresh(&a.refresh_token).await.unwrap();
    assert!(fx.store.get(&b.refresh_token).await.is_ok());
}

// ---------------------------------------------------------------------------
// Refresh
// ---------------------------------------------------------------------------

#[tokio::test]
async fn refresh_rotates_and_consumes_old_token() {
    let fx = fixture().await;
    fx.engine
        .register("alice@example.com", "pw123")
        .await
        .unwrap();
    let first = fx
        .engine
        .login(login_input("alice@example.com", "pw123"))
        .await
        .unwrap();

    let second = fx.engine.refresh(&first.refresh_token).await.unwrap();
    assert_ne!(second.refresh_token, first.refresh_token);
    assert_ne!(second.access_token, first.access_token);
    assert_eq!(fx.store.inner.stored().await, 1);

    let err = fx.engine.refresh(&first.refresh_token).await.unwrap_err();
    assert!(matches!(err, AuthError::SessionNotFound), "got {err:?}");

    fx.engine.refresh(&second.refresh_token).await.unwrap();
}

#[tokio::test]
async fn concurrent_refreshes_of_one_token_both_succeed() {
    let fx = fixture().await;
    fx.engine
        .register("alice@example.com", "pw123")
        .await
        .unwrap();
    let first = fx
        .engine
        .login(login_input("alice@example.com", "pw123"))
        .await
        .unwrap();

    // Neither delete runs until both refreshes have read the old record.
    let _ = fx.store.delete_gate.set(tokio::sync::Barrier::new(2));

    let (a, b) = tokio::join!(
        fx.engine.refresh(&first.refresh_token),
        fx.engine.refresh(&first.refresh_token),
    );
    let a = a.unwrap();
    let b = b.unwrap();

    // The store has no compare-and-delete, so the token fans out.
    assert_ne!(a.refresh_token, b.refresh_token);
    assert_eq!(fx.store.inner.stored().await, 2);

    let err = fx.engine.refresh(&first.refresh_token).await.unwrap_err();
    assert!(matches!(err, AuthError::SessionNotFound), "got {err:?}");
}

#[tokio::test]
async fn refresh_carries_metadata_and_extends_expiry() {
    let fx = fixture().await;
    let original = RefreshSession {
        user_id: 77,
        user_email: "alice@example.com".into(),
        app_id: APP_ID,
        ip_address: Some("192.0.2.10".into()),
        user_agent: None,
        expires_at: Utc::now() + Duration::seconds(30),
    };
    fx.store.save("seeded", &original).await.unwrap();

    let pair = fx.engine.refresh("seeded").await.unwrap();
    let rotated = fx.store.get(&pair.refresh_token).await.unwrap();

    assert_eq!(rotated.user_id, original.user_id);
    assert_eq!(rotated.user_email, original.user_email);
    assert_eq!(rotated.app_id, original.app_id);
    assert_eq!(rotated.ip_address, original.ip_address);
    assert_eq!(rotated.user_agent, None);
    assert!(rotated.expires_at > original.expires_at + Duration::days(14));
}

#[tokio::test]
async fn refresh_signs_with_email_stored_in_session() {
    let fx = fixture().await;
    fx.store
        .save(
            "seeded",
            &RefreshSession {
                user_id: 5,
                user_email: "old-address@example.com".into(),
                app_id: APP_ID,
                ip_address: None,
                user_agent: None,
                expires_at: Utc::now() + Duration::minutes(5),
            },
        )
        .await
        .unwrap();

    let pair = fx.engine.refresh("seeded").await.unwrap();
    assert!(pair.access_token.contains("|5|old-address@example.com|"));
}

#[tokio::test]
async fn expired_session_cannot_be_refreshed() {
    let config = AuthConfig {
        refresh_token_ttl_secs: 0,
        ..AuthConfig::default()
    };
    let fx = fixture_with(FakeVerifier::new(), FakeSigner::new(), config).await;
    fx.engine
        .register("alice@example.com", "pw123")
        .await
        .unwrap();
    let pair = fx
        .engine
        .login(login_input("alice@example.com", "pw123"))
        .await
        .unwrap();

    let err = fx.engine.refresh(&pair.refresh_token).await.unwrap_err();
    assert!(matches!(err, AuthError::SessionNotFound), "got {err:?}");
}

#[tokio::test]
async fn persist_failure_on_refresh_keeps_old_token_valid() {
    let fx = fixture().await;
    fx.engine
        .register("alice@example.com", "pw123")
        .await
        .unwrap();
    let pair = fx
        .engine
        .login(login_input("alice@example.com", "pw123"))
        .await
        .unwrap();

    fx.store.fail_save.store(true, Ordering::SeqCst);
    let err = fx.engine.refresh(&pair.refresh_token).await.unwrap_err();
    assert!(
        matches!(err, AuthError::SessionPersistFailed(_)),
        "got {err:?}"
    );

    fx.store.fail_save.store(false, Ordering::SeqCst);
    fx.engine.refresh(&pair.refresh_token).await.unwrap();
}

#[tokio::test]
async fn delete_failure_still_returns_new_pair() {
    let fx = fixture().await;
    fx.engine
        .register("alice@example.com", "pw123")
        .await
        .unwrap();
    let pair = fx
        .engine
        .login(login_input("alice@example.com", "pw123"))
        .await
        .unwrap();

    fx.store.fail_delete.store(true, Ordering::SeqCst);
    let rotated = fx.engine.refresh(&pair.refresh_token).await.unwrap();

    // Both records survive until the TTL reclaims the old one.
    assert!(fx.store.get(&rotated.refresh_token).await.is_ok());
    assert!(fx.store.get(&pair.refresh_token).await.is_ok());
}

#[tokio::test]
async fn store_read_failure_is_directory_failure() {
    let fx = fixture().await;
    fx.store.fail_get.store(true, Ordering::SeqCst);

    let err = fx.engine.refresh("anything").await.unwrap_err();
    assert!(matches!(err, AuthError::DirectoryFailure(_)), "got {err:?}");
}

#[tokio::test]
async fn refresh_for_deleted_app_is_app_not_found() {
    let fx = fixture().await;
    fx.store
        .save(
            "orphan",
            &RefreshSession {
                user_id: 1,
                user_email: "alice@example.com".into(),
                app_id: 404,
                ip_address: None,
                user_agent: None,
                expires_at: Utc::now() + Duration::minutes(5),
            },
        )
        .await
        .unwrap();

    let err = fx.engine.refresh("orphan").await.unwrap_err();
    assert!(matches!(err, AuthError::AppNotFound), "got {err:?}");
    assert!(fx.store.get("orphan").await.is_ok());
}

#[tokio::test]
async fn signing_failure_on_refresh_keeps_old_token() {
    let fx = fixture_with(
        FakeVerifier::new(),
        FakeSigner::failing(),
        AuthConfig::default(),
    )
    .await;
    fx.store
        .save(
            "seeded",
            &RefreshSession {
                user_id: 1,
                user_email: "alice@example.com".into(),
                app_id: APP_ID,
                ip_address: None,
                user_agent: None,
                expires_at: Utc::now() + Duration::minutes(5),
            },
        )
        .await
        .unwrap();

    let err = fx.engine.refresh("seeded").await.unwrap_err();
    assert!(matches!(err, AuthError::TokenSigningFailed(_)), "got {err:?}");
    assert_eq!(fx.store.inner.stored().await, 1);
}

#[tokio::test]
async fn purge_reports_expired_sessions() {
    let fx = fixture().await;
    for (token, offset) in [("gone-1", -10), ("gone-2", -1), ("live", 600)] {
        fx.store
            .save(
                token,
                &RefreshSession {
                    user_id: 1,
                    user_email: "alice@example.com".into(),
                    app_id: APP_ID,
                    ip_address: None,
                    user_agent: None,
                    expires_at: Utc::now() + Duration::seconds(offset),
                },
            )
            .await
            .unwrap();
    }

    assert_eq!(fx.engine.purge_expired_sessions().await.unwrap(), 2);
    assert_eq!(fx.store.inner.stored().await, 1);
}

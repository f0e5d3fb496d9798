//! Opening the SurrealDB-backed storage.

use surrealdb::engine::remote::ws::{Client, Ws};
use surrealdb::opt::auth::Root;
use surrealdb::{Connection, Surreal};
use tracing::info;

use crate::error::DbError;
use crate::repository::{SurrealAppRepository, SurrealRefreshSessionStore, SurrealUserRepository};
use crate::schema::run_migrations;

/// Where the service keeps its users, applications and refresh sessions.
#[derive(Clone)]
pub struct DbConfig {
    /// WebSocket address (e.g., `127.0.0.1:8000`).
    pub url: String,
    pub namespace: String,
    pub database: String,
    pub username: String,
    pub password: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: "127.0.0.1:8000".into(),
            namespace: "sso".into(),
            database: "auth".into(),
            username: "root".into(),
            password: "root".into(),
        }
    }
}

impl std::fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbConfig")
            .field("url", &self.url)
            .field("namespace", &self.namespace)
            .field("database", &self.database)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// A migrated database, ready to hand out the three storage collaborators.
///
/// Every repository shares the same underlying client.
#[derive(Clone)]
pub struct SurrealStorage<C: Connection> {
    db: Surreal<C>,
}

impl SurrealStorage<Client> {
    /// Connect over WebSocket, sign in as root, select the configured
    /// namespace and database, then apply pending migrations.
    pub async fn connect(config: &DbConfig) -> Result<Self, DbError> {
        info!(
            url = %config.url,
            namespace = %config.namespace,
            database = %config.database,
            "Opening SSO storage"
        );

        let db = Surreal::new::<Ws>(config.url.as_str()).await?;
        db.signin(Root {
            username: config.username.clone(),
            password: config.password.clone(),
        })
        .await?;
        db.use_ns(&config.namespace)
            .use_db(&config.database)
            .await?;

        Self::open(db).await
    }
}

impl<C: Connection> SurrealStorage<C> {
    /// Wrap a client whose namespace and database are already selected.
    /// Migrations are applied before the storage is returned.
    pub async fn open(db: Surreal<C>) -> Result<Self, DbError> {
        run_migrations(&db).await?;
        info!("SSO storage ready");
        Ok(Self { db })
    }

    pub fn users(&self) -> SurrealUserRepository<C> {
        SurrealUserRepository::new(self.db.clone())
    }

    pub fn apps(&self) -> SurrealAppRepository<C> {
        SurrealAppRepository::new(self.db.clone())
    }

    pub fn sessions(&self) -> SurrealRefreshSessionStore<C> {
        SurrealRefreshSessionStore::new(self.db.clone())
    }

    pub fn client(&self) -> &Surreal<C> {
        &self.db
    }
}

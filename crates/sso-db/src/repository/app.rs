//! SurrealDB implementation of [`AppRepository`].

use chrono::{DateTime, Utc};
use sso_core::error::SsoResult;
use sso_core::models::app::{App, CreateApp};
use sso_core::repository::AppRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;

use super::next_id;
use crate::error::DbError;

const APP_FIELDS: &str = "app_id, name, access_secret, refresh_secret, created_at";

#[derive(Debug, SurrealValue)]
struct AppRow {
    app_id: i64,
    name: String,
    access_secret: String,
    refresh_secret: String,
    created_at: DateTime<Utc>,
}

impl From<AppRow> for App {
    fn from(row: AppRow) -> Self {
        App {
            id: row.app_id,
            name: row.name,
            access_secret: row.access_secret,
            refresh_secret: row.refresh_secret,
            created_at: row.created_at,
        }
    }
}

/// SurrealDB implementation of the App repository.
#[derive(Clone)]
pub struct SurrealAppRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealAppRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> AppRepository for SurrealAppRepository<C> {
    async fn get_by_id(&self, id: i64) -> SsoResult<App> {
        let mut result = self
            .db
            .query(format!(
                "SELECT {APP_FIELDS} FROM app WHERE app_id = $app_id LIMIT 1"
            ))
            .bind(("app_id", id))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AppRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "app".into(),
            id: id.to_string(),
        })?;

        Ok(row.into())
    }

    async fn create(&self, input: CreateApp) -> SsoResult<App> {
        let app_id = next_id(&self.db, "app").await?;

        let result = self
            .db
            .query(format!(
                "CREATE app SET \
                 app_id = $app_id, \
                 name = $name, \
                 access_secret = $access_secret, \
                 refresh_secret = $refresh_secret \
                 RETURN {APP_FIELDS}"
            ))
            .bind(("app_id", app_id))
            .bind(("name", input.name))
            .bind(("access_secret", input.access_secret))
            .bind(("refresh_secret", input.refresh_secret))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement(e, "idx_app_name", "app"))?;

        let rows: Vec<AppRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "app".into(),
            id: app_id.to_string(),
        })?;

        Ok(row.into())
    }

    async fn get_by_name(&self, name: &str) -> SsoResult<App> {
        let name_owned = name.to_string();

        let mut result = self
            .db
            .query(format!(
                "SELECT {APP_FIELDS} FROM app WHERE name = $name LIMIT 1"
            ))
            .bind(("name", name_owned.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AppRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "app".into(),
            id: format!("name={name_owned}"),
        })?;

        Ok(row.into())
    }
}

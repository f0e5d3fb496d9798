//! SSO Database: storage implementations of the `sso-core` contracts.
//!
//! This crate provides:
//! - Opening a migrated database ([`SurrealStorage`], [`DbConfig`])
//! - Schema initialization and migrations ([`run_migrations`])
//! - SurrealDB repositories for users, applications and refresh
//!   sessions ([`repository`])
//! - In-memory implementations of the same traits ([`memory`])
//! - Error types ([`DbError`])

mod connection;
mod error;
pub mod memory;
pub mod repository;
mod schema;

pub use connection::{DbConfig, SurrealStorage};
pub use error::DbError;
pub use schema::{run_migrations, schema_v1};

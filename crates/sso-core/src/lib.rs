//! SSO Core: domain models and storage contracts shared by every
//! other crate in the workspace.
//!
//! Nothing in here performs I/O. The user/app directory and the
//! refresh-session store are expressed as traits in [`repository`];
//! `sso-db` provides the SurrealDB and in-memory implementations.

pub mod error;
pub mod models;
pub mod repository;

pub use error::{SsoError, SsoResult};

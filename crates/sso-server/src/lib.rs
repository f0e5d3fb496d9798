//! SSO Server: HTTP/JSON transport over the session engine.
//!
//! The library half holds everything the binary wires together so that
//! integration tests build the exact router production serves.

pub mod api;
pub mod background;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod router;
pub mod routes;
pub mod state;

use std::sync::Arc;

use crate::api::AuthApi;

/// Shared application state available to all Axum handlers via
/// `State<AppState<E>>`.
pub struct AppState<E> {
    /// Session engine.
    pub auth: Arc<E>,
}

impl<E: AuthApi> AppState<E> {
    pub fn new(auth: Arc<E>) -> Self {
        Self { auth }
    }
}

// Manual impl: `E` itself need not be `Clone`.
impl<E> Clone for AppState<E> {
    fn clone(&self) -> Self {
        Self {
            auth: Arc::clone(&self.auth),
        }
    }
}

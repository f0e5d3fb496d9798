use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use sso_auth::AuthError;

/// Transport-level error type for HTTP handlers.
///
/// Wraps [`AuthError`] for engine outcomes and adds HTTP-specific
/// variants. Implements [`IntoResponse`] to produce consistent JSON error
/// bodies of the form `{"error": ..., "code": ...}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The request body could not be decoded.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Convenience type alias for handler return values.
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// Shorthand for a failed field check.
    pub fn invalid(message: impl Into<String>) -> Self {
        ApiError::Auth(AuthError::InvalidInput(message.into()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::Auth(auth) => match auth {
                AuthError::InvalidInput(msg) => {
                    (StatusCode::BAD_REQUEST, "INVALID_ARGUMENT", msg.clone())
                }
                // Same body for both so responses do not reveal which
                // emails are registered.
                AuthError::InvalidCredentials | AuthError::UserNotFound => (
                    StatusCode::UNAUTHORIZED,
                    "UNAUTHENTICATED",
                    "invalid email or password".to_string(),
                ),
                AuthError::UserAlreadyExists => (
                    StatusCode::CONFLICT,
                    "ALREADY_EXISTS",
                    "user already exists".to_string(),
                ),
                AuthError::AppNotFound => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    "application not found".to_string(),
                ),
                AuthError::SessionNotFound => (
                    StatusCode::UNAUTHORIZED,
                    "UNAUTHENTICATED",
                    "invalid or expired refresh token".to_string(),
                ),
                AuthError::CredentialHashingFailed(_)
                | AuthError::TokenSigningFailed(_)
                | AuthError::SessionPersistFailed(_)
                | AuthError::DirectoryFailure(_) => {
                    tracing::error!(error = %auth, "Internal auth error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL",
                        "An internal error occurred".to_string(),
                    )
                }
            },
            ApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "INVALID_ARGUMENT", msg.clone())
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

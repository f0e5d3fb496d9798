//! Register, login and refresh endpoints.
//!
//! Handlers check required fields, call the engine through [`AuthApi`]
//! and let [`ApiError`] pick the status code.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::extract::rejection::JsonRejection;
use axum::extract::{ConnectInfo, FromRequestParts, State};
use axum::http::StatusCode;
use axum::http::header::USER_AGENT;
use axum::http::request::Parts;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use sso_auth::{LoginInput, TokenPair};

use crate::api::AuthApi;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response bodies
// ---------------------------------------------------------------------------

// Missing fields decode as empty/zero and are rejected by validation
// with a field-specific message.

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: i64,
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    pub app_id: i64,
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: u64,
}

impl From<TokenPair> for TokenResponse {
    fn from(pair: TokenPair) -> Self {
        Self {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            expires_in: pair.expires_in,
        }
    }
}

// ---------------------------------------------------------------------------
// Client metadata
// ---------------------------------------------------------------------------

/// Peer address and user agent of the caller, both best-effort.
///
/// The address is only available when the server is run with
/// `into_make_service_with_connect_info::<SocketAddr>()`.
#[derive(Debug, Clone, Default)]
pub struct ClientMeta {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl<S: Send + Sync> FromRequestParts<S> for ClientMeta {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ip_address = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string());
        let user_agent = parts
            .headers
            .get(USER_AGENT)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .map(str::to_owned);

        Ok(Self {
            ip_address,
            user_agent,
        })
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

fn decode<T>(body: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

fn require(field: &str, value: &str) -> ApiResult<()> {
    if value.is_empty() {
        return Err(ApiError::invalid(format!("{field} is required")));
    }
    Ok(())
}

/// POST /api/v1/auth/register
async fn register<E: AuthApi>(
    State(state): State<AppState<E>>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    let req = decode(body)?;
    require("email", &req.email)?;
    require("password", &req.password)?;

    let user_id = state.auth.register(&req.email, &req.password).await?;

    Ok((StatusCode::CREATED, Json(RegisterResponse { user_id })))
}

/// POST /api/v1/auth/login
async fn login<E: AuthApi>(
    State(state): State<AppState<E>>,
    client: ClientMeta,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<TokenResponse>> {
    let req = decode(body)?;
    require("email", &req.email)?;
    require("password", &req.password)?;
    if req.app_id == 0 {
        return Err(ApiError::invalid("app_id is required"));
    }

    let pair = state
        .auth
        .login(LoginInput {
            email: req.email,
            password: req.password,
            app_id: req.app_id,
            ip_address: client.ip_address,
            user_agent: client.user_agent,
        })
        .await?;

    Ok(Json(pair.into()))
}

/// POST /api/v1/auth/refresh
async fn refresh<E: AuthApi>(
    State(state): State<AppState<E>>,
    body: Result<Json<RefreshRequest>, JsonRejection>,
) -> ApiResult<Json<TokenResponse>> {
    let req = decode(body)?;
    require("refresh_token", &req.refresh_token)?;

    let pair = state.auth.refresh(&req.refresh_token).await?;

    Ok(Json(pair.into()))
}

pub fn router<E: AuthApi>() -> Router<AppState<E>> {
    Router::new()
        .route("/register", post(register::<E>))
        .route("/login", post(login::<E>))
        .route("/refresh", post(refresh::<E>))
}

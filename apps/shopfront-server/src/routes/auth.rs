//! # Auth Routes
//!
//! Username/email + password login bound to the session.
//!
//! ```text
//! POST /api/login   { login, password } ──► session.user = User
//! POST /api/logout                      ──► session dropped
//! GET  /api/me                          ──► current user or null
//! ```

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde::Deserialize;
use shopfront_core::User;
use tracing::{info, warn};

use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::state::{AppState, SessionId};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/login", post(login))
        .route("/api/logout", post(logout))
        .route("/api/me", get(me))
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    /// Username or email.
    #[serde(alias = "username", alias = "email")]
    pub login: String,
    pub password: String,
}

async fn login(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
    Json(form): Json<LoginForm>,
) -> ApiResult<Json<User>> {
    let user = state
        .db
        .users()
        .verify_credentials(&form.login, &form.password)
        .await?
        .ok_or_else(|| {
            warn!(login = %form.login.trim(), "Failed login");
            ApiError::unauthorized("Invalid username or password")
        })?;

    if user.is_blocked {
        warn!(user = %user.id, "Blocked user tried to log in");
        return Err(ApiError::new(ErrorCode::Forbidden, "Account is blocked"));
    }

    info!(user = %user.id, role = ?user.role, "User logged in");
    state
        .sessions
        .update(&session, |s| s.user = Some(user.clone()));

    Ok(Json(user))
}

async fn logout(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
) -> StatusCode {
    state.sessions.remove(&session);
    StatusCode::NO_CONTENT
}

async fn me(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
) -> Json<Option<User>> {
    Json(state.sessions.read(&session, |s| s.user.clone()))
}

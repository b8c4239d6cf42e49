use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde::Deserialize;

use crate::error::AppError;
use crate::services::accounts::SessionInfo;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/password-reset", post(password_reset))
        .route("/auth/session", get(session))
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct PasswordResetRequest {
    pub email: String,
}

/// A new identity never sees the previous one's lists.
async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<SessionInfo>, AppError> {
    if let Err(err) = state.accounts.sign_in(&payload.email, &payload.password).await {
        state.notifier.danger(err.notice_text());
        return Err(err);
    }
    state.reset_views().await;

    Ok(Json(state.accounts.session_info().await?))
}

async fn logout(State(state): State<Arc<AppState>>) -> Result<StatusCode, AppError> {
    state.accounts.sign_out().await?;
    state.reset_views().await;
    Ok(StatusCode::NO_CONTENT)
}

async fn password_reset(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<PasswordResetRequest>,
) -> Result<StatusCode, AppError> {
    state.accounts.send_password_reset(&payload.email).await?;
    state.notifier.success("Password reset email sent");
    Ok(StatusCode::ACCEPTED)
}

async fn session(State(state): State<Arc<AppState>>) -> Result<Json<SessionInfo>, AppError> {
    Ok(Json(state.accounts.session_info().await?))
}

//! Login, logout and current-user handlers

use arkive_core::{ArkiveError, User};
use axum::{extract::State, response::Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::{extract::AuthUser, password::verify_password, AppState, WebResult};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

/// Authenticate with username and password and receive a session token.
///
/// Unknown usernames and wrong passwords fail identically.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> WebResult<Json<LoginResponse>> {
    let Some(row) = state.store.find_user_by_username(&request.username).await? else {
        warn!("login failed for {}", request.username);
        return Err(ArkiveError::Unauthenticated.into());
    };

    if !verify_password(&request.password, &row.password_hash) {
        warn!("login failed for {}", request.username);
        return Err(ArkiveError::Unauthenticated.into());
    }

    let token = state.access.issue(&row.id, &row.username)?;
    info!("user logged in: {}", row.username);

    Ok(Json(LoginResponse {
        token,
        user: row.into_user(),
    }))
}

/// Revoke the presented token. Idempotent; the token stays dead for the
/// process lifetime.
pub async fn logout(State(state): State<AppState>, user: AuthUser) -> WebResult<Json<Value>> {
    state.access.revoke(&user.token);
    info!("user logged out: {}", user.identity.username);

    Ok(Json(json!({ "success": true })))
}

/// The user record behind the presented token.
pub async fn current_user(
    State(state): State<AppState>,
    user: AuthUser,
) -> WebResult<Json<User>> {
    let found = state
        .store
        .find_user(user.user_id())
        .await?
        .ok_or_else(|| ArkiveError::not_found("user"))?;

    Ok(Json(found))
}

//! User and group membership handlers

use arkive_core::{ArkiveError, Group, User};
use axum::{
    extract::{Path, State},
    response::Json,
};

use crate::{extract::AuthUser, AppState, WebResult};

/// Group memberships of a user, name-ascending. Users may always list
/// their own; anyone else's require the administrator override.
pub async fn user_groups(
    State(state): State<AppState>,
    user: AuthUser,
    Path(target_id): Path<String>,
) -> WebResult<Json<Vec<Group>>> {
    let groups = state
        .access
        .visible_groups_of(user.user_id(), &target_id)
        .await?;
    Ok(Json(groups))
}

/// All groups, name-ascending. Administrators only.
pub async fn list_groups(
    State(state): State<AppState>,
    user: AuthUser,
) -> WebResult<Json<Vec<Group>>> {
    if !state.access.is_administrator(user.user_id()).await? {
        return Err(ArkiveError::permission_denied("list groups").into());
    }

    let groups = state.store.list_groups().await?;
    Ok(Json(groups))
}

/// Members of a group, username-ascending. Administrators only.
pub async fn group_members(
    State(state): State<AppState>,
    user: AuthUser,
    Path(group_id): Path<String>,
) -> WebResult<Json<Vec<User>>> {
    if !state.access.is_administrator(user.user_id()).await? {
        return Err(ArkiveError::permission_denied("list group members").into());
    }

    if state.store.find_group(&group_id).await?.is_none() {
        return Err(ArkiveError::not_found("group").into());
    }

    let members = state.store.group_members(&group_id).await?;
    Ok(Json(members))
}

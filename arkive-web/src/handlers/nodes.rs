//! Node tree handlers

use arkive_access::{ArchiveStore, Capability};
use arkive_core::{ArkiveError, Node};
use axum::{
    extract::{Path, State},
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::{extract::AuthUser, AppState, WebError, WebResult};

/// VIEW|MODIFY|DELETE for freshly created nodes.
const DEFAULT_NODE_PERMISSIONS: u32 = 7;

#[derive(Debug, Deserialize)]
pub struct CreateNodeRequest {
    pub name: String,
    pub parent_id: Option<String>,
    pub owner_group_id: Option<String>,
    pub permissions: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateNodeRequest {
    pub name: Option<String>,
    pub parent_id: Option<String>,
    pub permissions: Option<u32>,
}

/// Read a single node. Requires VIEW; a node the caller cannot see
/// answers with the same denial as any other capability, not a
/// not-found.
pub async fn get_node(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> WebResult<Json<Node>> {
    state
        .access
        .require(user.user_id(), &id, Capability::View)
        .await?;

    let node = state
        .store
        .find_node(&id)
        .await?
        .ok_or_else(|| ArkiveError::not_found("node"))?;

    Ok(Json(node))
}

/// Children of a node the caller is allowed to see, name-ascending.
pub async fn list_children(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> WebResult<Json<Vec<Node>>> {
    let children = state.access.list_children(user.user_id(), &id).await?;
    Ok(Json(children))
}

/// Create a node under a parent the caller may modify. Creating a new
/// root is reserved for administrators.
pub async fn create_node(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<CreateNodeRequest>,
) -> WebResult<Json<Node>> {
    if request.name.trim().is_empty() {
        return Err(WebError::BadRequest("node name is required".to_string()));
    }

    match &request.parent_id {
        Some(parent_id) => {
            state
                .access
                .require(user.user_id(), parent_id, Capability::Modify)
                .await?;
        }
        None => {
            if !state.access.is_administrator(user.user_id()).await? {
                return Err(ArkiveError::permission_denied("create root node").into());
            }
        }
    }

    // Ownership is exclusive: a node given to a group does not keep a
    // personal owner as well.
    let owner_user_id = if request.owner_group_id.is_none() {
        Some(user.identity.user_id.clone())
    } else {
        None
    };

    let node = Node {
        id: Uuid::new_v4().to_string(),
        name: request.name,
        parent_id: request.parent_id,
        owner_user_id,
        owner_group_id: request.owner_group_id,
        permissions: request.permissions.unwrap_or(DEFAULT_NODE_PERMISSIONS),
    };
    state.store.create_node(&node).await?;

    info!("node created: {} ({})", node.name, node.id);
    Ok(Json(node))
}

/// Rename, move or re-permission a node.
///
/// Moving runs the cycle guard before any write and needs MODIFY on the
/// destination parent as well. Changing the permission mask additionally
/// needs VIEW_PERMISSIONS.
pub async fn update_node(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(request): Json<UpdateNodeRequest>,
) -> WebResult<Json<Node>> {
    let caller = user.user_id();

    // Validate and authorize the whole request before the first write so
    // a rejected part never leaves a partial mutation behind.
    if let Some(name) = &request.name {
        if name.trim().is_empty() {
            return Err(WebError::BadRequest("node name is required".to_string()));
        }
    }

    state.access.require(caller, &id, Capability::Modify).await?;

    if let Some(parent_id) = &request.parent_id {
        state
            .access
            .require(caller, parent_id, Capability::Modify)
            .await?;
    }

    if request.permissions.is_some() {
        state
            .access
            .require(caller, &id, Capability::ViewPermissions)
            .await?;
    }

    if let Some(parent_id) = &request.parent_id {
        state.access.reparent(&id, Some(parent_id)).await?;
        info!("node {} moved under {}", id, parent_id);
    }

    if let Some(name) = &request.name {
        state.store.rename_node(&id, name).await?;
    }

    if let Some(permissions) = request.permissions {
        state.store.set_node_permissions(&id, permissions).await?;
    }

    let node = state
        .store
        .find_node(&id)
        .await?
        .ok_or_else(|| ArkiveError::not_found("node"))?;

    Ok(Json(node))
}

/// Delete a node and its whole subtree, files and metadata included.
pub async fn delete_node(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> WebResult<Json<Value>> {
    state
        .access
        .require(user.user_id(), &id, Capability::Delete)
        .await?;

    state.store.delete_node_tree(&id).await?;
    Ok(Json(json!({ "success": true })))
}

//! File and metadata handlers

use arkive_access::Capability;
use arkive_core::{ArkiveError, FileEntry, FileMetadata};
use axum::{
    extract::{Path, State},
    response::Json,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::{extract::AuthUser, AppState, WebError, WebResult};

#[derive(Debug, Deserialize)]
pub struct SaveFileRequest {
    pub name: String,
    pub size: i64,
    pub content_type: String,
    /// Base64-encoded blob
    pub file_data: String,
    #[serde(default)]
    pub metadata: Vec<FileMetadata>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteMetadataRequest {
    pub keys: Vec<String>,
}

/// Store a file and its metadata under a node. Requires MODIFY on the
/// node.
pub async fn save_file(
    State(state): State<AppState>,
    user: AuthUser,
    Path(node_id): Path<String>,
    Json(request): Json<SaveFileRequest>,
) -> WebResult<Json<FileEntry>> {
    state
        .access
        .require(user.user_id(), &node_id, Capability::Modify)
        .await?;

    let data = BASE64.decode(&request.file_data).map_err(|e| {
        debug!("rejected file payload: {}", e);
        WebError::BadRequest("invalid file data".to_string())
    })?;

    let mut entry = state
        .store
        .save_file(
            &node_id,
            &request.name,
            request.size,
            &request.content_type,
            data,
            request.metadata,
        )
        .await?;

    info!(
        "file saved: {} ({} bytes) under node {}",
        entry.name, entry.size, node_id
    );

    // Echo the payload back the way the upload sent it.
    entry.file_data = Some(request.file_data);
    Ok(Json(entry))
}

/// File metadata without the blob. Requires VIEW on the owning node.
pub async fn get_file(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> WebResult<Json<FileEntry>> {
    fetch_file(&state, &user, &id, false).await
}

/// File with its base64 blob for download. Requires VIEW on the owning
/// node.
pub async fn download_file(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> WebResult<Json<FileEntry>> {
    fetch_file(&state, &user, &id, true).await
}

async fn fetch_file(
    state: &AppState,
    user: &AuthUser,
    id: &str,
    with_data: bool,
) -> WebResult<Json<FileEntry>> {
    let node_id = state
        .store
        .find_file_node(id)
        .await?
        .ok_or_else(|| ArkiveError::not_found("file"))?;

    state
        .access
        .require(user.user_id(), &node_id, Capability::View)
        .await?;

    let entry = state
        .store
        .find_file(id, with_data)
        .await?
        .ok_or_else(|| ArkiveError::not_found("file"))?;

    Ok(Json(entry))
}

/// Delete a file and its metadata. Requires DELETE on the owning node.
pub async fn delete_file(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> WebResult<Json<Value>> {
    let node_id = state
        .store
        .find_file_node(&id)
        .await?
        .ok_or_else(|| ArkiveError::not_found("file"))?;

    state
        .access
        .require(user.user_id(), &node_id, Capability::Delete)
        .await?;

    state.store.delete_file(&id).await?;
    info!("file deleted: {}", id);
    Ok(Json(json!({ "success": true })))
}

/// Replace all metadata of a file. Requires MODIFY on the owning node.
pub async fn replace_metadata(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(entries): Json<Vec<FileMetadata>>,
) -> WebResult<Json<FileEntry>> {
    let node_id = state
        .store
        .find_file_node(&id)
        .await?
        .ok_or_else(|| ArkiveError::not_found("file"))?;

    state
        .access
        .require(user.user_id(), &node_id, Capability::Modify)
        .await?;

    state.store.replace_file_metadata(&id, &entries).await?;

    let entry = state
        .store
        .find_file(&id, false)
        .await?
        .ok_or_else(|| ArkiveError::not_found("file"))?;
    Ok(Json(entry))
}

/// Delete the named metadata keys of a file. Requires MODIFY on the
/// owning node.
pub async fn delete_metadata(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(request): Json<DeleteMetadataRequest>,
) -> WebResult<Json<FileEntry>> {
    let node_id = state
        .store
        .find_file_node(&id)
        .await?
        .ok_or_else(|| ArkiveError::not_found("file"))?;

    state
        .access
        .require(user.user_id(), &node_id, Capability::Modify)
        .await?;

    state.store.delete_file_metadata(&id, &request.keys).await?;

    let entry = state
        .store
        .find_file(&id, false)
        .await?
        .ok_or_else(|| ArkiveError::not_found("file"))?;
    Ok(Json(entry))
}

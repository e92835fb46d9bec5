//! Group management routes

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use gods_shared::{Group, GroupChanges, GroupId, NewGroup, StoreError};
use serde::{Deserialize, Serialize};

use super::users::provided;
use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct CreateGroupRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateGroupRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GroupListResponse {
    pub groups: Vec<Group>,
    pub total: usize,
}

fn validate_name(name: &str) -> ApiResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ApiError::Validation("Group name is required".to_string()));
    }
    Ok(name.to_string())
}

fn name_taken(e: StoreError) -> ApiError {
    match e {
        StoreError::Conflict(_) => ApiError::Conflict("Group already exists".to_string()),
        other => other.into(),
    }
}

/// List all groups
pub async fn list_groups(State(state): State<AppState>) -> ApiResult<Json<GroupListResponse>> {
    let groups = state.groups.list().await?;

    Ok(Json(GroupListResponse {
        total: groups.len(),
        groups,
    }))
}

/// Get a specific group by ID
pub async fn get_group(
    State(state): State<AppState>,
    Path(group_id): Path<GroupId>,
) -> ApiResult<Json<Group>> {
    let group = state.groups.get(group_id).await?.ok_or(ApiError::NotFound)?;
    Ok(Json(group))
}

/// Create a group; names are unique
pub async fn create_group(
    State(state): State<AppState>,
    Json(req): Json<CreateGroupRequest>,
) -> ApiResult<(StatusCode, Json<Group>)> {
    let group = state
        .groups
        .create(NewGroup {
            name: validate_name(&req.name)?,
            description: req.description,
        })
        .await
        .map_err(name_taken)?;

    tracing::info!(group_id = %group.id, name = %group.name, "Group created");
    Ok((StatusCode::CREATED, Json(group)))
}

/// Update the provided fields of a group
pub async fn update_group(
    State(state): State<AppState>,
    Path(group_id): Path<GroupId>,
    Json(req): Json<UpdateGroupRequest>,
) -> ApiResult<Json<Group>> {
    // An empty string leaves the field as it is
    let changes = GroupChanges {
        name: provided(req.name).as_deref().map(validate_name).transpose()?,
        description: provided(req.description),
    };

    let group = state
        .groups
        .update(group_id, changes)
        .await
        .map_err(name_taken)?;

    tracing::info!(group_id = %group.id, "Group updated");
    Ok(Json(group))
}

/// Delete a group and its memberships
pub async fn delete_group(
    State(state): State<AppState>,
    Path(group_id): Path<GroupId>,
) -> ApiResult<StatusCode> {
    state.groups.delete(group_id).await?;

    tracing::info!(group_id = %group_id, "Group deleted");
    Ok(StatusCode::NO_CONTENT)
}

//! User/group membership routes

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use gods_shared::{Group, GroupId, User, UserId};

use crate::{error::ApiResult, state::AppState};

/// Add a user to a group; adding an existing member is a no-op
pub async fn add_user_to_group(
    State(state): State<AppState>,
    Path((group_id, user_id)): Path<(GroupId, UserId)>,
) -> ApiResult<StatusCode> {
    state.memberships.add_user_to_group(user_id, group_id).await?;

    tracing::info!(user_id = %user_id, group_id = %group_id, "User added to group");
    Ok(StatusCode::NO_CONTENT)
}

/// Remove a user from a group
pub async fn remove_user_from_group(
    State(state): State<AppState>,
    Path((group_id, user_id)): Path<(GroupId, UserId)>,
) -> ApiResult<StatusCode> {
    state
        .memberships
        .remove_user_from_group(user_id, group_id)
        .await?;

    tracing::info!(user_id = %user_id, group_id = %group_id, "User removed from group");
    Ok(StatusCode::NO_CONTENT)
}

/// Groups a user belongs to
pub async fn user_groups(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> ApiResult<Json<Vec<Group>>> {
    Ok(Json(state.memberships.user_groups(user_id).await?))
}

/// Members of a group
pub async fn group_users(
    State(state): State<AppState>,
    Path(group_id): Path<GroupId>,
) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(state.memberships.group_users(group_id).await?))
}

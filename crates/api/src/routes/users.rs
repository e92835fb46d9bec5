//! User management routes

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use gods_shared::{NewUser, StoreError, User, UserChanges, UserId};
use serde::{Deserialize, Serialize};

use crate::{
    auth::{service::is_valid_email, validate_password_strength},
    error::{ApiError, ApiResult},
    state::AppState,
};

// =============================================================================
// Request/Response Types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub users: Vec<User>,
    pub total: usize,
}

fn validate_name(name: &str) -> ApiResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ApiError::Validation("Name is required".to_string()));
    }
    Ok(name.to_string())
}

fn validate_email(email: &str) -> ApiResult<String> {
    if !is_valid_email(email) {
        return Err(ApiError::Validation("Invalid email format".to_string()));
    }
    Ok(email.trim().to_string())
}

pub(super) fn provided(field: Option<String>) -> Option<String> {
    field.filter(|value| !value.is_empty())
}

fn name_taken(e: StoreError) -> ApiError {
    match e {
        StoreError::Conflict(_) => ApiError::Conflict("User already exists".to_string()),
        other => other.into(),
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// List all users
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<UserListResponse>> {
    let users = state.users.list().await?;

    Ok(Json(UserListResponse {
        total: users.len(),
        users,
    }))
}

/// Get a specific user by ID
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> ApiResult<Json<User>> {
    let user = state.users.get(user_id).await?.ok_or(ApiError::NotFound)?;
    Ok(Json(user))
}

/// Create a user on behalf of an admin
pub async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let name = validate_name(&req.name)?;
    let email = validate_email(&req.email)?;

    if state.users.find_by_name(&name).await?.is_some() {
        return Err(ApiError::Conflict("User already exists".to_string()));
    }

    validate_password_strength(&req.password).map_err(|e| ApiError::Validation(e.to_string()))?;
    let password_hash = state.auth.hash(req.password).await?;

    let user = state
        .users
        .create(NewUser {
            name,
            email,
            password_hash,
        })
        .await
        .map_err(name_taken)?;

    tracing::info!(user_id = %user.id, name = %user.name, "User created");
    Ok((StatusCode::CREATED, Json(user)))
}

/// Update the provided fields of a user
pub async fn update_user(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    Json(req): Json<UpdateUserRequest>,
) -> ApiResult<Json<User>> {
    // An empty string leaves the field as it is
    let mut changes = UserChanges {
        name: provided(req.name).as_deref().map(validate_name).transpose()?,
        email: provided(req.email).as_deref().map(validate_email).transpose()?,
        password_hash: None,
    };

    if let Some(password) = provided(req.password) {
        validate_password_strength(&password).map_err(|e| ApiError::Validation(e.to_string()))?;
        changes.password_hash = Some(state.auth.hash(password).await?);
    }

    let user = state
        .users
        .update(user_id, changes)
        .await
        .map_err(name_taken)?;

    tracing::info!(user_id = %user.id, "User updated");
    Ok(Json(user))
}

/// Delete a user and its memberships
pub async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> ApiResult<StatusCode> {
    state.users.delete(user_id).await?;

    tracing::info!(user_id = %user_id, "User deleted");
    Ok(StatusCode::NO_CONTENT)
}

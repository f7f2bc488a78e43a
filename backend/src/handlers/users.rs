//! User management handlers (admin only)

use axum::{extract::State, http::StatusCode, Json};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::user::CreateUserInput;
use crate::services::UserService;
use crate::AppState;
use shared::models::{Capability, User};

/// List users of the caller's organization
pub async fn list_users(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<User>>> {
    current_user.0.require(Capability::ManageUsers)?;
    let service = UserService::new(state.db);
    let users = service.list(current_user.0.organization_id).await?;
    Ok(Json(users))
}

/// Add a user to the caller's organization
pub async fn create_user(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateUserInput>,
) -> AppResult<(StatusCode, Json<User>)> {
    current_user.0.require(Capability::ManageUsers)?;
    let service = UserService::new(state.db);
    let user = service
        .create(current_user.0.organization_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

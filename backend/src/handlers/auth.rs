//! Authentication and profile handlers

use axum::{extract::State, http::StatusCode, Json};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::auth::{AuthResponse, LoginInput, RegisterInput};
use crate::services::user::{ChangePasswordInput, UpdateProfileInput};
use crate::services::{AuthService, UserService};
use crate::AppState;
use shared::models::User;

/// Register a new organization and its admin
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterInput>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let auth_service = AuthService::new(state.db.clone(), &state.config);
    let response = auth_service.register(input).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Login endpoint handler
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginInput>,
) -> AppResult<Json<AuthResponse>> {
    let auth_service = AuthService::new(state.db.clone(), &state.config);
    let response = auth_service.login(input).await?;
    Ok(Json(response))
}

/// Profile of the caller
pub async fn me(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<User>> {
    let service = UserService::new(state.db);
    let user = service
        .get(current_user.0.organization_id, current_user.0.user_id)
        .await?;
    Ok(Json(user))
}

pub async fn update_profile(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<UpdateProfileInput>,
) -> AppResult<Json<User>> {
    let service = UserService::new(state.db);
    let user = service
        .update_profile(current_user.0.organization_id, current_user.0.user_id, input)
        .await?;
    Ok(Json(user))
}

pub async fn change_password(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<ChangePasswordInput>,
) -> AppResult<StatusCode> {
    let service = UserService::new(state.db);
    service
        .change_password(current_user.0.organization_id, current_user.0.user_id, input)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

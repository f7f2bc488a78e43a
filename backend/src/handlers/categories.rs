//! HTTP handlers for category endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::category::{CreateCategoryInput, UpdateCategoryInput};
use crate::services::CategoryService;
use crate::AppState;
use shared::models::{Capability, Category};

pub async fn list_categories(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<Category>>> {
    let service = CategoryService::new(state.db);
    let categories = service.list(current_user.0.organization_id).await?;
    Ok(Json(categories))
}

pub async fn get_category(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(category_id): Path<Uuid>,
) -> AppResult<Json<Category>> {
    let service = CategoryService::new(state.db);
    let category = service
        .get(current_user.0.organization_id, category_id)
        .await?;
    Ok(Json(category))
}

pub async fn create_category(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateCategoryInput>,
) -> AppResult<(StatusCode, Json<Category>)> {
    let service = CategoryService::new(state.db);
    let category = service
        .create(current_user.0.organization_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn update_category(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(category_id): Path<Uuid>,
    Json(input): Json<UpdateCategoryInput>,
) -> AppResult<Json<Category>> {
    let service = CategoryService::new(state.db);
    let category = service
        .update(current_user.0.organization_id, category_id, input)
        .await?;
    Ok(Json(category))
}

/// Delete a category (admin only)
pub async fn delete_category(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(category_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    current_user.0.require(Capability::DeleteRecords)?;
    let service = CategoryService::new(state.db);
    service
        .delete(current_user.0.organization_id, category_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

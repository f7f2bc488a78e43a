//! HTTP handlers for item endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::item::{CreateItemInput, ItemListQuery, UpdateItemInput};
use crate::services::ItemService;
use crate::AppState;
use shared::models::{Capability, Item};
use shared::types::PaginatedResponse;

/// List items with pagination, sorting and filters
pub async fn list_items(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ItemListQuery>,
) -> AppResult<Json<PaginatedResponse<Item>>> {
    let service = ItemService::new(state.db);
    let items = service.list(current_user.0.organization_id, query).await?;
    Ok(Json(items))
}

pub async fn get_item(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(item_id): Path<Uuid>,
) -> AppResult<Json<Item>> {
    let service = ItemService::new(state.db);
    let item = service.get(current_user.0.organization_id, item_id).await?;
    Ok(Json(item))
}

pub async fn create_item(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateItemInput>,
) -> AppResult<(StatusCode, Json<Item>)> {
    let service = ItemService::new(state.db);
    let item = service.create(current_user.0.organization_id, input).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn update_item(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(item_id): Path<Uuid>,
    Json(input): Json<UpdateItemInput>,
) -> AppResult<Json<Item>> {
    let service = ItemService::new(state.db);
    let item = service
        .update(current_user.0.organization_id, item_id, input)
        .await?;
    Ok(Json(item))
}

/// Delete an item (admin only)
pub async fn delete_item(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(item_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    current_user.0.require(Capability::DeleteRecords)?;
    let service = ItemService::new(state.db);
    service
        .delete(current_user.0.organization_id, item_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

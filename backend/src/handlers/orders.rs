//! HTTP handlers for the order workflow

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::order::{CreateOrderInput, OrderListQuery, UpdateOrderInput};
use crate::services::OrderService;
use crate::AppState;
use shared::models::{Capability, OrderWithLines};
use shared::types::PaginatedResponse;

/// Place an order, reserving stock for all of its lines
pub async fn create_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateOrderInput>,
) -> AppResult<(StatusCode, Json<OrderWithLines>)> {
    let service = OrderService::new(state.db);
    let order = service
        .create(current_user.0.organization_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn list_orders(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<PaginatedResponse<OrderWithLines>>> {
    let service = OrderService::new(state.db);
    let orders = service.list(current_user.0.organization_id, query).await?;
    Ok(Json(orders))
}

pub async fn get_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<OrderWithLines>> {
    let service = OrderService::new(state.db);
    let order = service
        .get(current_user.0.organization_id, order_id)
        .await?;
    Ok(Json(order))
}

/// Update an order; cancelling returns its stock
pub async fn update_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(order_id): Path<Uuid>,
    Json(input): Json<UpdateOrderInput>,
) -> AppResult<Json<OrderWithLines>> {
    let service = OrderService::new(state.db);
    let order = service
        .update(current_user.0.organization_id, order_id, input)
        .await?;
    Ok(Json(order))
}

/// Delete an order (admin only)
pub async fn delete_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(order_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    current_user.0.require(Capability::DeleteRecords)?;
    let service = OrderService::new(state.db);
    service
        .delete(current_user.0.organization_id, order_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

//! Database-backed service tests
//!
//! Each test gets a fresh database with the migrations applied and drives
//! the services directly: tenant scoping, stock reservation under
//! concurrency, exactly-once restoration and price snapshots.

use inventory_backend::error::AppError;
use inventory_backend::services::category::{CreateCategoryInput, UpdateCategoryInput};
use inventory_backend::services::item::{CreateItemInput, UpdateItemInput};
use inventory_backend::services::order::{CreateOrderInput, OrderListQuery, UpdateOrderInput};
use inventory_backend::services::supplier::CreateSupplierInput;
use inventory_backend::services::{CategoryService, ItemService, OrderService, SupplierService};
use rust_decimal::Decimal;
use shared::models::{Item, OrderStatus, OrderWithLines, RequestedLine};
use sqlx::PgPool;
use uuid::Uuid;

// ============================================================================
// Fixtures
// ============================================================================

async fn organization(pool: &PgPool, name: &str) -> Uuid {
    sqlx::query_scalar::<_, Uuid>("INSERT INTO organizations (name) VALUES ($1) RETURNING id")
        .bind(name)
        .fetch_one(pool)
        .await
        .unwrap()
}

async fn stocked_item(pool: &PgPool, organization_id: Uuid, quantity: i32) -> Item {
    let category = CategoryService::new(pool.clone())
        .create(
            organization_id,
            CreateCategoryInput {
                name: format!("Hardware {}", Uuid::new_v4()),
                description: None,
            },
        )
        .await
        .unwrap();

    ItemService::new(pool.clone())
        .create(
            organization_id,
            CreateItemInput {
                name: "Bolt".into(),
                description: Some("M8 hex bolt".into()),
                category_id: category.id,
                supplier_id: None,
                quantity,
                buy_price: Decimal::new(150, 2),
                sell_price: Decimal::from(2),
            },
        )
        .await
        .unwrap()
}

fn order_input(lines: &[(Uuid, i32)]) -> CreateOrderInput {
    CreateOrderInput {
        customer_name: "Grace Hopper".into(),
        contact_no: Some("555-0100".into()),
        customer_address: None,
        order_date: None,
        items: lines
            .iter()
            .map(|(item_id, quantity)| RequestedLine {
                item_id: *item_id,
                quantity: *quantity,
            })
            .collect(),
    }
}

async fn place(pool: &PgPool, organization_id: Uuid, lines: &[(Uuid, i32)]) -> OrderWithLines {
    OrderService::new(pool.clone())
        .create(organization_id, order_input(lines))
        .await
        .unwrap()
}

async fn on_hand(pool: &PgPool, organization_id: Uuid, item_id: Uuid) -> i32 {
    ItemService::new(pool.clone())
        .get(organization_id, item_id)
        .await
        .unwrap()
        .quantity
}

fn set_status(status: OrderStatus) -> UpdateOrderInput {
    UpdateOrderInput {
        status: Some(status),
        ..Default::default()
    }
}

// ============================================================================
// Tenant Isolation
// ============================================================================

#[sqlx::test(migrations = "./migrations")]
async fn test_other_tenant_sees_nothing(pool: PgPool) {
    let org_a = organization(&pool, "Acme").await;
    let org_b = organization(&pool, "Globex").await;
    let item = stocked_item(&pool, org_a, 10).await;
    let order = place(&pool, org_a, &[(item.id, 2)]).await;

    let orders = OrderService::new(pool.clone());
    let items = ItemService::new(pool.clone());
    let categories = CategoryService::new(pool.clone());

    assert!(matches!(
        orders.get(org_b, order.order.id).await.unwrap_err(),
        AppError::NotFound(_)
    ));
    assert!(matches!(
        orders
            .update(org_b, order.order.id, set_status(OrderStatus::Cancelled))
            .await
            .unwrap_err(),
        AppError::NotFound(_)
    ));
    assert!(matches!(
        orders.delete(org_b, order.order.id).await.unwrap_err(),
        AppError::NotFound(_)
    ));
    assert!(orders
        .list(org_b, OrderListQuery::default())
        .await
        .unwrap()
        .data
        .is_empty());

    assert!(matches!(
        items.get(org_b, item.id).await.unwrap_err(),
        AppError::NotFound(_)
    ));
    let rename = UpdateItemInput {
        name: Some("Stolen".into()),
        ..Default::default()
    };
    assert!(matches!(
        items.update(org_b, item.id, rename).await.unwrap_err(),
        AppError::NotFound(_)
    ));
    assert!(matches!(
        items.delete(org_b, item.id).await.unwrap_err(),
        AppError::NotFound(_)
    ));

    let rename = UpdateCategoryInput {
        name: Some("Stolen".into()),
        description: None,
    };
    assert!(matches!(
        categories
            .update(org_b, item.category_id, rename)
            .await
            .unwrap_err(),
        AppError::NotFound(_)
    ));
    assert!(matches!(
        categories.delete(org_b, item.category_id).await.unwrap_err(),
        AppError::NotFound(_)
    ));

    // Ordering another tenant's item reserves nothing
    let err = orders
        .create(org_b, order_input(&[(item.id, 1)]))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    // Org A's data is untouched
    assert_eq!(on_hand(&pool, org_a, item.id).await, 8);
    let still_there = orders.get(org_a, order.order.id).await.unwrap();
    assert_eq!(still_there.order.status, OrderStatus::Pending);
}

// ============================================================================
// Stock Reservation
// ============================================================================

#[sqlx::test(migrations = "./migrations")]
async fn test_insufficient_stock_leaves_quantity(pool: PgPool) {
    let org = organization(&pool, "Acme").await;
    let bolt = stocked_item(&pool, org, 10).await;
    let nut = stocked_item(&pool, org, 3).await;
    let orders = OrderService::new(pool.clone());

    let err = orders
        .create(org, order_input(&[(bolt.id, 11)]))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::InsufficientStock {
            requested: 11,
            available: 10,
            ..
        }
    ));
    assert_eq!(on_hand(&pool, org, bolt.id).await, 10);

    // A failing second line rolls back the first
    let err = orders
        .create(org, order_input(&[(bolt.id, 5), (nut.id, 4)]))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InsufficientStock { .. }));
    assert_eq!(on_hand(&pool, org, bolt.id).await, 10);
    assert_eq!(on_hand(&pool, org, nut.id).await, 3);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_concurrent_orders_and_edits_never_oversell(pool: PgPool) {
    let org = organization(&pool, "Acme").await;
    let item_id = stocked_item(&pool, org, 10).await.id;

    let mut orders = Vec::new();
    let mut edits = Vec::new();
    for i in 0..25 {
        let pool_for_order = pool.clone();
        orders.push(tokio::spawn(async move {
            OrderService::new(pool_for_order)
                .create(org, order_input(&[(item_id, 1)]))
                .await
        }));

        let pool_for_edit = pool.clone();
        edits.push(tokio::spawn(async move {
            let rename = UpdateItemInput {
                name: Some(format!("Bolt rev {i}")),
                ..Default::default()
            };
            ItemService::new(pool_for_edit)
                .update(org, item_id, rename)
                .await
        }));
    }

    let mut reserved = 0;
    for handle in orders {
        match handle.await.unwrap() {
            Ok(order) => reserved += order.items[0].quantity,
            Err(err) => assert!(
                matches!(err, AppError::InsufficientStock { .. }),
                "unexpected error: {err:?}"
            ),
        }
    }
    for handle in edits {
        handle.await.unwrap().unwrap();
    }

    let left = on_hand(&pool, org, item_id).await;
    assert_eq!(reserved, 10);
    assert_eq!(left, 0);
    assert_eq!(reserved + left, 10);
}

// ============================================================================
// Cancellation and Deletion
// ============================================================================

#[sqlx::test(migrations = "./migrations")]
async fn test_cancel_twice_then_delete_restores_once(pool: PgPool) {
    let org = organization(&pool, "Acme").await;
    let item = stocked_item(&pool, org, 10).await;
    let orders = OrderService::new(pool.clone());

    let order = place(&pool, org, &[(item.id, 4)]).await;
    assert_eq!(on_hand(&pool, org, item.id).await, 6);

    let cancelled = orders
        .update(org, order.order.id, set_status(OrderStatus::Cancelled))
        .await
        .unwrap();
    assert!(cancelled.order.stock_restored);
    assert_eq!(on_hand(&pool, org, item.id).await, 10);

    orders
        .update(org, order.order.id, set_status(OrderStatus::Cancelled))
        .await
        .unwrap();
    assert_eq!(on_hand(&pool, org, item.id).await, 10);

    let err = orders
        .update(org, order.order.id, set_status(OrderStatus::Pending))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidStateTransition(_)));

    orders.delete(org, order.order.id).await.unwrap();
    assert_eq!(on_hand(&pool, org, item.id).await, 10);
    assert!(matches!(
        orders.get(org, order.order.id).await.unwrap_err(),
        AppError::NotFound(_)
    ));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_deleting_completed_order_restores(pool: PgPool) {
    let org = organization(&pool, "Acme").await;
    let item = stocked_item(&pool, org, 10).await;
    let orders = OrderService::new(pool.clone());

    let order = place(&pool, org, &[(item.id, 7)]).await;
    orders
        .update(org, order.order.id, set_status(OrderStatus::Completed))
        .await
        .unwrap();
    assert_eq!(on_hand(&pool, org, item.id).await, 3);

    orders.delete(org, order.order.id).await.unwrap();
    assert_eq!(on_hand(&pool, org, item.id).await, 10);
}

// ============================================================================
// Snapshots and Partial Updates
// ============================================================================

#[sqlx::test(migrations = "./migrations")]
async fn test_price_snapshot_survives_repricing(pool: PgPool) {
    let org = organization(&pool, "Acme").await;
    let item = stocked_item(&pool, org, 10).await;
    let order = place(&pool, org, &[(item.id, 3)]).await;

    let reprice = UpdateItemInput {
        sell_price: Some(Decimal::from(9)),
        ..Default::default()
    };
    ItemService::new(pool.clone())
        .update(org, item.id, reprice)
        .await
        .unwrap();

    let read_back = OrderService::new(pool.clone())
        .get(org, order.order.id)
        .await
        .unwrap();
    assert_eq!(read_back.items[0].price_at_purchase, Decimal::from(2));
    assert_eq!(read_back.total, Decimal::from(6));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_item_edit_keeps_stock_and_can_clear_fields(pool: PgPool) {
    let org = organization(&pool, "Acme").await;
    let supplier = SupplierService::new(pool.clone())
        .create(
            org,
            CreateSupplierInput {
                name: "Fasteners Inc".into(),
                contact_name: None,
                address: None,
                phone: None,
                email: "sales@fasteners.example".into(),
            },
        )
        .await
        .unwrap();
    let item = stocked_item(&pool, org, 10).await;
    let items = ItemService::new(pool.clone());

    let attach = UpdateItemInput {
        supplier_id: Some(Some(supplier.id)),
        ..Default::default()
    };
    let attached = items.update(org, item.id, attach).await.unwrap();
    assert_eq!(attached.supplier_id, Some(supplier.id));

    place(&pool, org, &[(item.id, 4)]).await;

    let clear: UpdateItemInput =
        serde_json::from_str(r#"{"supplierId": null, "description": null}"#).unwrap();
    let cleared = items.update(org, item.id, clear).await.unwrap();
    assert_eq!(cleared.supplier_id, None);
    assert_eq!(cleared.description, None);
    assert_eq!(cleared.name, "Bolt");
    assert_eq!(cleared.quantity, 6);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_order_contact_can_be_cleared(pool: PgPool) {
    let org = organization(&pool, "Acme").await;
    let item = stocked_item(&pool, org, 10).await;
    let order = place(&pool, org, &[(item.id, 1)]).await;
    assert_eq!(order.order.contact_no.as_deref(), Some("555-0100"));

    let clear: UpdateOrderInput = serde_json::from_str(r#"{"contactNo": null}"#).unwrap();
    let updated = OrderService::new(pool.clone())
        .update(org, order.order.id, clear)
        .await
        .unwrap();
    assert_eq!(updated.order.contact_no, None);
    assert_eq!(updated.order.customer_name, "Grace Hopper");
}

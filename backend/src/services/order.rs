//! Order workflow: stock reservation, status changes and deletion
//!
//! Every step that moves stock runs in one transaction together with the
//! order write it belongs to. Items are locked in ascending id order and the
//! order row is locked before its status changes, so concurrent requests on
//! the same item or order serialize.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use shared::models::{
    consolidate_lines, plan_reservation, resolve_payment_date, Order, OrderLine, OrderStatus,
    OrderWithLines, PaymentStatus, RequestedLine, StockEffect, StockSnapshot,
};
use shared::types::{
    double_option, range_end, range_start, DateRange, PaginatedResponse, Pagination,
};

const ORDER_COLUMNS: &str = "id, organization_id, customer_name, contact_no, customer_address, \
                             status, payment_status, order_date, payment_date, stock_restored, \
                             created_at, updated_at";

/// Filter shared by the list and count queries; binds are $1..$5
const ORDER_FILTER: &str = r#"
    organization_id = $1
    AND ($2::varchar IS NULL OR status = $2)
    AND ($3::varchar IS NULL OR payment_status = $3)
    AND ($4::timestamptz IS NULL OR order_date >= $4)
    AND ($5::timestamptz IS NULL OR order_date <= $5)
"#;

#[derive(Clone)]
pub struct OrderService {
    db: PgPool,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderInput {
    #[validate(length(min = 1, max = 200, message = "Customer name must be 1-200 characters"))]
    pub customer_name: String,
    #[validate(length(max = 50, message = "Contact number is too long"))]
    pub contact_no: Option<String>,
    pub customer_address: Option<String>,
    pub order_date: Option<DateTime<Utc>>,
    pub items: Vec<RequestedLine>,
}

/// Header fields and statuses an order update may change; lines are fixed.
/// `null` clears `contactNo` and `customerAddress`.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderInput {
    #[validate(length(min = 1, max = 200, message = "Customer name must be 1-200 characters"))]
    pub customer_name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub contact_no: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub customer_address: Option<Option<String>>,
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub payment_date: Option<DateTime<Utc>>,
    pub order_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
    #[serde(default, deserialize_with = "range_start")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "range_end")]
    pub end_date: Option<DateTime<Utc>>,
}

impl OrderListQuery {
    pub fn pagination(&self) -> Pagination {
        let default = Pagination::default();
        Pagination {
            page: self.page.unwrap_or(default.page),
            limit: self.limit.unwrap_or(default.limit),
        }
        .normalized()
    }

    pub fn range(&self) -> DateRange {
        DateRange {
            start: self.start_date,
            end: self.end_date,
        }
    }
}

const MAX_CONTACT_LEN: usize = 50;

fn check_contact_no(contact_no: Option<&str>) -> AppResult<()> {
    match contact_no {
        Some(c) if c.chars().count() > MAX_CONTACT_LEN => {
            Err(AppError::invalid("contactNo", "Contact number is too long"))
        }
        _ => Ok(()),
    }
}

pub fn check_range(range: &DateRange) -> AppResult<()> {
    if range.is_inverted() {
        return Err(AppError::invalid(
            "startDate",
            "startDate must not be after endDate",
        ));
    }
    Ok(())
}

impl OrderService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create an order, reserving stock for every line or for none.
    pub async fn create(
        &self,
        organization_id: Uuid,
        input: CreateOrderInput,
    ) -> AppResult<OrderWithLines> {
        input.validate()?;
        shared::validate_order_lines(&input.items)
            .map_err(|msg| AppError::invalid("items", msg))?;

        let lines = consolidate_lines(&input.items);
        let item_ids: Vec<Uuid> = lines.iter().map(|l| l.item_id).collect();

        let mut tx = self.db.begin().await?;

        let stock = sqlx::query_as::<_, StockSnapshot>(
            r#"
            SELECT id, name, quantity, sell_price
            FROM items
            WHERE id = ANY($1) AND organization_id = $2
            ORDER BY id
            FOR UPDATE
            "#,
        )
        .bind(&item_ids)
        .bind(organization_id)
        .fetch_all(&mut *tx)
        .await?;

        let plan = plan_reservation(&lines, &stock).map_err(|e| {
            tracing::warn!(organization_id = %organization_id, "Order rejected: {}", e);
            AppError::from(e)
        })?;

        for reservation in &plan {
            let result = sqlx::query(
                r#"
                UPDATE items
                SET quantity = quantity - $1, updated_at = NOW()
                WHERE id = $2 AND organization_id = $3 AND quantity >= $1
                "#,
            )
            .bind(reservation.quantity)
            .bind(reservation.item_id)
            .bind(organization_id)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() != 1 {
                return Err(AppError::Internal(format!(
                    "Stock of item {} changed while it was locked",
                    reservation.item_id
                )));
            }
        }

        let order = sqlx::query_as::<_, Order>(&format!(
            r#"
            INSERT INTO orders (organization_id, customer_name, contact_no, customer_address,
                                status, payment_status, order_date)
            VALUES ($1, $2, $3, $4, $5, $6, COALESCE($7, NOW()))
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(organization_id)
        .bind(input.customer_name.trim())
        .bind(&input.contact_no)
        .bind(&input.customer_address)
        .bind(OrderStatus::Pending)
        .bind(PaymentStatus::Pending)
        .bind(input.order_date)
        .fetch_one(&mut *tx)
        .await?;

        for (position, reservation) in plan.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_lines (order_id, item_id, quantity, price_at_purchase, position)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(order.id)
            .bind(reservation.item_id)
            .bind(reservation.quantity)
            .bind(reservation.price_at_purchase)
            .bind(i32::try_from(position).unwrap_or(i32::MAX))
            .execute(&mut *tx)
            .await?;
        }

        let order_lines = Self::fetch_lines(&mut tx, &[order.id]).await?;

        tx.commit().await?;

        tracing::info!(
            order_id = %order.id,
            organization_id = %organization_id,
            lines = plan.len(),
            "Order created, stock reserved"
        );

        Ok(OrderWithLines::new(order, order_lines))
    }

    pub async fn get(&self, organization_id: Uuid, order_id: Uuid) -> AppResult<OrderWithLines> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 AND organization_id = $2"
        ))
        .bind(order_id)
        .bind(organization_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Order".to_string()))?;

        let mut conn = self.db.acquire().await?;
        let lines = Self::fetch_lines(&mut conn, &[order.id]).await?;

        Ok(OrderWithLines::new(order, lines))
    }

    /// Paginated order list, newest first
    pub async fn list(
        &self,
        organization_id: Uuid,
        query: OrderListQuery,
    ) -> AppResult<PaginatedResponse<OrderWithLines>> {
        let range = query.range();
        check_range(&range)?;
        let pagination = query.pagination();

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM orders WHERE {ORDER_FILTER}"
        ))
        .bind(organization_id)
        .bind(query.status)
        .bind(query.payment_status)
        .bind(range.start)
        .bind(range.end)
        .fetch_one(&self.db)
        .await?;

        let orders = sqlx::query_as::<_, Order>(&format!(
            r#"
            SELECT {ORDER_COLUMNS} FROM orders
            WHERE {ORDER_FILTER}
            ORDER BY order_date DESC, id DESC
            LIMIT $6 OFFSET $7
            "#
        ))
        .bind(organization_id)
        .bind(query.status)
        .bind(query.payment_status)
        .bind(range.start)
        .bind(range.end)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        let orders = self.attach_lines(orders).await?;

        Ok(PaginatedResponse::new(
            orders,
            pagination,
            u64::try_from(total).unwrap_or(0),
        ))
    }

    /// Every order whose date falls in the range, oldest first
    pub async fn history(
        &self,
        organization_id: Uuid,
        range: DateRange,
    ) -> AppResult<Vec<OrderWithLines>> {
        check_range(&range)?;

        let orders = sqlx::query_as::<_, Order>(&format!(
            r#"
            SELECT {ORDER_COLUMNS} FROM orders
            WHERE {ORDER_FILTER}
            ORDER BY order_date, id
            "#
        ))
        .bind(organization_id)
        .bind(None::<OrderStatus>)
        .bind(None::<PaymentStatus>)
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.db)
        .await?;

        self.attach_lines(orders).await
    }

    /// Update header fields and statuses. The stock effect is decided from
    /// the stored status under a row lock, never from the request.
    pub async fn update(
        &self,
        organization_id: Uuid,
        order_id: Uuid,
        input: UpdateOrderInput,
    ) -> AppResult<OrderWithLines> {
        input.validate()?;
        check_contact_no(input.contact_no.as_ref().and_then(|c| c.as_deref()))?;

        let mut tx = self.db.begin().await?;
        let existing = Self::lock_order(&mut tx, organization_id, order_id).await?;

        let status = input.status.unwrap_or(existing.status);
        let effect = existing.status_change_effect(status)?;

        let stock_restored = match effect {
            StockEffect::Restore => {
                let restored = Self::restore_stock(&mut tx, organization_id, order_id).await?;
                tracing::info!(
                    order_id = %order_id,
                    items = restored,
                    "Order cancelled, stock restored"
                );
                true
            }
            StockEffect::None => existing.stock_restored,
        };

        let payment_status = input.payment_status.unwrap_or(existing.payment_status);
        let payment_date = resolve_payment_date(
            payment_status,
            existing.payment_date,
            input.payment_date,
            Utc::now(),
        );
        let customer_name = input.customer_name.unwrap_or(existing.customer_name);
        let contact_no = input.contact_no.unwrap_or(existing.contact_no);
        let customer_address = input.customer_address.unwrap_or(existing.customer_address);
        let order_date = input.order_date.unwrap_or(existing.order_date);

        let order = sqlx::query_as::<_, Order>(&format!(
            r#"
            UPDATE orders
            SET customer_name = $1, contact_no = $2, customer_address = $3, status = $4,
                payment_status = $5, payment_date = $6, order_date = $7, stock_restored = $8,
                updated_at = NOW()
            WHERE id = $9 AND organization_id = $10
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(customer_name.trim())
        .bind(&contact_no)
        .bind(&customer_address)
        .bind(status)
        .bind(payment_status)
        .bind(payment_date)
        .bind(order_date)
        .bind(stock_restored)
        .bind(order_id)
        .bind(organization_id)
        .fetch_one(&mut *tx)
        .await?;

        let lines = Self::fetch_lines(&mut tx, &[order.id]).await?;

        tx.commit().await?;

        Ok(OrderWithLines::new(order, lines))
    }

    /// Delete an order, returning its stock unless that already happened
    pub async fn delete(&self, organization_id: Uuid, order_id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;
        let existing = Self::lock_order(&mut tx, organization_id, order_id).await?;

        if existing.deletion_effect() == StockEffect::Restore {
            Self::restore_stock(&mut tx, organization_id, order_id).await?;
        }

        sqlx::query("DELETE FROM orders WHERE id = $1 AND organization_id = $2")
            .bind(order_id)
            .bind(organization_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(
            order_id = %order_id,
            restored = !existing.stock_restored,
            "Order deleted"
        );

        Ok(())
    }

    async fn lock_order(
        conn: &mut PgConnection,
        organization_id: Uuid,
        order_id: Uuid,
    ) -> AppResult<Order> {
        sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 AND organization_id = $2 FOR UPDATE"
        ))
        .bind(order_id)
        .bind(organization_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Order".to_string()))
    }

    /// Add each line's quantity back to its item; returns the rows touched.
    /// Items are locked in id order first, the same order creation uses.
    async fn restore_stock(
        conn: &mut PgConnection,
        organization_id: Uuid,
        order_id: Uuid,
    ) -> AppResult<u64> {
        sqlx::query(
            r#"
            SELECT i.id FROM items i
            WHERE i.organization_id = $2
              AND i.id IN (SELECT item_id FROM order_lines WHERE order_id = $1)
            ORDER BY i.id
            FOR UPDATE
            "#,
        )
        .bind(order_id)
        .bind(organization_id)
        .fetch_all(&mut *conn)
        .await?;

        let result = sqlx::query(
            r#"
            UPDATE items i
            SET quantity = i.quantity + ol.quantity, updated_at = NOW()
            FROM order_lines ol
            WHERE ol.order_id = $1 AND i.id = ol.item_id AND i.organization_id = $2
            "#,
        )
        .bind(order_id)
        .bind(organization_id)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected())
    }

    async fn fetch_lines(conn: &mut PgConnection, order_ids: &[Uuid]) -> AppResult<Vec<OrderLine>> {
        let lines = sqlx::query_as::<_, OrderLine>(
            r#"
            SELECT ol.id, ol.order_id, ol.item_id, i.name AS item_name, ol.quantity,
                   ol.price_at_purchase, ol.position
            FROM order_lines ol
            JOIN items i ON i.id = ol.item_id
            WHERE ol.order_id = ANY($1)
            ORDER BY ol.order_id, ol.position
            "#,
        )
        .bind(order_ids)
        .fetch_all(&mut *conn)
        .await?;

        Ok(lines)
    }

    async fn attach_lines(&self, orders: Vec<Order>) -> AppResult<Vec<OrderWithLines>> {
        let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
        let mut conn = self.db.acquire().await?;
        let lines = Self::fetch_lines(&mut conn, &ids).await?;

        let mut by_order: HashMap<Uuid, Vec<OrderLine>> = HashMap::new();
        for line in lines {
            by_order.entry(line.order_id).or_default().push(line);
        }

        Ok(orders
            .into_iter()
            .map(|order| {
                let lines = by_order.remove(&order.id).unwrap_or_default();
                OrderWithLines::new(order, lines)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn update_body_accepts_canceled_spelling() {
        let input: UpdateOrderInput = serde_json::from_str(r#"{"status":"canceled"}"#).unwrap();
        assert_eq!(input.status, Some(OrderStatus::Cancelled));
        assert!(input.customer_name.is_none());
    }

    #[test]
    fn create_body_has_no_client_price() {
        let body = r#"{
            "customerName": "Ada",
            "items": [{"itemId": "6f0c1e9a-8d2b-4a37-9c55-2f1d3e4b5a60", "quantity": 2}]
        }"#;
        let input: CreateOrderInput = serde_json::from_str(body).unwrap();
        assert_eq!(input.items.len(), 1);
        assert_eq!(input.items[0].quantity, 2);
        assert!(input.order_date.is_none());
    }

    #[test]
    fn inverted_date_filter_is_rejected() {
        let query = OrderListQuery {
            start_date: Some(Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap()),
            end_date: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
            ..Default::default()
        };
        assert!(matches!(
            check_range(&query.range()),
            Err(AppError::Validation { .. })
        ));
        assert!(check_range(&OrderListQuery::default().range()).is_ok());
    }

    #[test]
    fn update_body_distinguishes_null_from_absent() {
        let input: UpdateOrderInput =
            serde_json::from_str(r#"{"contactNo": null, "status": "completed"}"#).unwrap();
        assert_eq!(input.contact_no, Some(None));
        assert_eq!(input.customer_address, None);
    }

    #[test]
    fn overlong_contact_number_is_rejected() {
        let long = "9".repeat(MAX_CONTACT_LEN + 1);
        assert!(check_contact_no(Some(&long)).is_err());
        assert!(check_contact_no(Some("555-0100")).is_ok());
        assert!(check_contact_no(None).is_ok());
    }
}

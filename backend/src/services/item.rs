//! Item catalog service

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use shared::models::{Item, ItemSortField};
use shared::types::{double_option, PaginatedResponse, Pagination, SortOrder};

const ITEM_COLUMNS: &str = "id, organization_id, category_id, supplier_id, name, description, \
                            quantity, buy_price, sell_price, created_at, updated_at";

/// Filter shared by the list and count queries; binds are $1..$4
const ITEM_FILTER: &str = r#"
    organization_id = $1
    AND ($2::uuid IS NULL OR category_id = $2)
    AND ($3::uuid IS NULL OR supplier_id = $3)
    AND ($4::text IS NULL OR name ILIKE $4)
"#;

#[derive(Clone)]
pub struct ItemService {
    db: PgPool,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateItemInput {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,
    pub description: Option<String>,
    pub category_id: Uuid,
    pub supplier_id: Option<Uuid>,
    #[serde(default)]
    pub quantity: i32,
    pub buy_price: Decimal,
    pub sell_price: Decimal,
}

/// Partial update; `null` clears `description` and `supplierId`
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemInput {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub category_id: Option<Uuid>,
    #[serde(default, deserialize_with = "double_option")]
    pub supplier_id: Option<Option<Uuid>>,
    pub quantity: Option<i32>,
    pub buy_price: Option<Decimal>,
    pub sell_price: Option<Decimal>,
}

/// Query string of the item list
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort: Option<ItemSortField>,
    pub order: Option<SortOrder>,
    pub category_id: Option<Uuid>,
    pub supplier_id: Option<Uuid>,
    pub search: Option<String>,
}

impl ItemListQuery {
    pub fn pagination(&self) -> Pagination {
        let default = Pagination::default();
        Pagination {
            page: self.page.unwrap_or(default.page),
            limit: self.limit.unwrap_or(default.limit),
        }
        .normalized()
    }
}

/// `ORDER BY` clause from whitelisted parts only; `id` breaks ties so pages
/// are stable
fn order_clause(sort: ItemSortField, order: SortOrder) -> String {
    format!("ORDER BY {} {}, id {}", sort.column(), order.as_sql(), order.as_sql())
}

/// Case-insensitive substring pattern with LIKE wildcards escaped
fn like_pattern(search: &str) -> Option<String> {
    let trimmed = search.trim();
    if trimmed.is_empty() {
        return None;
    }
    let mut escaped = String::with_capacity(trimmed.len() + 2);
    escaped.push('%');
    for c in trimmed.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    Some(escaped)
}

fn check_stock_fields(quantity: i32, buy_price: Decimal, sell_price: Decimal) -> AppResult<()> {
    shared::validate_stock_quantity(quantity).map_err(|msg| AppError::invalid("quantity", msg))?;
    shared::validate_price(buy_price).map_err(|msg| AppError::invalid("buyPrice", msg))?;
    shared::validate_price(sell_price).map_err(|msg| AppError::invalid("sellPrice", msg))?;
    Ok(())
}

impl ItemService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Paginated, filtered and sorted list of an organization's items
    pub async fn list(
        &self,
        organization_id: Uuid,
        query: ItemListQuery,
    ) -> AppResult<PaginatedResponse<Item>> {
        let pagination = query.pagination();
        let search = query.search.as_deref().and_then(like_pattern);
        let order_by = order_clause(
            query.sort.unwrap_or_default(),
            query.order.unwrap_or_default(),
        );

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM items WHERE {ITEM_FILTER}"
        ))
        .bind(organization_id)
        .bind(query.category_id)
        .bind(query.supplier_id)
        .bind(&search)
        .fetch_one(&self.db)
        .await?;

        let items = sqlx::query_as::<_, Item>(&format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE {ITEM_FILTER} {order_by} LIMIT $5 OFFSET $6"
        ))
        .bind(organization_id)
        .bind(query.category_id)
        .bind(query.supplier_id)
        .bind(&search)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(PaginatedResponse::new(
            items,
            pagination,
            u64::try_from(total).unwrap_or(0),
        ))
    }

    pub async fn get(&self, organization_id: Uuid, item_id: Uuid) -> AppResult<Item> {
        sqlx::query_as::<_, Item>(&format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE id = $1 AND organization_id = $2"
        ))
        .bind(item_id)
        .bind(organization_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Item".to_string()))
    }

    pub async fn create(&self, organization_id: Uuid, input: CreateItemInput) -> AppResult<Item> {
        input.validate()?;
        check_stock_fields(input.quantity, input.buy_price, input.sell_price)?;
        let mut conn = self.db.acquire().await?;
        ensure_references(&mut conn, organization_id, input.category_id, input.supplier_id)
            .await?;

        let item = sqlx::query_as::<_, Item>(&format!(
            r#"
            INSERT INTO items (organization_id, category_id, supplier_id, name, description,
                               quantity, buy_price, sell_price)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(organization_id)
        .bind(input.category_id)
        .bind(input.supplier_id)
        .bind(input.name.trim())
        .bind(&input.description)
        .bind(input.quantity)
        .bind(input.buy_price)
        .bind(input.sell_price)
        .fetch_one(&mut *conn)
        .await?;

        Ok(item)
    }

    /// Merge the provided fields into the item. Setting `quantity` replaces
    /// the on-hand count (restocking).
    ///
    /// The row is locked for the read-merge-write, so reservations and
    /// restorations committed meanwhile are never overwritten.
    pub async fn update(
        &self,
        organization_id: Uuid,
        item_id: Uuid,
        input: UpdateItemInput,
    ) -> AppResult<Item> {
        input.validate()?;

        let mut tx = self.db.begin().await?;

        let existing = sqlx::query_as::<_, Item>(&format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE id = $1 AND organization_id = $2 FOR UPDATE"
        ))
        .bind(item_id)
        .bind(organization_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Item".to_string()))?;

        let category_id = input.category_id.unwrap_or(existing.category_id);
        let supplier_id = input.supplier_id.unwrap_or(existing.supplier_id);
        let quantity = input.quantity.unwrap_or(existing.quantity);
        let buy_price = input.buy_price.unwrap_or(existing.buy_price);
        let sell_price = input.sell_price.unwrap_or(existing.sell_price);
        check_stock_fields(quantity, buy_price, sell_price)?;
        ensure_references(&mut tx, organization_id, category_id, supplier_id).await?;

        let name = input.name.unwrap_or(existing.name);
        let description = input.description.unwrap_or(existing.description);

        let item = sqlx::query_as::<_, Item>(&format!(
            r#"
            UPDATE items
            SET name = $1, description = $2, category_id = $3, supplier_id = $4,
                quantity = $5, buy_price = $6, sell_price = $7, updated_at = NOW()
            WHERE id = $8 AND organization_id = $9
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(name.trim())
        .bind(&description)
        .bind(category_id)
        .bind(supplier_id)
        .bind(quantity)
        .bind(buy_price)
        .bind(sell_price)
        .bind(item_id)
        .bind(organization_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(item)
    }

    /// Delete an item that no order line references
    pub async fn delete(&self, organization_id: Uuid, item_id: Uuid) -> AppResult<()> {
        let referenced = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM order_lines ol
                JOIN orders o ON o.id = ol.order_id
                WHERE ol.item_id = $1 AND o.organization_id = $2
            )
            "#,
        )
        .bind(item_id)
        .bind(organization_id)
        .fetch_one(&self.db)
        .await?;

        if referenced {
            return Err(AppError::Conflict {
                resource: "item".to_string(),
                message: "Item is referenced by orders".to_string(),
            });
        }

        let result = sqlx::query("DELETE FROM items WHERE id = $1 AND organization_id = $2")
            .bind(item_id)
            .bind(organization_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Item".to_string()));
        }

        Ok(())
    }
}

/// Category and supplier must belong to the same organization
async fn ensure_references(
    conn: &mut PgConnection,
    organization_id: Uuid,
    category_id: Uuid,
    supplier_id: Option<Uuid>,
) -> AppResult<()> {
    let category_exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM categories WHERE id = $1 AND organization_id = $2)",
    )
    .bind(category_id)
    .bind(organization_id)
    .fetch_one(&mut *conn)
    .await?;

    if !category_exists {
        return Err(AppError::NotFound("Category".to_string()));
    }

    if let Some(supplier_id) = supplier_id {
        let supplier_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM suppliers WHERE id = $1 AND organization_id = $2)",
        )
        .bind(supplier_id)
        .bind(organization_id)
        .fetch_one(&mut *conn)
        .await?;

        if !supplier_exists {
            return Err(AppError::NotFound("Supplier".to_string()));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_clause_uses_whitelisted_columns() {
        assert_eq!(
            order_clause(ItemSortField::SellPrice, SortOrder::Asc),
            "ORDER BY sell_price ASC, id ASC"
        );
        assert_eq!(
            order_clause(ItemSortField::default(), SortOrder::default()),
            "ORDER BY created_at DESC, id DESC"
        );
    }

    #[test]
    fn search_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("bolt").as_deref(), Some("%bolt%"));
        assert_eq!(like_pattern("50%_off").as_deref(), Some("%50\\%\\_off%"));
        assert_eq!(like_pattern("   "), None);
    }

    #[test]
    fn list_query_defaults_and_clamps() {
        let p = ItemListQuery::default().pagination();
        assert_eq!((p.page, p.limit), (1, 10));

        let q = ItemListQuery {
            page: Some(0),
            limit: Some(1000),
            ..Default::default()
        };
        let p = q.pagination();
        assert_eq!((p.page, p.limit), (1, shared::types::MAX_PAGE_SIZE));
    }

    #[test]
    fn negative_stock_is_rejected() {
        assert!(check_stock_fields(-1, Decimal::ONE, Decimal::ONE).is_err());
        assert!(check_stock_fields(0, Decimal::new(-1, 2), Decimal::ONE).is_err());
        assert!(check_stock_fields(5, Decimal::ONE, Decimal::TWO).is_ok());
    }

    #[test]
    fn update_body_can_clear_supplier() {
        let input: UpdateItemInput =
            serde_json::from_str(r#"{"supplierId": null, "name": "Hex bolt"}"#).unwrap();
        assert_eq!(input.supplier_id, Some(None));
        assert_eq!(input.description, None);
        assert!(input.quantity.is_none());
    }
}

//! Order models, stock reservation planning and status transitions

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Fulfilment status of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "VARCHAR", rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Completed,
    #[serde(alias = "canceled")]
    Cancelled,
}

/// Payment status of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "VARCHAR", rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(OrderStatus::Pending),
            "completed" => Some(OrderStatus::Completed),
            "cancelled" | "canceled" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }

    /// Stock effect of moving from `self` to `next`.
    ///
    /// Cancelled is terminal: an order cannot be revived once its stock has
    /// gone back on the shelf.
    pub fn transition(self, next: OrderStatus) -> Result<StockEffect, TransitionError> {
        use OrderStatus::*;
        match (self, next) {
            (Pending, Pending) | (Completed, Completed) | (Cancelled, Cancelled) => {
                Ok(StockEffect::None)
            }
            (Pending, Completed) | (Completed, Pending) => Ok(StockEffect::None),
            (Pending, Cancelled) | (Completed, Cancelled) => Ok(StockEffect::Restore),
            (Cancelled, to) => Err(TransitionError {
                from: Cancelled,
                to,
            }),
        }
    }
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(PaymentStatus::Pending),
            "paid" => Some(PaymentStatus::Paid),
            "failed" => Some(PaymentStatus::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a status change or deletion does to item stock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockEffect {
    None,
    /// Add every line quantity back to its item
    Restore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot change order status from {from} to {to}")]
pub struct TransitionError {
    pub from: OrderStatus,
    pub to: OrderStatus,
}

/// Order header
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub customer_name: String,
    pub contact_no: Option<String>,
    pub customer_address: Option<String>,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub order_date: DateTime<Utc>,
    pub payment_date: Option<DateTime<Utc>>,
    /// Set once the reserved quantities have been returned to stock
    pub stock_restored: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Stock effect of a status change, taking earlier restorations into
    /// account so an order's stock is returned at most once.
    pub fn status_change_effect(&self, next: OrderStatus) -> Result<StockEffect, TransitionError> {
        match self.status.transition(next)? {
            StockEffect::Restore if !self.stock_restored => Ok(StockEffect::Restore),
            _ => Ok(StockEffect::None),
        }
    }

    /// Stock effect of deleting the order
    pub fn deletion_effect(&self) -> StockEffect {
        if self.stock_restored {
            StockEffect::None
        } else {
            StockEffect::Restore
        }
    }
}

/// Payment date after an update: an explicit date wins, otherwise marking
/// an order paid stamps `now` if it has no date yet.
pub fn resolve_payment_date(
    payment_status: PaymentStatus,
    current: Option<DateTime<Utc>>,
    supplied: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    match (supplied, current) {
        (Some(date), _) => Some(date),
        (None, Some(date)) => Some(date),
        (None, None) if payment_status == PaymentStatus::Paid => Some(now),
        (None, None) => None,
    }
}

/// One line of an order with the unit price captured at creation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub id: Uuid,
    pub order_id: Uuid,
    pub item_id: Uuid,
    /// Joined from the item when the line is read
    pub item_name: String,
    pub quantity: i32,
    pub price_at_purchase: Decimal,
    pub position: i32,
}

impl OrderLine {
    pub fn line_total(&self) -> Decimal {
        Decimal::from(self.quantity) * self.price_at_purchase
    }
}

/// Order header together with its lines and computed total
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderWithLines {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderLine>,
    pub total: Decimal,
}

impl OrderWithLines {
    pub fn new(order: Order, mut items: Vec<OrderLine>) -> Self {
        items.sort_by_key(|l| l.position);
        let total = order_total(&items);
        Self {
            order,
            items,
            total,
        }
    }
}

pub fn order_total(lines: &[OrderLine]) -> Decimal {
    lines.iter().map(OrderLine::line_total).sum()
}

/// A line as requested by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestedLine {
    pub item_id: Uuid,
    pub quantity: i32,
}

/// Merge lines naming the same item, keeping the order in which items first
/// appear.
pub fn consolidate_lines(lines: &[RequestedLine]) -> Vec<RequestedLine> {
    let mut merged: Vec<RequestedLine> = Vec::with_capacity(lines.len());
    let mut index: HashMap<Uuid, usize> = HashMap::new();
    for line in lines {
        match index.get(&line.item_id) {
            Some(&i) => merged[i].quantity = merged[i].quantity.saturating_add(line.quantity),
            None => {
                index.insert(line.item_id, merged.len());
                merged.push(*line);
            }
        }
    }
    merged
}

/// Current stock of an item, read under a row lock before reserving
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockSnapshot {
    pub id: Uuid,
    pub name: String,
    pub quantity: i32,
    pub sell_price: Decimal,
}

/// A reservation that can be applied: take `quantity` from the item,
/// leaving `remaining`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reservation {
    pub item_id: Uuid,
    pub quantity: i32,
    pub price_at_purchase: Decimal,
    pub remaining: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReservationError {
    #[error("item {0} not found")]
    ItemNotFound(Uuid),

    #[error("insufficient stock for {item_name}: requested {requested}, available {available}")]
    InsufficientStock {
        item_id: Uuid,
        item_name: String,
        requested: i32,
        available: i32,
    },
}

/// Check every line against the snapshot before anything is taken.
///
/// Either all lines can be satisfied and the full list of reservations is
/// returned, or the first failing line (in request order) is reported and
/// nothing should be applied. Repeated items draw from the same remaining
/// count.
pub fn plan_reservation(
    lines: &[RequestedLine],
    stock: &[StockSnapshot],
) -> Result<Vec<Reservation>, ReservationError> {
    let mut remaining: HashMap<Uuid, (i32, &StockSnapshot)> =
        stock.iter().map(|s| (s.id, (s.quantity, s))).collect();

    let mut plan = Vec::with_capacity(lines.len());
    for line in lines {
        let (available, snapshot) = remaining
            .get_mut(&line.item_id)
            .ok_or(ReservationError::ItemNotFound(line.item_id))?;

        if line.quantity > *available {
            return Err(ReservationError::InsufficientStock {
                item_id: line.item_id,
                item_name: snapshot.name.clone(),
                requested: line.quantity,
                available: *available,
            });
        }

        *available -= line.quantity;
        plan.push(Reservation {
            item_id: line.item_id,
            quantity: line.quantity,
            price_at_purchase: snapshot.sell_price,
            remaining: *available,
        });
    }
    Ok(plan)
}

//! Inventory item model and valuation

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stocked item. `quantity` is the authoritative on-hand count and is
/// never negative.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub category_id: Uuid,
    pub supplier_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub quantity: i32,
    pub buy_price: Decimal,
    pub sell_price: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Columns an item list may be sorted by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum ItemSortField {
    Name,
    Quantity,
    BuyPrice,
    SellPrice,
    #[default]
    CreatedAt,
}

impl ItemSortField {
    /// SQL column for `ORDER BY`; only these fixed names ever reach a query
    pub fn column(&self) -> &'static str {
        match self {
            ItemSortField::Name => "name",
            ItemSortField::Quantity => "quantity",
            ItemSortField::BuyPrice => "buy_price",
            ItemSortField::SellPrice => "sell_price",
            ItemSortField::CreatedAt => "created_at",
        }
    }
}

/// Stock figures of one item as needed for valuation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockValue {
    pub quantity: i32,
    pub buy_price: Decimal,
    pub sell_price: Decimal,
}

impl From<&Item> for StockValue {
    fn from(item: &Item) -> Self {
        Self {
            quantity: item.quantity,
            buy_price: item.buy_price,
            sell_price: item.sell_price,
        }
    }
}

/// Inventory valuation of an organization
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryValuation {
    /// Σ quantity × buy price (value at cost)
    pub total_value: Decimal,
    /// Σ quantity × sell price
    pub retail_value: Decimal,
    pub item_count: u64,
    pub total_units: i64,
}

impl InventoryValuation {
    pub fn from_stock<I>(stock: I) -> Self
    where
        I: IntoIterator<Item = StockValue>,
    {
        stock.into_iter().fold(Self::default(), |mut acc, s| {
            let qty = Decimal::from(s.quantity);
            acc.total_value += qty * s.buy_price;
            acc.retail_value += qty * s.sell_price;
            acc.item_count += 1;
            acc.total_units += i64::from(s.quantity);
            acc
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stock(quantity: i32, buy: i64, sell: i64) -> StockValue {
        StockValue {
            quantity,
            buy_price: Decimal::from(buy),
            sell_price: Decimal::from(sell),
        }
    }

    #[test]
    fn valuation_uses_buy_price_for_total() {
        let v = InventoryValuation::from_stock([stock(10, 2, 5), stock(3, 10, 12)]);
        assert_eq!(v.total_value, Decimal::from(50));
        assert_eq!(v.retail_value, Decimal::from(86));
        assert_eq!(v.item_count, 2);
        assert_eq!(v.total_units, 13);
    }

    #[test]
    fn empty_inventory_is_zero() {
        let v = InventoryValuation::from_stock(Vec::new());
        assert_eq!(v, InventoryValuation::default());
    }

    #[test]
    fn sort_fields_map_to_fixed_columns() {
        let parsed: ItemSortField = serde_json::from_str("\"sellPrice\"").unwrap();
        assert_eq!(parsed.column(), "sell_price");
        assert_eq!(ItemSortField::default().column(), "created_at");
        assert!(serde_json::from_str::<ItemSortField>("\"name; DROP TABLE items\"").is_err());
    }
}

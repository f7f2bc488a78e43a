//! Reporting service for earnings, valuation and order history

use chrono::{DateTime, Local, TimeZone};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::order::{check_range, OrderService};
use shared::models::{InventoryValuation, OrderStatus, OrderWithLines, StockValue};
use shared::reporting::{EarningsSummary, OrderEarning, SalesReportRow, SummaryReport};
use shared::types::DateRange;

#[derive(Clone)]
pub struct ReportingService {
    db: PgPool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Last7DaysEarnings {
    pub last_7_days_earnings: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Last3MonthsEarnings {
    pub last_3_months_earnings: Decimal,
}

impl ReportingService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Order counts and earnings windows, all from one snapshot
    pub async fn summary(&self, organization_id: Uuid) -> AppResult<SummaryReport> {
        let now = Local::now();
        let orders = self.order_earnings(organization_id).await?;
        Ok(SummaryReport::build(&now, &orders))
    }

    pub async fn earnings_last_7_days(&self, organization_id: Uuid) -> AppResult<Last7DaysEarnings> {
        let earnings = self.earnings_at(organization_id, &Local::now()).await?;
        Ok(Last7DaysEarnings {
            last_7_days_earnings: earnings.last_7_days,
        })
    }

    /// Earnings over the last 90 days
    pub async fn earnings_last_3_months(
        &self,
        organization_id: Uuid,
    ) -> AppResult<Last3MonthsEarnings> {
        let earnings = self.earnings_at(organization_id, &Local::now()).await?;
        Ok(Last3MonthsEarnings {
            last_3_months_earnings: earnings.last_90_days,
        })
    }

    pub async fn inventory_valuation(&self, organization_id: Uuid) -> AppResult<InventoryValuation> {
        let stock = sqlx::query_as::<_, StockValue>(
            "SELECT quantity, buy_price, sell_price FROM items WHERE organization_id = $1",
        )
        .bind(organization_id)
        .fetch_all(&self.db)
        .await?;

        Ok(InventoryValuation::from_stock(stock))
    }

    /// Completed orders in the range with their totals at purchase prices
    pub async fn sales_report(
        &self,
        organization_id: Uuid,
        range: DateRange,
    ) -> AppResult<Vec<SalesReportRow>> {
        check_range(&range)?;

        let rows = sqlx::query_as::<_, SalesReportRow>(
            r#"
            SELECT o.id AS order_id, o.order_date AS date, o.customer_name,
                   COALESCE(SUM(ol.quantity * ol.price_at_purchase), 0) AS total
            FROM orders o
            LEFT JOIN order_lines ol ON ol.order_id = o.id
            WHERE o.organization_id = $1
              AND o.status = $2
              AND ($3::timestamptz IS NULL OR o.order_date >= $3)
              AND ($4::timestamptz IS NULL OR o.order_date <= $4)
            GROUP BY o.id, o.order_date, o.customer_name
            ORDER BY o.order_date, o.id
            "#,
        )
        .bind(organization_id)
        .bind(OrderStatus::Completed)
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    pub async fn order_history(
        &self,
        organization_id: Uuid,
        range: DateRange,
    ) -> AppResult<Vec<OrderWithLines>> {
        OrderService::new(self.db.clone())
            .history(organization_id, range)
            .await
    }

    /// Export report data as CSV
    pub fn export_to_csv<T: Serialize>(data: &[T]) -> AppResult<String> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        for record in data {
            wtr.serialize(record)
                .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
        }
        let bytes = wtr
            .into_inner()
            .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?;
        String::from_utf8(bytes)
            .map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))
    }

    async fn earnings_at<Tz: TimeZone>(
        &self,
        organization_id: Uuid,
        now: &DateTime<Tz>,
    ) -> AppResult<EarningsSummary> {
        let orders = self.order_earnings(organization_id).await?;
        Ok(EarningsSummary::compute(now, &orders))
    }

    /// Statuses and line totals of every order of the organization
    async fn order_earnings(&self, organization_id: Uuid) -> AppResult<Vec<OrderEarning>> {
        let orders = sqlx::query_as::<_, OrderEarning>(
            r#"
            SELECT o.order_date, o.status, o.payment_status,
                   COALESCE(SUM(ol.quantity * ol.price_at_purchase), 0) AS total
            FROM orders o
            LEFT JOIN order_lines ol ON ol.order_id = o.id
            WHERE o.organization_id = $1
            GROUP BY o.id, o.order_date, o.status, o.payment_status
            "#,
        )
        .bind(organization_id)
        .fetch_all(&self.db)
        .await?;

        Ok(orders)
    }
}

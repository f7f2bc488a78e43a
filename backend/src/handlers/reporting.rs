//! Reporting handlers for earnings, valuation and exports (admin only)

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::reporting::{Last3MonthsEarnings, Last7DaysEarnings, ReportingService};
use crate::AppState;
use shared::models::{Capability, InventoryValuation, OrderWithLines};
use shared::reporting::SummaryReport;
use shared::types::{range_end, range_start, DateRange};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportQuery {
    /// `YYYY-MM-DD` or an RFC 3339 date-time
    #[serde(default, deserialize_with = "range_start")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "range_end")]
    pub end_date: Option<DateTime<Utc>>,
    /// "json" (default) or "csv"
    pub format: Option<String>,
}

impl ReportQuery {
    fn range(&self) -> DateRange {
        DateRange {
            start: self.start_date,
            end: self.end_date,
        }
    }

    fn wants_csv(&self) -> bool {
        self.format
            .as_deref()
            .is_some_and(|f| f.eq_ignore_ascii_case("csv"))
    }
}

pub async fn summary_report(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<SummaryReport>> {
    current_user.0.require(Capability::ViewReports)?;
    let service = ReportingService::new(state.db);
    let report = service.summary(current_user.0.organization_id).await?;
    Ok(Json(report))
}

pub async fn earnings_last_7_days(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Last7DaysEarnings>> {
    current_user.0.require(Capability::ViewReports)?;
    let service = ReportingService::new(state.db);
    let report = service
        .earnings_last_7_days(current_user.0.organization_id)
        .await?;
    Ok(Json(report))
}

pub async fn earnings_last_3_months(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Last3MonthsEarnings>> {
    current_user.0.require(Capability::ViewReports)?;
    let service = ReportingService::new(state.db);
    let report = service
        .earnings_last_3_months(current_user.0.organization_id)
        .await?;
    Ok(Json(report))
}

pub async fn inventory_valuation(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<InventoryValuation>> {
    current_user.0.require(Capability::ViewReports)?;
    let service = ReportingService::new(state.db);
    let report = service
        .inventory_valuation(current_user.0.organization_id)
        .await?;
    Ok(Json(report))
}

/// Completed orders in a date range, as JSON or a CSV attachment
pub async fn sales_report(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ReportQuery>,
) -> AppResult<Response> {
    current_user.0.require(Capability::ViewReports)?;
    let service = ReportingService::new(state.db);
    let data = service
        .sales_report(current_user.0.organization_id, query.range())
        .await?;

    if query.wants_csv() {
        let csv = ReportingService::export_to_csv(&data)?;
        Ok((
            [
                (header::CONTENT_TYPE, "text/csv"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"sales_report.csv\"",
                ),
            ],
            csv,
        )
            .into_response())
    } else {
        Ok(Json(data).into_response())
    }
}

pub async fn order_history(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ReportQuery>,
) -> AppResult<Json<Vec<OrderWithLines>>> {
    current_user.0.require(Capability::ViewReports)?;
    let service = ReportingService::new(state.db);
    let orders = service
        .order_history(current_user.0.organization_id, query.range())
        .await?;
    Ok(Json(orders))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_format_is_case_insensitive() {
        let query = ReportQuery {
            format: Some("CSV".into()),
            ..Default::default()
        };
        assert!(query.wants_csv());
        assert!(!ReportQuery::default().wants_csv());
    }

    #[test]
    fn plain_dates_are_accepted_in_the_query_string() {
        use axum::http::Uri;
        use chrono::TimeZone;

        let uri: Uri = "/api/reports/salesReport?startDate=2024-01-01&endDate=2024-01-31&format=csv"
            .parse()
            .unwrap();
        let Query(query) = Query::<ReportQuery>::try_from_uri(&uri).unwrap();
        let range = query.range();

        assert_eq!(
            range.start,
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
        );
        assert!(range.contains(Utc.with_ymd_and_hms(2024, 1, 31, 18, 0, 0).unwrap()));
        assert!(!range.contains(Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap()));
        assert!(query.wants_csv());
    }
}

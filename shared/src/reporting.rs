//! Report arithmetic
//!
//! Reports are folded from one snapshot of per-order totals taken at a
//! single `now`, so every figure of a report describes the same moment.

use chrono::{DateTime, Duration, NaiveTime, Offset, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{OrderStatus, PaymentStatus};

/// Time windows used by earnings reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EarningsWindow {
    /// Since local midnight
    Today,
    Last7Days,
    Last30Days,
    Last90Days,
    AllTime,
}

impl EarningsWindow {
    pub const ALL: [EarningsWindow; 5] = [
        EarningsWindow::Today,
        EarningsWindow::Last7Days,
        EarningsWindow::Last30Days,
        EarningsWindow::Last90Days,
        EarningsWindow::AllTime,
    ];

    /// Earliest instant inside the window, `None` for all time
    pub fn cutoff<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Option<DateTime<Utc>> {
        let now_utc = now.with_timezone(&Utc);
        match self {
            EarningsWindow::Today => Some(local_midnight(now)),
            EarningsWindow::Last7Days => Some(now_utc - Duration::days(7)),
            EarningsWindow::Last30Days => Some(now_utc - Duration::days(30)),
            EarningsWindow::Last90Days => Some(now_utc - Duration::days(90)),
            EarningsWindow::AllTime => None,
        }
    }

    pub fn contains<Tz: TimeZone>(&self, now: &DateTime<Tz>, at: DateTime<Utc>) -> bool {
        self.cutoff(now).map_or(true, |cutoff| at >= cutoff)
    }
}

/// Start of the calendar day of `now` in its own time zone
fn local_midnight<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Utc> {
    let midnight = now.date_naive().and_time(NaiveTime::MIN);
    match now.timezone().from_local_datetime(&midnight).earliest() {
        Some(start) => start.with_timezone(&Utc),
        // midnight skipped by a DST jump; use the current offset instead
        None => {
            let offset = Duration::seconds(i64::from(now.offset().fix().local_minus_utc()));
            Utc.from_utc_datetime(&(midnight - offset))
        }
    }
}

/// Whether an order with these statuses counts towards earnings
pub fn counts_as_earning(status: OrderStatus, payment_status: PaymentStatus) -> bool {
    status == OrderStatus::Completed && payment_status == PaymentStatus::Paid
}

/// One order as seen by the reports: its statuses and Σ quantity × price at
/// purchase over its lines.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct OrderEarning {
    pub order_date: DateTime<Utc>,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub total: Decimal,
}

/// Earnings per window
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EarningsSummary {
    pub total: Decimal,
    pub today: Decimal,
    pub last_7_days: Decimal,
    pub last_30_days: Decimal,
    pub last_90_days: Decimal,
}

impl EarningsSummary {
    /// Sum qualifying orders into every window at once
    pub fn compute<'a, Tz, I>(now: &DateTime<Tz>, orders: I) -> Self
    where
        Tz: TimeZone,
        I: IntoIterator<Item = &'a OrderEarning>,
    {
        let cutoffs: Vec<(EarningsWindow, Option<DateTime<Utc>>)> = EarningsWindow::ALL
            .iter()
            .map(|w| (*w, w.cutoff(now)))
            .collect();

        let mut summary = Self::default();
        for order in orders {
            if !counts_as_earning(order.status, order.payment_status) {
                continue;
            }
            for (window, cutoff) in &cutoffs {
                if cutoff.map_or(true, |c| order.order_date >= c) {
                    *summary.window_mut(*window) += order.total;
                }
            }
        }
        summary
    }

    pub fn window(&self, window: EarningsWindow) -> Decimal {
        match window {
            EarningsWindow::Today => self.today,
            EarningsWindow::Last7Days => self.last_7_days,
            EarningsWindow::Last30Days => self.last_30_days,
            EarningsWindow::Last90Days => self.last_90_days,
            EarningsWindow::AllTime => self.total,
        }
    }

    fn window_mut(&mut self, window: EarningsWindow) -> &mut Decimal {
        match window {
            EarningsWindow::Today => &mut self.today,
            EarningsWindow::Last7Days => &mut self.last_7_days,
            EarningsWindow::Last30Days => &mut self.last_30_days,
            EarningsWindow::Last90Days => &mut self.last_90_days,
            EarningsWindow::AllTime => &mut self.total,
        }
    }
}

/// Order counts by status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderCounts {
    pub completed: u64,
    pub pending: u64,
    /// Orders whose payment is still pending
    pub unpaid: u64,
}

impl OrderCounts {
    pub fn tally<'a, I>(orders: I) -> Self
    where
        I: IntoIterator<Item = &'a OrderEarning>,
    {
        orders.into_iter().fold(Self::default(), |mut acc, o| {
            match o.status {
                OrderStatus::Completed => acc.completed += 1,
                OrderStatus::Pending => acc.pending += 1,
                OrderStatus::Cancelled => {}
            }
            if o.payment_status == PaymentStatus::Pending {
                acc.unpaid += 1;
            }
            acc
        })
    }
}

/// Dashboard summary of an organization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryReport {
    pub total_completed_orders: u64,
    pub total_pending_orders: u64,
    pub total_unpaid_orders: u64,
    pub total_earnings: Decimal,
    pub todays_earnings: Decimal,
    pub last_30_days_earnings: Decimal,
    pub last_90_days_earnings: Decimal,
}

impl SummaryReport {
    pub fn build<Tz: TimeZone>(now: &DateTime<Tz>, orders: &[OrderEarning]) -> Self {
        let counts = OrderCounts::tally(orders);
        let earnings = EarningsSummary::compute(now, orders);
        Self {
            total_completed_orders: counts.completed,
            total_pending_orders: counts.pending,
            total_unpaid_orders: counts.unpaid,
            total_earnings: earnings.total,
            todays_earnings: earnings.today,
            last_30_days_earnings: earnings.last_30_days,
            last_90_days_earnings: earnings.last_90_days,
        }
    }
}

/// One completed order in a sales report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct SalesReportRow {
    pub order_id: Uuid,
    pub date: DateTime<Utc>,
    pub customer_name: String,
    pub total: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn earning(order_date: DateTime<Utc>, total: i64) -> OrderEarning {
        OrderEarning {
            order_date,
            status: OrderStatus::Completed,
            payment_status: PaymentStatus::Paid,
            total: Decimal::from(total),
        }
    }

    #[test]
    fn today_starts_at_local_midnight() {
        let tz = FixedOffset::east_opt(7 * 3600).unwrap();
        // 01:30 local on 2024-03-10 is 18:30 UTC on 2024-03-09
        let now = tz.with_ymd_and_hms(2024, 3, 10, 1, 30, 0).unwrap();
        let cutoff = EarningsWindow::Today.cutoff(&now).unwrap();
        assert_eq!(cutoff, Utc.with_ymd_and_hms(2024, 3, 9, 17, 0, 0).unwrap());
    }

    #[test]
    fn windows_are_nested() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let orders = vec![
            earning(now - Duration::hours(2), 10),
            earning(now - Duration::days(3), 20),
            earning(now - Duration::days(20), 40),
            earning(now - Duration::days(60), 80),
            earning(now - Duration::days(400), 160),
        ];
        let s = EarningsSummary::compute(&now, &orders);
        assert_eq!(s.today, Decimal::from(10));
        assert_eq!(s.last_7_days, Decimal::from(30));
        assert_eq!(s.last_30_days, Decimal::from(70));
        assert_eq!(s.last_90_days, Decimal::from(150));
        assert_eq!(s.total, Decimal::from(310));
        assert_eq!(s.window(EarningsWindow::AllTime), s.total);
    }

    #[test]
    fn only_completed_and_paid_orders_earn() {
        let now = Utc::now();
        let mut unpaid = earning(now, 100);
        unpaid.payment_status = PaymentStatus::Pending;
        let mut cancelled = earning(now, 100);
        cancelled.status = OrderStatus::Cancelled;
        let orders = vec![earning(now, 5), unpaid, cancelled];

        let report = SummaryReport::build(&now, &orders);
        assert_eq!(report.total_earnings, Decimal::from(5));
        assert_eq!(report.total_completed_orders, 2);
        assert_eq!(report.total_pending_orders, 0);
        assert_eq!(report.total_unpaid_orders, 1);
    }

    #[test]
    fn summary_serializes_with_report_field_names() {
        let now = Utc::now();
        let json = serde_json::to_value(SummaryReport::build(&now, &[])).unwrap();
        for key in [
            "totalCompletedOrders",
            "totalPendingOrders",
            "totalUnpaidOrders",
            "totalEarnings",
            "todaysEarnings",
            "last30DaysEarnings",
            "last90DaysEarnings",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
    }
}

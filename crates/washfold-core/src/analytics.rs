//! # Analytics
//!
//! Dashboard KPIs over a trailing period. Periods are measured from `now`
//! in the store's local offset:
//!
//! - `Today`: since local midnight
//! - `Week`: the last 7 days
//! - `Month`: the last calendar month (same day-of-month, clamped)

use chrono::{DateTime, Duration, FixedOffset, Months, NaiveTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use ts_rs::TS;

use crate::money::Money;
use crate::order::{Order, OrderStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum AnalyticsPeriod {
    Today,
    #[default]
    Week,
    Month,
}

impl AnalyticsPeriod {
    /// First instant included in the period.
    pub fn start(&self, now: DateTime<FixedOffset>) -> DateTime<Utc> {
        let start = match self {
            AnalyticsPeriod::Today => {
                let midnight = now.date_naive().and_time(NaiveTime::MIN);
                now.offset()
                    .from_local_datetime(&midnight)
                    .single()
                    .unwrap_or(now)
            }
            AnalyticsPeriod::Week => now - Duration::days(7),
            AnalyticsPeriod::Month => now
                .checked_sub_months(Months::new(1))
                .unwrap_or(now - Duration::days(30)),
        };
        start.with_timezone(&Utc)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SalesKpis {
    pub period: AnalyticsPeriod,
    pub total_sales: Money,
    pub order_count: u32,
    #[serde(with = "rust_decimal::serde::float")]
    #[ts(type = "number")]
    pub total_weight: Decimal,
    pub avg_ticket: Money,
    pub express_orders: u32,
    /// Share of express orders, 0 to 100.
    #[serde(with = "rust_decimal::serde::float")]
    #[ts(type = "number")]
    pub express_rate: Decimal,
    /// Orders ready for pickup or already picked up.
    pub completed_orders: u32,
    pub unique_customers: u32,
}

impl SalesKpis {
    pub fn compute(orders: &[Order], period: AnalyticsPeriod, now: DateTime<FixedOffset>) -> Self {
        let since = period.start(now);
        let in_period: Vec<&Order> = orders.iter().filter(|o| o.created_at >= since).collect();

        let order_count = in_period.len() as u32;
        let total_sales: Money = in_period.iter().map(|o| o.total).sum();
        let total_weight: Decimal = in_period.iter().map(|o| o.total_weight).sum();
        let express_orders = in_period.iter().filter(|o| o.is_express).count() as u32;
        let completed_orders = in_period
            .iter()
            .filter(|o| matches!(o.status, OrderStatus::Ready | OrderStatus::Completed))
            .count() as u32;
        let unique_customers = in_period
            .iter()
            .filter_map(|o| o.customer.as_ref().map(|c| c.id.as_str()))
            .collect::<BTreeSet<_>>()
            .len() as u32;

        let (avg_ticket, express_rate) = if order_count == 0 {
            (Money::zero(), Decimal::ZERO)
        } else {
            let count = Decimal::from(order_count);
            (
                Money::new(total_sales.amount() / count),
                Decimal::from(express_orders) * Decimal::ONE_HUNDRED / count,
            )
        };

        SalesKpis {
            period,
            total_sales,
            order_count,
            total_weight,
            avg_ticket,
            express_orders,
            express_rate,
            completed_orders,
            unique_customers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::tests::sample_order;
    use crate::types::{Customer, PaymentMethod};
    use rust_decimal_macros::dec;

    fn now() -> DateTime<FixedOffset> {
        FixedOffset::west_opt(5 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 15, 18, 0, 0)
            .unwrap()
    }

    fn order_days_ago(days: i64, total: i64) -> Order {
        let mut order = sample_order(total, PaymentMethod::Cash);
        order.created_at = (now() - Duration::days(days)).with_timezone(&Utc);
        order
    }

    #[test]
    fn test_today_starts_at_local_midnight() {
        let start = AnalyticsPeriod::Today.start(now());
        assert_eq!(start.to_rfc3339(), "2024-03-15T05:00:00+00:00");
        let month = AnalyticsPeriod::Month.start(now());
        assert_eq!(month.to_rfc3339(), "2024-02-15T23:00:00+00:00");
    }

    #[test]
    fn test_kpis_over_week() {
        let mut express = order_days_ago(1, 30);
        express.is_express = true;
        express.status = OrderStatus::Ready;
        express.customer = Some(Customer::new("c-1", "Ana", "Pérez"));
        express.total_weight = dec!(4.5);

        let mut repeat = order_days_ago(2, 10);
        repeat.customer = Some(Customer::new("c-1", "Ana", "Pérez"));
        repeat.status = OrderStatus::Completed;

        let old = order_days_ago(10, 500);

        let kpis = SalesKpis::compute(&[express, repeat, old], AnalyticsPeriod::Week, now());
        assert_eq!(kpis.order_count, 2);
        assert_eq!(kpis.total_sales, Money::from_units(40));
        assert_eq!(kpis.avg_ticket, Money::from_units(20));
        assert_eq!(kpis.total_weight, dec!(4.5));
        assert_eq!(kpis.express_orders, 1);
        assert_eq!(kpis.express_rate, dec!(50));
        assert_eq!(kpis.completed_orders, 2);
        assert_eq!(kpis.unique_customers, 1);
    }

    #[test]
    fn test_empty_period() {
        let kpis = SalesKpis::compute(&[order_days_ago(3, 10)], AnalyticsPeriod::Today, now());
        assert_eq!(kpis.order_count, 0);
        assert!(kpis.avg_ticket.is_zero());
        assert_eq!(kpis.express_rate, Decimal::ZERO);
    }
}

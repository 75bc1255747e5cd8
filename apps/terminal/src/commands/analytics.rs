//! # Analytics Command

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::debug;
use washfold_core::layout::{format_kg, TextBuilder};
use washfold_core::{AnalyticsPeriod, PrintFormat, SalesKpis};
use washfold_store::OrderStore;

use crate::error::ApiError;
use crate::state::TerminalConfig;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiResponse {
    pub since: DateTime<Utc>,
    pub kpis: SalesKpis,
}

/// Sales KPIs for the period ending at `now`, in the store's offset.
pub async fn sales_kpis(
    orders: &dyn OrderStore,
    period: AnalyticsPeriod,
    config: &TerminalConfig,
    now: DateTime<Utc>,
) -> Result<KpiResponse, ApiError> {
    debug!(?period, "sales_kpis command");
    let local_now = now.with_timezone(&config.utc_offset());
    let since = period.start(local_now);

    let in_range = orders
        .list_orders(since, now + Duration::milliseconds(1))
        .await?;

    Ok(KpiResponse {
        since,
        kpis: SalesKpis::compute(&in_range, period, local_now),
    })
}

impl KpiResponse {
    pub fn to_text(&self, format: &PrintFormat) -> String {
        let kpis = &self.kpis;
        let mut out = TextBuilder::new(format.width);
        out.pair("Ventas:", &format.money(kpis.total_sales));
        out.pair("Órdenes:", &kpis.order_count.to_string());
        out.pair("Ticket Promedio:", &format.money(kpis.avg_ticket));
        out.pair("Kilos:", &format!("{}kg", format_kg(kpis.total_weight)));
        out.pair(
            "Express:",
            &format!("{} ({}%)", kpis.express_orders, kpis.express_rate.round_dp(1)),
        );
        out.pair("Listas/Entregadas:", &kpis.completed_orders.to_string());
        out.pair("Clientes:", &kpis.unique_customers.to_string());
        out.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::fixtures::order;
    use chrono::TimeZone;
    use washfold_core::PaymentMethod;
    use washfold_store::MemoryStore;

    #[tokio::test]
    async fn test_today_uses_local_midnight() {
        let store = MemoryStore::new();
        // 04:00 UTC on the 15th is still the 14th in Panama
        let late_14th = Utc.with_ymd_and_hms(2024, 3, 15, 4, 0, 0).unwrap();
        let morning_15th = Utc.with_ymd_and_hms(2024, 3, 15, 14, 0, 0).unwrap();
        store
            .import_orders(vec![
                order(3481, late_14th, PaymentMethod::Cash, 4, None),
                order(3482, morning_15th, PaymentMethod::Card, 2, None),
            ])
            .await
            .unwrap();

        let now = Utc.with_ymd_and_hms(2024, 3, 15, 20, 0, 0).unwrap();
        let today = sales_kpis(&store, AnalyticsPeriod::Today, &TerminalConfig::default(), now)
            .await
            .unwrap();
        assert_eq!(today.kpis.order_count, 1);
        assert_eq!(today.kpis.total_sales.to_string(), "B/5.35");

        let week = sales_kpis(&store, AnalyticsPeriod::Week, &TerminalConfig::default(), now)
            .await
            .unwrap();
        assert_eq!(week.kpis.order_count, 2);
        // (10.70 + 5.35) / 2 = 8.025
        assert_eq!(week.kpis.avg_ticket.to_string(), "B/8.03");

        let text = week.to_text(&PrintFormat::default());
        assert!(text.contains("Ventas:"));
        assert!(text.lines().all(|l| l.chars().count() <= 48));
    }
}

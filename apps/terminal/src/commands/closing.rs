//! # Closing Commands
//!
//! End-of-day reconciliation at the counter.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  prepare_closing(date, opening, cash count, notes)                      │
//! │     │  list_orders(local day) + list_users                              │
//! │     ▼                                                                   │
//! │  DailyClosing (open) ──► shown to the cashier, count can be corrected   │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  close_day(closed_by, variance_confirmed)                               │
//! │     ├──► DailyClosing::close      (REVISAR needs confirmation)          │
//! │     ├──► ClosingStore::upsert     ──► saved                             │
//! │     ├──► Printer::print(report)   ──► printed                           │
//! │     └──► put_document(closings/…) ──► archived                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};
use washfold_core::closing::day_bounds;
use washfold_core::validation::{validate_notes, validate_opening_balance};
use washfold_core::{
    compute_daily_closing, render_closing_report, CashCount, DailyClosing, Money,
};
use washfold_store::{closing_path, CatalogStore, ClosingStore, DocumentStore, OrderStore};

use crate::error::ApiError;
use crate::printer::Printer;
use crate::state::TerminalConfig;

/// What the cashier entered on the closing screen.
#[derive(Debug, Clone)]
pub struct ClosingRequest {
    pub date: NaiveDate,
    /// `None` uses the configured default float.
    pub opening_balance: Option<Money>,
    pub cash_count: CashCount,
    pub notes: Option<String>,
}

impl ClosingRequest {
    pub fn new(date: NaiveDate, cash_count: CashCount) -> Self {
        ClosingRequest {
            date,
            opening_balance: None,
            cash_count,
            notes: None,
        }
    }
}

/// Computes the day's figures. Nothing is stored.
///
/// Operators that can no longer be looked up fall back to the names stored
/// on their orders.
pub async fn prepare_closing(
    request: &ClosingRequest,
    config: &TerminalConfig,
    orders: &dyn OrderStore,
    catalog: &dyn CatalogStore,
) -> Result<DailyClosing, ApiError> {
    debug!(date = %request.date, "prepare_closing command");

    let opening_balance = request
        .opening_balance
        .unwrap_or(config.cash.default_opening_balance);
    validate_opening_balance(opening_balance)?;
    if let Some(notes) = &request.notes {
        validate_notes(notes)?;
    }

    let offset = config.utc_offset();
    let (start, end) = day_bounds(request.date, offset);
    let day_orders = orders
        .list_orders(start, end + Duration::milliseconds(1))
        .await?;

    let users = catalog.list_users().await.unwrap_or_else(|e| {
        warn!(error = %e, "Could not load users, attributing by order names");
        Vec::new()
    });

    let report = compute_daily_closing(
        &day_orders,
        request.date,
        offset,
        opening_balance,
        &request.cash_count,
        &users,
    );

    for method in &report.unknown_methods {
        warn!(date = %request.date, method = %method, "Unknown payment method in day totals");
    }

    info!(
        date = %request.date,
        orders = report.order_count,
        net_sales = %report.net_sales,
        variance = %report.variance,
        status = report.variance_status.label(),
        "Closing prepared"
    );

    Ok(DailyClosing::open(
        report,
        request.cash_count.clone(),
        request.notes.clone(),
    ))
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseOutcome {
    pub closing: DailyClosing,
    /// Rendered closing report, as printed and archived.
    pub report: String,
    /// The closing record reached the data store.
    pub saved: bool,
    pub printed: bool,
    /// The report text was archived at `path`.
    pub archived: bool,
    pub path: String,
    pub errors: Vec<String>,
}

/// Closes the day, then stores, prints and archives it.
///
/// ## Errors
/// Only the close itself can fail the command: a missing operator name, an
/// already closed record, or an unconfirmed `REVISAR` variance. Storage,
/// printer and archive failures are reported in the outcome.
#[allow(clippy::too_many_arguments)]
pub async fn close_day(
    mut closing: DailyClosing,
    closed_by: &str,
    variance_confirmed: bool,
    now: DateTime<Utc>,
    config: &TerminalConfig,
    closings: &dyn ClosingStore,
    documents: &dyn DocumentStore,
    printer: &dyn Printer,
) -> Result<CloseOutcome, ApiError> {
    debug!(date = %closing.date(), "close_day command");

    let closed_by = closed_by.trim();
    if closed_by.is_empty() {
        return Err(ApiError::validation("closed by is required"));
    }
    closing.close(closed_by, now, variance_confirmed)?;

    let date = closing.date();
    let mut errors = Vec::new();

    let saved = match closings.upsert_closing(closing.clone()).await {
        Ok(()) => true,
        Err(e) => {
            warn!(%date, error = %e, "Closing save failed");
            errors.push(format!("Save failed: {}", e));
            false
        }
    };

    let report = render_closing_report(&closing, &config.store_info(), &config.print_format());

    let printed = match printer.print(&config.printer.name, &report).await {
        Ok(()) => true,
        Err(e) => {
            warn!(%date, error = %e, "Closing report print failed");
            errors.push(format!("Print failed: {}", e));
            false
        }
    };

    let path = closing_path(date);
    let archived = match documents.put_document(&path, &report).await {
        Ok(()) => true,
        Err(e) => {
            warn!(%date, %path, error = %e, "Closing report archive failed");
            errors.push(format!("Archive failed: {}", e));
            false
        }
    };

    info!(%date, closed_by, saved, printed, archived, "Day closed");

    Ok(CloseOutcome {
        closing,
        report,
        saved,
        printed,
        archived,
        path,
        errors,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::fixtures::{order, panama, OfflineArchive};
    use crate::error::ErrorCode;
    use crate::printer::testing::RecordingPrinter;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use washfold_core::closing::Denomination;
    use washfold_core::{PaymentMethod, User, VarianceStatus};
    use washfold_store::MemoryStore;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    fn local(d: u32, h: u32, m: u32) -> DateTime<Utc> {
        panama()
            .with_ymd_and_hms(2024, 3, d, h, m, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    /// Cash B/21.40 on the 15th (one sale after 19:00 local), card B/5.35,
    /// and one cash sale on the 16th that must stay out.
    async fn seeded_store() -> MemoryStore {
        let store = MemoryStore::new();
        let maria = User::new("u1", "María");
        store.add_user(maria.clone()).await;
        store
            .import_orders(vec![
                order(3481, local(15, 9, 0), PaymentMethod::Cash, 4, Some(&maria)),
                order(3482, local(15, 13, 0), PaymentMethod::Card, 2, Some(&maria)),
                order(3483, local(15, 21, 30), PaymentMethod::Cash, 4, None),
                order(3484, local(16, 9, 0), PaymentMethod::Cash, 4, None),
            ])
            .await
            .unwrap();
        store
    }

    /// B/71.40: exactly the expected cash with a B/50 float.
    fn exact_count() -> CashCount {
        CashCount::new()
            .with(Denomination::Bill20, 3)
            .with(Denomination::Bill10, 1)
            .with(Denomination::Bill1, 1)
            .with(Denomination::Cent10, 4)
    }

    fn request(count: CashCount) -> ClosingRequest {
        ClosingRequest {
            opening_balance: Some(Money::new(dec!(50))),
            notes: Some("  Todo en orden  ".into()),
            ..ClosingRequest::new(day(), count)
        }
    }

    #[tokio::test]
    async fn test_prepare_uses_local_day() {
        let store = seeded_store().await;
        let config = TerminalConfig::default();

        let closing = prepare_closing(&request(exact_count()), &config, &store, &store)
            .await
            .unwrap();
        let report = &closing.report;

        assert_eq!(report.order_count, 3);
        assert_eq!(report.cash_sales, Money::new(dec!(21.40)));
        assert_eq!(report.expected_cash, Money::new(dec!(71.40)));
        assert_eq!(report.variance_status, VarianceStatus::Balanced);
        assert_eq!(closing.notes.as_deref(), Some("Todo en orden"));
        assert!(!closing.is_closed());
    }

    #[tokio::test]
    async fn test_prepare_rejects_negative_opening() {
        let store = seeded_store().await;
        let mut req = request(exact_count());
        req.opening_balance = Some(Money::new(dec!(-5)));

        let err = prepare_closing(&req, &TerminalConfig::default(), &store, &store)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_close_day_saves_prints_archives() {
        let store = seeded_store().await;
        let config = TerminalConfig::default();
        let printer = RecordingPrinter::default();
        let closing = prepare_closing(&request(exact_count()), &config, &store, &store)
            .await
            .unwrap();

        let outcome = close_day(
            closing,
            "María",
            false,
            local(15, 22, 0),
            &config,
            &store,
            &store,
            &printer,
        )
        .await
        .unwrap();

        assert!(outcome.saved && outcome.printed && outcome.archived);
        assert_eq!(outcome.path, "closings/2024-03/closing_2024-03-15.txt");
        assert!(outcome.report.contains("CUADRA"));
        assert!(outcome.report.contains("Por: María"));

        let stored = store.get_closing(day()).await.unwrap().unwrap();
        assert!(stored.is_closed());
        assert_eq!(
            store.get_document(&outcome.path).await.unwrap().as_deref(),
            Some(outcome.report.as_str())
        );
    }

    #[tokio::test]
    async fn test_review_variance_needs_confirmation() {
        let store = seeded_store().await;
        let config = TerminalConfig::default();
        let printer = RecordingPrinter::default();
        let short = CashCount::new().with(Denomination::Bill20, 3);
        let closing = prepare_closing(&request(short), &config, &store, &store)
            .await
            .unwrap();
        assert_eq!(closing.report.variance_status, VarianceStatus::Review);

        let err = close_day(
            closing.clone(),
            "María",
            false,
            local(15, 22, 0),
            &config,
            &store,
            &store,
            &printer,
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::VarianceConfirmationRequired);
        assert!(store.get_closing(day()).await.unwrap().is_none());
        assert!(printer.printed().await.is_empty());

        let outcome = close_day(
            closing,
            "María",
            true,
            local(15, 22, 0),
            &config,
            &store,
            &store,
            &printer,
        )
        .await
        .unwrap();
        assert!(outcome.report.contains("REVISAR"));
    }

    #[tokio::test]
    async fn test_minor_variance_closes_without_confirmation() {
        let store = seeded_store().await;
        let config = TerminalConfig::default();
        let count = exact_count().with(Denomination::Cent10, 0);
        let closing = prepare_closing(&request(count), &config, &store, &store)
            .await
            .unwrap();
        assert_eq!(closing.report.variance_status, VarianceStatus::Minor);

        let outcome = close_day(
            closing,
            "María",
            false,
            local(15, 22, 0),
            &config,
            &store,
            &store,
            &RecordingPrinter::default(),
        )
        .await
        .unwrap();
        assert!(outcome.closing.is_closed());
    }

    #[tokio::test]
    async fn test_printer_failure_is_partial_success() {
        let store = seeded_store().await;
        let config = TerminalConfig::default();
        let closing = prepare_closing(&request(exact_count()), &config, &store, &store)
            .await
            .unwrap();

        let outcome = close_day(
            closing,
            "María",
            false,
            local(15, 22, 0),
            &config,
            &store,
            &store,
            &RecordingPrinter::failing(),
        )
        .await
        .unwrap();

        assert!(!outcome.printed);
        assert!(outcome.saved && outcome.archived);
        assert_eq!(outcome.errors.len(), 1);
    }

    #[tokio::test]
    async fn test_store_failures_are_partial_success() {
        let store = seeded_store().await;
        let config = TerminalConfig::default();
        let printer = RecordingPrinter::default();
        let closing = prepare_closing(&request(exact_count()), &config, &store, &store)
            .await
            .unwrap();

        let outcome = close_day(
            closing,
            "María",
            false,
            local(15, 22, 0),
            &config,
            &OfflineArchive,
            &OfflineArchive,
            &printer,
        )
        .await
        .unwrap();

        assert!(outcome.printed);
        assert!(!outcome.saved && !outcome.archived);
        assert!(outcome.closing.is_closed());
        assert_eq!(outcome.errors.len(), 2);
        assert!(outcome.errors[0].starts_with("Save failed"));
        assert!(outcome.errors[1].starts_with("Archive failed"));
        assert_eq!(printer.printed().await.len(), 1);
    }

    #[tokio::test]
    async fn test_reclosing_replaces_record() {
        let store = seeded_store().await;
        let config = TerminalConfig::default();
        let printer = RecordingPrinter::default();

        for counted in [exact_count(), exact_count().with(Denomination::Bill1, 0)] {
            let closing = prepare_closing(&request(counted), &config, &store, &store)
                .await
                .unwrap();
            close_day(
                closing,
                "María",
                false,
                local(15, 22, 0),
                &config,
                &store,
                &store,
                &printer,
            )
            .await
            .unwrap();
        }

        let all = store.list_closings(day(), day()).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].report.counted_cash, Money::new(dec!(70.40)));
    }

    #[tokio::test]
    async fn test_close_requires_operator_name() {
        let store = seeded_store().await;
        let config = TerminalConfig::default();
        let closing = prepare_closing(&request(exact_count()), &config, &store, &store)
            .await
            .unwrap();

        let err = close_day(
            closing,
            "  ",
            true,
            local(15, 22, 0),
            &config,
            &store,
            &store,
            &RecordingPrinter::default(),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }
}

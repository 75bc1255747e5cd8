//! # Receipt Commands
//!
//! Prints both copies of an order's receipt and archives the customer copy.
//!
//! ## Partial Success
//! ```text
//! render customer + store copies
//!        │
//!        ├──► print customer copy ──► print store copy ──► printed
//!        │        (a failure skips the store copy)
//!        │
//!        └──► put_document(receipts/YYYY-MM/..., customer copy) ──► saved
//! ```
//! Neither step blocks the other. The outcome reports both flags and every
//! error message.

use serde::Serialize;
use tracing::{info, warn};
use washfold_core::{render_receipt, Order, ReceiptCopy, TaxRate};
use washfold_store::{receipt_path, DocumentStore};

use crate::printer::Printer;
use crate::state::TerminalConfig;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptOutcome {
    pub order_number: u64,
    /// Both copies reached the printer.
    pub printed: bool,
    /// The customer copy was archived.
    pub saved: bool,
    pub path: String,
    pub errors: Vec<String>,
}

/// Renders one copy with the terminal's store header and paper format.
pub fn render_copy(
    order: &Order,
    config: &TerminalConfig,
    tax_rate: TaxRate,
    copy: ReceiptCopy,
) -> String {
    render_receipt(
        order,
        &config.store_info(),
        copy,
        tax_rate,
        &config.print_format(),
    )
}

/// Prints the customer copy then the store copy, and archives the customer
/// copy under the order's local date.
///
/// `tax_rate` labels the ITBMS line and should be the rate the order was
/// priced with.
pub async fn process_order_receipts(
    order: &Order,
    config: &TerminalConfig,
    tax_rate: TaxRate,
    printer: &dyn Printer,
    documents: &dyn DocumentStore,
) -> ReceiptOutcome {
    let customer_copy = render_copy(order, config, tax_rate, ReceiptCopy::Customer);
    let mut errors = Vec::new();

    let mut printed = true;
    for copy in ReceiptCopy::BOTH {
        let text = match copy {
            ReceiptCopy::Customer => customer_copy.clone(),
            ReceiptCopy::Store => render_copy(order, config, tax_rate, copy),
        };
        if let Err(e) = printer.print(&config.printer.name, &text).await {
            warn!(order_number = order.order_number, ?copy, error = %e, "Receipt print failed");
            errors.push(format!("Print failed ({:?} copy): {}", copy, e));
            printed = false;
            break;
        }
    }

    let local_date = order
        .created_at
        .with_timezone(&config.utc_offset())
        .date_naive();
    let path = receipt_path(order.order_number, local_date);

    let saved = match documents.put_document(&path, &customer_copy).await {
        Ok(()) => true,
        Err(e) => {
            warn!(order_number = order.order_number, %path, error = %e, "Receipt archive failed");
            errors.push(format!("Save failed: {}", e));
            false
        }
    };

    info!(order_number = order.order_number, printed, saved, "Receipts processed");

    ReceiptOutcome {
        order_number: order.order_number,
        printed,
        saved,
        path,
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::fixtures::OfflineArchive;
    use crate::printer::testing::RecordingPrinter;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;
    use washfold_core::{
        Money, Payment, PricingMode, Product, ServiceSettings, Ticket, TicketTotals,
    };
    use washfold_store::MemoryStore;

    /// Order #3481, rung up at 21:30 Panama time (02:30 UTC the next day).
    fn late_order() -> Order {
        let shirt = Product::new("shirt", "Camisa", PricingMode::Quantity, Money::new(dec!(2.50)));
        let mut ticket = Ticket::new();
        ticket.add_product(&shirt).unwrap();
        ticket.confirm_walk_in();

        let now = Utc.with_ymd_and_hms(2024, 3, 16, 2, 30, 0).unwrap();
        let offset = chrono::FixedOffset::west_opt(5 * 3600).unwrap();
        let totals = TicketTotals::compute(
            &ticket,
            &ServiceSettings::default(),
            now.with_timezone(&offset),
        );
        let payment = Payment::cash(totals.total, Money::new(dec!(5))).unwrap();
        let mut order = Order::from_ticket(&ticket, &totals, payment, None, now).unwrap();
        order.order_number = 3481;
        order
    }

    #[tokio::test]
    async fn test_prints_both_copies_and_saves_customer_copy() {
        let config = TerminalConfig::default();
        let printer = RecordingPrinter::default();
        let store = MemoryStore::new();
        let order = late_order();

        let outcome =
            process_order_receipts(&order, &config, TaxRate::ITBMS, &printer, &store).await;

        assert!(outcome.printed && outcome.saved);
        assert!(outcome.errors.is_empty());
        // Local date, not the UTC date
        assert_eq!(outcome.path, "receipts/2024-03/2024-03-15_order-3481.txt");

        let jobs = printer.printed().await;
        assert_eq!(jobs.len(), 2);
        assert!(jobs[0].contains("COPIA CLIENTE"));
        assert!(jobs[1].contains("COPIA TIENDA"));

        let saved = store.get_document(&outcome.path).await.unwrap().unwrap();
        assert_eq!(saved, jobs[0]);
    }

    #[tokio::test]
    async fn test_printer_failure_still_saves() {
        let config = TerminalConfig::default();
        let printer = RecordingPrinter::failing();
        let store = MemoryStore::new();

        let outcome =
            process_order_receipts(&late_order(), &config, TaxRate::ITBMS, &printer, &store).await;

        assert!(!outcome.printed);
        assert!(outcome.saved);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(store.document_count().await, 1);
    }

    #[tokio::test]
    async fn test_store_copy_failure_is_reported() {
        let config = TerminalConfig::default();
        let printer = RecordingPrinter::failing_after(1);
        let store = MemoryStore::new();

        let outcome =
            process_order_receipts(&late_order(), &config, TaxRate::ITBMS, &printer, &store).await;

        assert!(!outcome.printed);
        assert!(outcome.errors[0].contains("Store copy"));
        assert_eq!(printer.printed().await.len(), 1);
    }

    #[tokio::test]
    async fn test_archive_failure_still_prints() {
        let config = TerminalConfig::default();
        let printer = RecordingPrinter::default();

        let outcome =
            process_order_receipts(&late_order(), &config, TaxRate::ITBMS, &printer, &OfflineArchive)
                .await;

        assert!(outcome.printed && !outcome.saved);
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.errors[0].starts_with("Save failed"));
        assert_eq!(printer.printed().await.len(), 2);
    }

    #[test]
    fn test_render_copy_uses_config_header() {
        let mut config = TerminalConfig::default();
        config.store.name = "LAVANDERÍA CENTRAL".into();
        let text = render_copy(&late_order(), &config, TaxRate::ITBMS, ReceiptCopy::Store);
        assert!(text.contains("LAVANDERÍA CENTRAL"));
        assert!(text.contains("Efectivo"));
    }
}

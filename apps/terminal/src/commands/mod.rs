//! # Terminal Commands
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs        ◄─── You are here (exports)
//! ├── quote.rs      ◄─── Price the current ticket
//! ├── order.rs      ◄─── Checkout, workflow moves, refunds, board
//! ├── receipt.rs    ◄─── Print + archive receipts
//! ├── closing.rs    ◄─── Daily closing: prepare, close, print, archive
//! └── analytics.rs  ◄─── Sales KPIs
//! ```
//!
//! ## How Commands Work
//! Each command takes only the collaborators it needs, as plain references:
//! ```rust,ignore
//! // Only needs the session
//! fn quote(session: &Session, format: &PrintFormat, now: DateTime<Utc>)
//!
//! // Needs orders and the catalog
//! async fn prepare_closing(request, config, orders: &dyn OrderStore, catalog: &dyn CatalogStore)
//! ```
//! Commands that fail return `ApiError`. Commands with side effects on
//! paper and in the archive return an outcome with per-step flags instead.

pub mod analytics;
pub mod closing;
pub mod order;
pub mod quote;
pub mod receipt;

pub use analytics::{sales_kpis, KpiResponse};
pub use closing::{close_day, prepare_closing, CloseOutcome, ClosingRequest};
pub use order::{
    advance_order, cancel_order, checkout, order_board, refund_order, BoardColumn, BoardOrder,
    CheckoutResponse,
};
pub use quote::{quote, QuoteLine, QuoteResponse};
pub use receipt::{process_order_receipts, render_copy, ReceiptOutcome};

/// Orders shared by the command tests.
#[cfg(test)]
pub(crate) mod fixtures {
    use async_trait::async_trait;
    use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
    use washfold_core::DailyClosing;
    use washfold_store::{ClosingStore, DocumentStore, StoreError, StoreResult};
    use rust_decimal_macros::dec;
    use washfold_core::{
        Money, Order, Payment, PaymentMethod, PricingMode, Product, ServiceSettings, Ticket,
        TicketTotals, User,
    };

    pub fn panama() -> FixedOffset {
        FixedOffset::west_opt(5 * 3600).unwrap()
    }

    pub fn shirt() -> Product {
        Product::new("shirt", "Camisa", PricingMode::Quantity, Money::new(dec!(2.50)))
    }

    /// A numbered walk-in order for `pieces` shirts (B/2.675 each with tax),
    /// paid in full with `method`.
    pub fn order(
        number: u64,
        created_at: DateTime<Utc>,
        method: PaymentMethod,
        pieces: u32,
        operator: Option<&User>,
    ) -> Order {
        let mut ticket = Ticket::new();
        for _ in 0..pieces {
            ticket.add_product(&shirt()).unwrap();
        }
        ticket.confirm_walk_in();

        let totals = TicketTotals::compute(
            &ticket,
            &ServiceSettings::default(),
            created_at.with_timezone(&panama()),
        );
        let payment = match method {
            PaymentMethod::Cash => Payment::cash(totals.total, totals.total).unwrap(),
            other => Payment::new(other, totals.total),
        };
        let mut order = Order::from_ticket(&ticket, &totals, payment, operator, created_at).unwrap();
        order.order_number = number;
        order
    }

    /// Archive and closing storage that is down: every write fails.
    pub struct OfflineArchive;

    fn offline() -> StoreError {
        StoreError::Unavailable("archive offline".into())
    }

    #[async_trait]
    impl DocumentStore for OfflineArchive {
        async fn put_document(&self, _path: &str, _content: &str) -> StoreResult<()> {
            Err(offline())
        }
        async fn get_document(&self, _path: &str) -> StoreResult<Option<String>> {
            Err(offline())
        }
    }

    #[async_trait]
    impl ClosingStore for OfflineArchive {
        async fn upsert_closing(&self, _closing: DailyClosing) -> StoreResult<()> {
            Err(offline())
        }
        async fn get_closing(&self, _date: NaiveDate) -> StoreResult<Option<DailyClosing>> {
            Err(offline())
        }
        async fn list_closings(
            &self,
            _from: NaiveDate,
            _to: NaiveDate,
        ) -> StoreResult<Vec<DailyClosing>> {
            Err(offline())
        }
    }
}

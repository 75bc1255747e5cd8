//! # washfold-core: Pure Business Logic for the Wash & Fold POS
//!
//! This crate holds every rule of the laundry counter as pure functions with
//! zero I/O dependencies: ticket pricing, the order workflow, the end-of-day
//! cash reconciliation, and the text that goes to the receipt printer.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Wash & Fold POS Architecture                       │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    apps/terminal                                │   │
//! │  │   Session (ticket commands) ──► receipt / closing commands      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ washfold-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────────────┐  │   │
//! │  │   │  ticket  │ │  order   │ │ closing  │ │ layout / receipt │  │   │
//! │  │   │ LineItem │ │ workflow │ │ variance │ │ report           │  │   │
//! │  │   │ Totals   │ │ kanban   │ │ per-user │ │ 48 columns       │  │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO STORE • NO CLOCK • PURE FUNCTIONS                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                washfold-store (data-store seam)                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Exact decimal `Money` and `TaxRate`
//! - [`types`] - Catalog, customer, user, payment and settings types
//! - [`ticket`] - Line items, the in-progress ticket and its totals
//! - [`order`] - Finalized orders and the wash/dry/fold workflow
//! - [`closing`] - Daily cash reconciliation
//! - [`layout`] - Fixed-width text helpers for 80mm paper
//! - [`receipt`] / [`report`] - Printable receipt and closing report text
//! - [`analytics`] - Sales KPIs per period
//! - [`validation`] - Input rules applied before anything reaches the math
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::{FixedOffset, TimeZone};
//! use washfold_core::{Money, PricingMode, Product, ServiceSettings, Ticket, TicketTotals};
//!
//! let wash = Product::new("p-1", "Lavado por libra", PricingMode::Quantity, Money::from_cents(1000));
//! let mut ticket = Ticket::new();
//! ticket.add_product(&wash).unwrap();
//! ticket.add_product(&wash).unwrap();
//!
//! let now = FixedOffset::west_opt(5 * 3600).unwrap()
//!     .with_ymd_and_hms(2024, 3, 15, 9, 30, 0).unwrap();
//! let totals = TicketTotals::compute(&ticket, &ServiceSettings::default(), now);
//!
//! assert_eq!(totals.subtotal.to_string(), "B/20.00");
//! assert_eq!(totals.total.to_string(), "B/21.40");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod analytics;
pub mod closing;
pub mod error;
pub mod layout;
pub mod money;
pub mod order;
pub mod receipt;
pub mod report;
pub mod ticket;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use analytics::{AnalyticsPeriod, SalesKpis};
pub use closing::{
    compute_daily_closing, CashCount, ClosingState, DailyClosing, DailyClosingReport,
    VarianceStatus,
};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::{Money, TaxRate};
pub use layout::PrintFormat;
pub use order::{Order, OrderStatus, WorkflowStage};
pub use receipt::{render_receipt, ReceiptCopy};
pub use report::render_closing_report;
pub use ticket::{
    compute_ticket_totals, LineItem, ManualDiscount, Ticket, TicketTotals, WeightEntry,
};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines allowed on a single ticket.
pub const MAX_TICKET_ITEMS: usize = 100;

/// Maximum quantity on a single quantity-priced line.
///
/// Guards against typing 1000 instead of 10 at the counter.
pub const MAX_ITEM_QUANTITY: u32 = 999;

/// Order numbers start above this value; the first order is 3481.
pub const ORDER_NUMBER_FLOOR: u64 = 3480;

/// Characters per line on 80mm thermal paper.
pub const PAPER_WIDTH: usize = 48;

/// Panamanian Balboa prefix used on every printed amount.
pub const DEFAULT_CURRENCY_PREFIX: &str = "B/";

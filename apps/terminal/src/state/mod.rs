//! # Terminal State
//!
//! ```text
//! ┌──────────────────┐ ┌──────────────────┐ ┌──────────────────────┐
//! │  TerminalConfig  │ │     Session      │ │     StoreState       │
//! │                  │ │                  │ │                      │
//! │  • Store header  │ │  • Current ticket│ │  • Orders, closings  │
//! │  • Tax, lead time│ │  • Operator      │ │  • Catalog, settings │
//! │  • Printer, cash │ │  • Checkout      │ │  • Documents         │
//! └──────────────────┘ └──────────────────┘ └──────────────────────┘
//! ```

mod config;
mod session;
mod store;

pub use config::{CashConfig, PrinterConfig, StoreConfig, TerminalConfig};
pub use session::Session;
pub use store::StoreState;

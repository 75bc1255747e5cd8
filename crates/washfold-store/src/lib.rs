//! # washfold-store: Data-Store Layer for the Wash & Fold POS
//!
//! Async contracts for the external data store, plus an in-memory
//! implementation.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        washfold-store                                   │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   repository (traits)                           │   │
//! │  │   OrderStore  ClosingStore  CatalogStore  SettingsStore         │   │
//! │  │   DocumentStore                                                 │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ implemented by                         │
//! │              ┌─────────────────┴─────────────────┐                      │
//! │              ▼                                   ▼                      │
//! │     ┌─────────────────┐               ┌──────────────────┐              │
//! │     │  MemoryStore    │               │ hosted backend   │              │
//! │     │  (this crate)   │               │ (deployment)     │              │
//! │     └─────────────────┘               └──────────────────┘              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust,no_run
//! use washfold_store::{MemoryStore, OrderStore};
//!
//! # async fn example(order: washfold_core::Order) -> washfold_store::StoreResult<()> {
//! let store = MemoryStore::new();
//! let saved = store.create_order(order).await?;
//! assert!(saved.order_number > washfold_core::ORDER_NUMBER_FLOOR);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod memory;
pub mod paths;
pub mod repository;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use paths::{closing_path, receipt_path};
pub use repository::{CatalogStore, ClosingStore, DocumentStore, OrderStore, SettingsStore};

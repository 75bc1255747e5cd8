//! # Store Contracts
//!
//! One trait per collection. The terminal holds them as `Arc<dyn ...>` so a
//! hosted backend and [`MemoryStore`](crate::MemoryStore) are
//! interchangeable.
//!
//! ```text
//! ┌──────────────┐  create_order ──► number = max(existing, 3480) + 1
//! │  OrderStore  │  list_orders  ──► created_at ∈ [from, to)
//! └──────────────┘
//! ┌──────────────┐  upsert_closing ──► one record per date, closed only
//! │ ClosingStore │  list_closings  ──► newest first
//! └──────────────┘
//! ```

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use washfold_core::{Customer, DailyClosing, Money, Order, OrderStatus, Product, ServiceSettings, User};

use crate::error::StoreResult;

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Stores a new order and assigns its number.
    ///
    /// Numbering happens inside the store so two terminals never hand out
    /// the same number. The `order_number` on the input is ignored.
    async fn create_order(&self, order: Order) -> StoreResult<Order>;

    async fn get_order(&self, id: &str) -> StoreResult<Option<Order>>;

    async fn get_order_by_number(&self, order_number: u64) -> StoreResult<Option<Order>>;

    /// Orders created in `[from, to)`, oldest first.
    async fn list_orders(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> StoreResult<Vec<Order>>;

    /// Orders still being processed (pending through folding).
    async fn list_open_orders(&self) -> StoreResult<Vec<Order>>;

    async fn update_status(
        &self,
        id: &str,
        status: OrderStatus,
        at: DateTime<Utc>,
    ) -> StoreResult<Order>;

    async fn record_refund(
        &self,
        id: &str,
        amount: Money,
        reason: Option<String>,
        at: DateTime<Utc>,
    ) -> StoreResult<Order>;
}

#[async_trait]
pub trait ClosingStore: Send + Sync {
    /// Inserts or replaces the closing for its date.
    async fn upsert_closing(&self, closing: DailyClosing) -> StoreResult<()>;

    async fn get_closing(&self, date: NaiveDate) -> StoreResult<Option<DailyClosing>>;

    /// Closings with `from <= date <= to`, newest first.
    async fn list_closings(&self, from: NaiveDate, to: NaiveDate) -> StoreResult<Vec<DailyClosing>>;
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list_products(&self, active_only: bool) -> StoreResult<Vec<Product>>;

    async fn get_product(&self, id: &str) -> StoreResult<Option<Product>>;

    async fn upsert_product(&self, product: Product) -> StoreResult<()>;

    async fn get_customer(&self, id: &str) -> StoreResult<Option<Customer>>;

    async fn upsert_customer(&self, customer: Customer) -> StoreResult<()>;

    /// Case-insensitive match on full name or phone.
    async fn search_customers(&self, query: &str, limit: usize) -> StoreResult<Vec<Customer>>;

    async fn list_users(&self) -> StoreResult<Vec<User>>;
}

#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// `None` when nothing was saved yet; callers fall back to defaults.
    async fn service_settings(&self) -> StoreResult<Option<ServiceSettings>>;

    async fn save_service_settings(&self, settings: ServiceSettings) -> StoreResult<()>;
}

/// Archived text documents (receipts, closing reports).
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Writes `content` at `path`, replacing what was there.
    async fn put_document(&self, path: &str, content: &str) -> StoreResult<()>;

    async fn get_document(&self, path: &str) -> StoreResult<Option<String>>;
}

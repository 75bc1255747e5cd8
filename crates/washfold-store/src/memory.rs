//! # In-Memory Store
//!
//! Implements every store trait over `tokio::sync::RwLock`ed collections.
//! Used by the CLI and by tests; cloning shares the same data.
//!
//! ## Locking
//! ```text
//! create_order:  orders.write() ──► number = max + 1 ──► insert ──► unlock
//!                └──────────── one critical section ────────────┘
//! ```
//! Readers never see a half-numbered order, and two concurrent
//! `create_order` calls always get distinct numbers.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info};
use washfold_core::order::next_order_number;
use washfold_core::{Customer, DailyClosing, Money, Order, OrderStatus, Product, ServiceSettings, User};

use crate::error::{StoreError, StoreResult};
use crate::repository::{CatalogStore, ClosingStore, DocumentStore, OrderStore, SettingsStore};

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    orders: Arc<RwLock<HashMap<String, Order>>>,
    closings: Arc<RwLock<BTreeMap<NaiveDate, DailyClosing>>>,
    products: Arc<RwLock<BTreeMap<String, Product>>>,
    customers: Arc<RwLock<BTreeMap<String, Customer>>>,
    users: Arc<RwLock<Vec<User>>>,
    settings: Arc<RwLock<Option<ServiceSettings>>>,
    documents: Arc<RwLock<BTreeMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// Adds or replaces an operator.
    pub async fn add_user(&self, user: User) {
        let mut users = self.users.write().await;
        users.retain(|u| u.id != user.id);
        users.push(user);
    }

    /// Loads already-numbered orders as they are, e.g. from an export.
    ///
    /// ## Errors
    /// `UniqueViolation` when an ID or order number is already present, in
    /// the store or earlier in the same batch. Nothing is imported then.
    pub async fn import_orders(&self, imported: Vec<Order>) -> StoreResult<usize> {
        let mut orders = self.orders.write().await;
        {
            let mut ids: HashSet<&str> = orders.keys().map(String::as_str).collect();
            let mut numbers: HashSet<u64> = orders.values().map(|o| o.order_number).collect();
            for order in &imported {
                if !ids.insert(order.id.as_str()) {
                    return Err(StoreError::duplicate("order id", &order.id));
                }
                if !numbers.insert(order.order_number) {
                    return Err(StoreError::duplicate(
                        "order number",
                        order.order_number.to_string(),
                    ));
                }
            }
        }
        let count = imported.len();
        for order in imported {
            orders.insert(order.id.clone(), order);
        }
        debug!(count, "Imported orders");
        Ok(count)
    }

    pub async fn document_count(&self) -> usize {
        self.documents.read().await.len()
    }
}

fn sorted_by_creation(mut orders: Vec<Order>) -> Vec<Order> {
    orders.sort_by(|a, b| (a.created_at, a.order_number).cmp(&(b.created_at, b.order_number)));
    orders
}

// =============================================================================
// Orders
// =============================================================================

#[async_trait]
impl OrderStore for MemoryStore {
    async fn create_order(&self, mut order: Order) -> StoreResult<Order> {
        let mut orders = self.orders.write().await;
        if orders.contains_key(&order.id) {
            return Err(StoreError::duplicate("order id", &order.id));
        }

        let highest = orders.values().map(|o| o.order_number).max();
        order.order_number = next_order_number(highest);

        debug!(id = %order.id, order_number = order.order_number, total = %order.total, "Creating order");
        orders.insert(order.id.clone(), order.clone());
        Ok(order)
    }

    async fn get_order(&self, id: &str) -> StoreResult<Option<Order>> {
        Ok(self.orders.read().await.get(id).cloned())
    }

    async fn get_order_by_number(&self, order_number: u64) -> StoreResult<Option<Order>> {
        let orders = self.orders.read().await;
        Ok(orders
            .values()
            .find(|o| o.order_number == order_number)
            .cloned())
    }

    async fn list_orders(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> StoreResult<Vec<Order>> {
        let orders = self.orders.read().await;
        let found: Vec<Order> = orders
            .values()
            .filter(|o| o.created_at >= from && o.created_at < to)
            .cloned()
            .collect();
        debug!(from = %from, to = %to, count = found.len(), "Listed orders");
        Ok(sorted_by_creation(found))
    }

    async fn list_open_orders(&self) -> StoreResult<Vec<Order>> {
        let orders = self.orders.read().await;
        let open: Vec<Order> = orders
            .values()
            .filter(|o| o.status.is_open())
            .cloned()
            .collect();
        Ok(sorted_by_creation(open))
    }

    async fn update_status(
        &self,
        id: &str,
        status: OrderStatus,
        at: DateTime<Utc>,
    ) -> StoreResult<Order> {
        let mut orders = self.orders.write().await;
        let order = orders
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found("Order", id))?;
        let from = order.status;
        order.set_status(status, at)?;
        debug!(order_number = order.order_number, from = %from, to = %status, "Order status updated");
        Ok(order.clone())
    }

    async fn record_refund(
        &self,
        id: &str,
        amount: Money,
        reason: Option<String>,
        at: DateTime<Utc>,
    ) -> StoreResult<Order> {
        let mut orders = self.orders.write().await;
        let order = orders
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found("Order", id))?;
        order.refund(amount, reason, at)?;
        info!(order_number = order.order_number, amount = %amount, "Refund recorded");
        Ok(order.clone())
    }
}

// =============================================================================
// Closings
// =============================================================================

#[async_trait]
impl ClosingStore for MemoryStore {
    async fn upsert_closing(&self, closing: DailyClosing) -> StoreResult<()> {
        if !closing.is_closed() {
            return Err(StoreError::InvalidState(format!(
                "closing for {} has not been closed",
                closing.date()
            )));
        }
        let date = closing.date();
        let replaced = self.closings.write().await.insert(date, closing).is_some();
        info!(date = %date, replaced, "Closing saved");
        Ok(())
    }

    async fn get_closing(&self, date: NaiveDate) -> StoreResult<Option<DailyClosing>> {
        Ok(self.closings.read().await.get(&date).cloned())
    }

    async fn list_closings(&self, from: NaiveDate, to: NaiveDate) -> StoreResult<Vec<DailyClosing>> {
        if from > to {
            return Ok(Vec::new());
        }
        let closings = self.closings.read().await;
        Ok(closings.range(from..=to).rev().map(|(_, c)| c.clone()).collect())
    }
}

// =============================================================================
// Catalog
// =============================================================================

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn list_products(&self, active_only: bool) -> StoreResult<Vec<Product>> {
        let products = self.products.read().await;
        Ok(products
            .values()
            .filter(|p| !active_only || p.active)
            .cloned()
            .collect())
    }

    async fn get_product(&self, id: &str) -> StoreResult<Option<Product>> {
        Ok(self.products.read().await.get(id).cloned())
    }

    async fn upsert_product(&self, product: Product) -> StoreResult<()> {
        debug!(id = %product.id, name = %product.name, "Saving product");
        self.products.write().await.insert(product.id.clone(), product);
        Ok(())
    }

    async fn get_customer(&self, id: &str) -> StoreResult<Option<Customer>> {
        Ok(self.customers.read().await.get(id).cloned())
    }

    async fn upsert_customer(&self, customer: Customer) -> StoreResult<()> {
        debug!(id = %customer.id, "Saving customer");
        self.customers
            .write()
            .await
            .insert(customer.id.clone(), customer);
        Ok(())
    }

    async fn search_customers(&self, query: &str, limit: usize) -> StoreResult<Vec<Customer>> {
        let query = query.trim().to_lowercase();
        let customers = self.customers.read().await;
        let mut found: Vec<Customer> = customers
            .values()
            .filter(|c| {
                query.is_empty()
                    || c.display_name().to_lowercase().contains(&query)
                    || c.phone
                        .as_deref()
                        .is_some_and(|p| p.to_lowercase().contains(&query))
            })
            .cloned()
            .collect();
        found.sort_by_key(|c| c.display_name().to_lowercase());
        found.truncate(limit);
        Ok(found)
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        Ok(self.users.read().await.clone())
    }
}

// =============================================================================
// Settings & Documents
// =============================================================================

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn service_settings(&self) -> StoreResult<Option<ServiceSettings>> {
        Ok(*self.settings.read().await)
    }

    async fn save_service_settings(&self, settings: ServiceSettings) -> StoreResult<()> {
        *self.settings.write().await = Some(settings);
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn put_document(&self, path: &str, content: &str) -> StoreResult<()> {
        let replaced = self
            .documents
            .write()
            .await
            .insert(path.to_string(), content.to_string())
            .is_some();
        debug!(path, bytes = content.len(), replaced, "Document saved");
        Ok(())
    }

    async fn get_document(&self, path: &str) -> StoreResult<Option<String>> {
        Ok(self.documents.read().await.get(path).cloned())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

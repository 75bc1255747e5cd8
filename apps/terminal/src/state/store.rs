//! # Store State
//!
//! The data-store collaborators, held behind trait objects so the terminal
//! runs the same against [`MemoryStore`] and a hosted backend.
//!
//! ## Usage in Commands
//! ```rust,ignore
//! let closing = prepare_closing(&request, &config, &*stores.orders, &*stores.catalog).await?;
//! ```

use std::sync::Arc;
use washfold_store::{
    CatalogStore, ClosingStore, DocumentStore, MemoryStore, OrderStore, SettingsStore,
};

#[derive(Clone)]
pub struct StoreState {
    pub orders: Arc<dyn OrderStore>,
    pub closings: Arc<dyn ClosingStore>,
    pub catalog: Arc<dyn CatalogStore>,
    pub settings: Arc<dyn SettingsStore>,
    pub documents: Arc<dyn DocumentStore>,
}

impl StoreState {
    /// Every collaborator backed by the same in-memory store.
    pub fn memory(store: MemoryStore) -> Self {
        StoreState {
            orders: Arc::new(store.clone()),
            closings: Arc::new(store.clone()),
            catalog: Arc::new(store.clone()),
            settings: Arc::new(store.clone()),
            documents: Arc::new(store),
        }
    }
}

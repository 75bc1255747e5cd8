//! # Counter Session
//!
//! One ticket at a time, owned by the terminal.
//!
//! ## Ownership
//! Every mutating command takes `&mut self`. While `finalize` awaits the
//! data store, nothing else can touch the ticket, so the same ticket can
//! never be submitted twice.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  add_product / add_weighed / set_customer / set_express / ...           │
//! │         │                                                               │
//! │         ▼                                                               │
//! │     Ticket ──► totals(now) ──► TicketTotals (display)                   │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  finalize(payment) ──► Order::from_ticket ──► OrderStore::create_order  │
//! │                                                   │                     │
//! │                           success: ticket cleared │ failure: kept       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, FixedOffset, Utc};
use tracing::{debug, info, warn};
use washfold_core::{
    Customer, LineItem, ManualDiscount, Order, Payment, Product, ServiceSettings, Ticket,
    TicketTotals, User, WeightEntry,
};
use washfold_store::{OrderStore, SettingsStore};

use crate::error::ApiError;

#[derive(Debug, Clone)]
pub struct Session {
    ticket: Ticket,
    operator: Option<User>,
    settings: ServiceSettings,
    utc_offset: FixedOffset,
}

impl Session {
    /// Starts with an empty ticket. `settings` are the configured fallback
    /// until [`Session::refresh_settings`] finds saved ones.
    pub fn new(settings: ServiceSettings, utc_offset: FixedOffset, operator: Option<User>) -> Self {
        Session {
            ticket: Ticket::new(),
            operator,
            settings,
            utc_offset,
        }
    }

    /// Resumes a ticket that was being built elsewhere (e.g. loaded from JSON).
    pub fn with_ticket(mut self, ticket: Ticket) -> Self {
        self.ticket = ticket;
        self
    }

    pub fn ticket(&self) -> &Ticket {
        &self.ticket
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    pub fn operator(&self) -> Option<&User> {
        self.operator.as_ref()
    }

    pub fn set_operator(&mut self, operator: Option<User>) {
        self.operator = operator;
    }

    /// Picks up the store's saved settings. Keeps the current ones when
    /// nothing is saved or the store cannot be reached.
    pub async fn refresh_settings(&mut self, store: &dyn SettingsStore) {
        match store.service_settings().await {
            Ok(Some(settings)) => {
                debug!(tax_bps = settings.tax_rate.bps(), "Loaded service settings");
                self.settings = settings;
            }
            Ok(None) => debug!("No saved service settings, keeping defaults"),
            Err(e) => warn!(error = %e, "Could not load service settings, keeping defaults"),
        }
    }

    // =========================================================================
    // Ticket Commands
    // =========================================================================

    pub fn add_product(&mut self, product: &Product) -> Result<(), ApiError> {
        debug!(product = %product.id, "add_product command");
        self.ticket.add_product(product)?;
        Ok(())
    }

    /// Returns the position of the new weight line.
    pub fn add_weighed(
        &mut self,
        product: &Product,
        entries: Vec<WeightEntry>,
    ) -> Result<usize, ApiError> {
        debug!(product = %product.id, bags = entries.len(), "add_weighed command");
        Ok(self.ticket.add_weighed(product, entries)?)
    }

    pub fn add_weight_entry(&mut self, index: usize, entry: WeightEntry) -> Result<(), ApiError> {
        self.ticket.add_weight_entry(index, entry)?;
        Ok(())
    }

    pub fn update_quantity(&mut self, index: usize, quantity: u32) -> Result<(), ApiError> {
        debug!(index, quantity, "update_quantity command");
        self.ticket.update_quantity(index, quantity)?;
        Ok(())
    }

    pub fn remove_item(&mut self, index: usize) -> Result<LineItem, ApiError> {
        Ok(self.ticket.remove_item(index)?)
    }

    pub fn set_customer(&mut self, customer: Customer) {
        debug!(customer = %customer.id, "set_customer command");
        self.ticket.set_customer(customer);
    }

    pub fn confirm_walk_in(&mut self) {
        self.ticket.confirm_walk_in();
    }

    pub fn set_express(&mut self, is_express: bool) {
        self.ticket.set_express(is_express);
    }

    pub fn apply_discount(&mut self, discount: ManualDiscount) -> Result<(), ApiError> {
        debug!(kind = ?discount.kind, "apply_discount command");
        self.ticket.set_manual_discount(discount)?;
        Ok(())
    }

    pub fn clear_discount(&mut self) {
        self.ticket.clear_manual_discount();
    }

    pub fn set_delivery(&mut self, delivery: Option<Product>) {
        self.ticket.set_delivery(delivery);
    }

    pub fn set_notes(&mut self, notes: &str) -> Result<(), ApiError> {
        self.ticket.set_notes(notes)?;
        Ok(())
    }

    pub fn clear(&mut self) {
        debug!("clear ticket command");
        self.ticket.clear();
    }

    // =========================================================================
    // Pricing & Checkout
    // =========================================================================

    /// Prices the current ticket as of `now`, in the store's offset.
    pub fn totals(&self, now: DateTime<Utc>) -> TicketTotals {
        TicketTotals::compute(
            &self.ticket,
            &self.settings,
            now.with_timezone(&self.utc_offset),
        )
    }

    /// Turns the ticket into a stored order.
    ///
    /// ## Flow
    /// 1. Price the ticket and build the order (rejects empty tickets,
    ///    unconfirmed customers and payments that do not match the total)
    /// 2. The store assigns the order number
    /// 3. Only then is the ticket cleared; on any failure it is left as is
    ///    so the operator can retry
    pub async fn finalize(
        &mut self,
        payment: Payment,
        orders: &dyn OrderStore,
        now: DateTime<Utc>,
    ) -> Result<Order, ApiError> {
        debug!(method = %payment.method, "finalize command");

        let totals = self.totals(now);
        let order = Order::from_ticket(
            &self.ticket,
            &totals,
            payment,
            self.operator.as_ref(),
            now,
        )?;

        let saved = orders.create_order(order).await?;
        self.ticket.clear();

        info!(
            order_number = saved.order_number,
            total = %saved.total,
            method = %saved.payment.method,
            "Order created"
        );
        Ok(saved)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

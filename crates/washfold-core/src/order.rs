//! # Order Module
//!
//! A finalized ticket and its trip through the laundry.
//!
//! ## Status Workflow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Order Status Flow                               │
//! │                                                                         │
//! │  pending ──► washing ──► drying ──► folding ──► ready ──► completed     │
//! │  Por Hacer   Lavadoras   Secadoras  Doblado     └──── Completada ────┘  │
//! │     │           │           │          │          │                     │
//! │     └───────────┴─────┬─────┴──────────┴──────────┘                     │
//! │                       ▼                                                 │
//! │                   cancelled        (any time before completion)        │
//! │                                                                         │
//! │  refunded ◄── any status except cancelled                              │
//! │                                                                         │
//! │  cancelled, refunded: terminal                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::ticket::{LineItem, Ticket, TicketTotals};
use crate::types::{Customer, Payment, User};
use crate::validation::validate_refund_amount;
use crate::ORDER_NUMBER_FLOOR;

/// Name printed for orders without a registered customer.
pub const WALK_IN_NAME: &str = "Walk-in";

/// Hours before the promised time at which an order counts as urgent.
const URGENT_WITHIN_HOURS: i64 = 4;

// =============================================================================
// Order Status
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum OrderStatus {
    #[default]
    Pending,
    Washing,
    Drying,
    Folding,
    Ready,
    Completed,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    /// The normal workflow, in order.
    pub const WORKFLOW: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Washing,
        OrderStatus::Drying,
        OrderStatus::Folding,
        OrderStatus::Ready,
        OrderStatus::Completed,
    ];

    /// The next workflow step, if any.
    pub fn next(&self) -> Option<OrderStatus> {
        let position = Self::WORKFLOW.iter().position(|s| s == self)?;
        Self::WORKFLOW.get(position + 1).copied()
    }

    /// No further changes are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Cancelled | OrderStatus::Refunded)
    }

    /// Still in the laundry (not yet handed back).
    pub fn is_open(&self) -> bool {
        matches!(
            self,
            OrderStatus::Pending
                | OrderStatus::Washing
                | OrderStatus::Drying
                | OrderStatus::Folding
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Washing => "washing",
            OrderStatus::Drying => "drying",
            OrderStatus::Folding => "folding",
            OrderStatus::Ready => "ready",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Refunded => "refunded",
        }
    }

    /// Spanish label shown on order cards.
    pub fn label(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pendiente",
            OrderStatus::Washing => "Lavando",
            OrderStatus::Drying => "Secando",
            OrderStatus::Folding => "Doblando",
            OrderStatus::Ready => "Listo",
            OrderStatus::Completed => "Completado",
            OrderStatus::Cancelled => "Cancelado",
            OrderStatus::Refunded => "Reembolsado",
        }
    }

    /// Kanban column this status belongs to; none for cancelled/refunded.
    pub fn stage(&self) -> Option<WorkflowStage> {
        match self {
            OrderStatus::Pending => Some(WorkflowStage::ToDo),
            OrderStatus::Washing => Some(WorkflowStage::Washers),
            OrderStatus::Drying => Some(WorkflowStage::Dryers),
            OrderStatus::Folding => Some(WorkflowStage::Folding),
            OrderStatus::Ready | OrderStatus::Completed => Some(WorkflowStage::Done),
            OrderStatus::Cancelled | OrderStatus::Refunded => None,
        }
    }

    /// Whether an order may move from `self` to `to`.
    ///
    /// ## Rules
    /// - Workflow statuses may be set freely (the kanban allows dragging
    ///   back a column) until the order is completed
    /// - Cancel is allowed until completion
    /// - Refund is allowed from anything but cancelled
    /// - Cancelled and refunded are final
    pub fn can_transition_to(&self, to: OrderStatus) -> bool {
        if self.is_terminal() || *self == to {
            return false;
        }
        match to {
            OrderStatus::Refunded => true,
            _ => *self != OrderStatus::Completed,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Kanban
// =============================================================================

/// Columns on the production board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum WorkflowStage {
    ToDo,
    Washers,
    Dryers,
    Folding,
    Done,
}

impl WorkflowStage {
    pub const ALL: [WorkflowStage; 5] = [
        WorkflowStage::ToDo,
        WorkflowStage::Washers,
        WorkflowStage::Dryers,
        WorkflowStage::Folding,
        WorkflowStage::Done,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            WorkflowStage::ToDo => "Por Hacer",
            WorkflowStage::Washers => "Lavadoras",
            WorkflowStage::Dryers => "Secadoras",
            WorkflowStage::Folding => "Doblado",
            WorkflowStage::Done => "Completada",
        }
    }
}

/// One column of the board with its orders, earliest promise first.
#[derive(Debug, Clone)]
pub struct KanbanColumn<'a> {
    pub stage: WorkflowStage,
    pub orders: Vec<&'a Order>,
}

/// Groups orders into the five board columns.
///
/// Cancelled and refunded orders are left off the board.
pub fn kanban_board(orders: &[Order]) -> Vec<KanbanColumn<'_>> {
    WorkflowStage::ALL
        .iter()
        .map(|&stage| {
            let mut column: Vec<&Order> = orders
                .iter()
                .filter(|o| o.status.stage() == Some(stage))
                .collect();
            column.sort_by_key(|o| (o.promised_date, o.order_number));
            KanbanColumn {
                stage,
                orders: column,
            }
        })
        .collect()
}

/// How close an open order is to its promised time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum DueUrgency {
    OnTime,
    /// Less than four hours left.
    Urgent,
    Overdue,
}

// =============================================================================
// Order
// =============================================================================

/// A refund recorded against an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Refund {
    pub amount: Money,
    #[serde(default)]
    pub reason: Option<String>,
    #[ts(as = "String")]
    pub refunded_at: DateTime<Utc>,
}

/// The persisted form of a finalized ticket.
///
/// ## Invariant
/// `total = subtotal − discount_amount + delivery_charge + tax_amount`,
/// exactly, for every order built by [`Order::from_ticket`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,

    /// Store-scoped sequence number; `0` until the data store assigns one.
    #[serde(default)]
    pub order_number: u64,

    #[serde(default)]
    pub customer: Option<Customer>,

    /// Snapshot of the customer's name, `Walk-in` when there is none.
    #[serde(default = "walk_in_name")]
    pub customer_name: String,

    /// Operator who rang up the order.
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,

    #[serde(default)]
    pub status: OrderStatus,

    #[serde(default)]
    pub is_express: bool,

    pub items: Vec<LineItem>,

    pub subtotal: Money,
    #[serde(default)]
    pub discount_amount: Money,
    #[serde(default)]
    pub discount_reason: Option<String>,
    #[serde(default)]
    pub delivery_charge: Money,
    pub tax_amount: Money,
    pub total: Money,

    #[serde(default, with = "rust_decimal::serde::float")]
    pub total_weight: Decimal,
    #[serde(default)]
    pub total_bags: u32,
    #[serde(default)]
    pub total_pieces: u32,

    pub promised_date: DateTime<Utc>,

    pub payment: Payment,

    #[serde(default)]
    pub notes: Option<String>,

    #[serde(default)]
    pub refund: Option<Refund>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn walk_in_name() -> String {
    WALK_IN_NAME.to_string()
}

/// Next order number after the highest one in use.
///
/// Numbering starts above [`ORDER_NUMBER_FLOOR`], so the first order is 3481.
pub fn next_order_number(highest: Option<u64>) -> u64 {
    highest.unwrap_or(0).max(ORDER_NUMBER_FLOOR) + 1
}

impl Order {
    /// Builds the order for a priced ticket.
    ///
    /// ## Errors
    /// - `TicketEmpty` when there is nothing to charge for
    /// - `CustomerNotConfirmed` when the customer step was skipped
    /// - `InvalidPayment` when the payment does not match the total
    pub fn from_ticket(
        ticket: &Ticket,
        totals: &TicketTotals,
        payment: Payment,
        operator: Option<&User>,
        now: DateTime<Utc>,
    ) -> CoreResult<Order> {
        if ticket.is_empty() {
            return Err(CoreError::TicketEmpty);
        }
        if !ticket.customer_confirmed {
            return Err(CoreError::CustomerNotConfirmed);
        }
        if payment.amount.rounded() != totals.total.rounded() {
            return Err(CoreError::InvalidPayment {
                reason: format!(
                    "payment {} does not match order total {}",
                    payment.amount, totals.total
                ),
            });
        }

        let customer_name = ticket
            .customer
            .as_ref()
            .map(Customer::display_name)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(walk_in_name);

        Ok(Order {
            id: Uuid::new_v4().to_string(),
            order_number: 0,
            customer: ticket.customer.clone(),
            customer_name,
            user_id: operator.map(|u| u.id.clone()),
            user_name: operator.map(|u| u.name.clone()),
            status: OrderStatus::Pending,
            is_express: ticket.is_express,
            items: ticket.items.clone(),
            subtotal: totals.subtotal,
            discount_amount: totals.discount_amount,
            discount_reason: ticket
                .manual_discount
                .as_ref()
                .filter(|_| totals.discount_amount.is_positive())
                .and_then(|d| d.reason.clone()),
            delivery_charge: totals.delivery_charge,
            tax_amount: totals.tax_amount,
            total: totals.total,
            total_weight: totals.total_weight,
            total_bags: totals.total_bags,
            total_pieces: totals.total_pieces,
            promised_date: totals.promised_date.with_timezone(&Utc),
            payment,
            notes: ticket.notes.clone(),
            refund: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// The persisted totals satisfy the order total identity.
    pub fn totals_consistent(&self) -> bool {
        self.total
            == self.subtotal - self.discount_amount + self.delivery_charge + self.tax_amount
    }

    pub fn is_walk_in(&self) -> bool {
        self.customer.is_none()
    }

    /// Moves the order to `to`, enforcing the workflow rules.
    pub fn set_status(&mut self, to: OrderStatus, now: DateTime<Utc>) -> CoreResult<()> {
        if to == OrderStatus::Refunded {
            // Refunds carry an amount; go through `refund`
            return self.refund(self.total, None, now);
        }
        self.transition(to)?;
        self.status = to;
        self.updated_at = now;
        Ok(())
    }

    /// Advances one workflow step and returns the new status.
    pub fn advance(&mut self, now: DateTime<Utc>) -> CoreResult<OrderStatus> {
        let next = self
            .status
            .next()
            .ok_or_else(|| self.transition_error(self.status))?;
        self.set_status(next, now)?;
        Ok(next)
    }

    pub fn cancel(&mut self, now: DateTime<Utc>) -> CoreResult<()> {
        self.set_status(OrderStatus::Cancelled, now)
    }

    /// Records a full or partial refund and marks the order refunded.
    pub fn refund(
        &mut self,
        amount: Money,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> CoreResult<()> {
        self.transition(OrderStatus::Refunded)?;
        validate_refund_amount(amount, self.total)?;
        self.refund = Some(Refund {
            amount,
            reason: reason
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty()),
            refunded_at: now,
        });
        self.status = OrderStatus::Refunded;
        self.updated_at = now;
        Ok(())
    }

    /// Amount given back to the customer.
    ///
    /// A refunded order with no recorded amount counts as a full refund.
    pub fn refund_amount(&self) -> Option<Money> {
        match &self.refund {
            Some(refund) if refund.amount.is_positive() => Some(refund.amount),
            _ if self.status == OrderStatus::Refunded => Some(self.total),
            _ => None,
        }
    }

    /// Hours left until the promised time; negative once it has passed.
    pub fn hours_until_due(&self, now: DateTime<Utc>) -> f64 {
        (self.promised_date - now).num_minutes() as f64 / 60.0
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status.is_open() && self.promised_date < now
    }

    /// Urgency for open orders; `None` once the order left the laundry.
    pub fn urgency(&self, now: DateTime<Utc>) -> Option<DueUrgency> {
        if !self.status.is_open() {
            return None;
        }
        let minutes_left = (self.promised_date - now).num_minutes();
        Some(if minutes_left < 0 {
            DueUrgency::Overdue
        } else if minutes_left < URGENT_WITHIN_HOURS * 60 {
            DueUrgency::Urgent
        } else {
            DueUrgency::OnTime
        })
    }

    fn transition(&self, to: OrderStatus) -> CoreResult<()> {
        if self.status.can_transition_to(to) {
            Ok(())
        } else {
            Err(self.transition_error(to))
        }
    }

    fn transition_error(&self, to: OrderStatus) -> CoreError {
        CoreError::InvalidStatusTransition {
            order_number: self.order_number,
            from: self.status.to_string(),
            to: to.to_string(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

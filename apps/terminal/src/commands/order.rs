//! # Order Commands
//!
//! Checkout at the counter and the order's life afterwards.
//!
//! ```text
//! checkout ──► Session::finalize ──► process_order_receipts
//!
//! advance_order   pending → washing → drying → folding → ready → completed
//! cancel_order    any step before completed ──► cancelled
//! refund_order    anything but cancelled    ──► refunded (full or partial)
//! ```

use chrono::{DateTime, Days, Duration, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info};
use washfold_core::closing::day_bounds;
use washfold_core::order::{kanban_board, DueUrgency};
use washfold_core::validation::{validate_cash_tendered, validate_refund_amount};
use washfold_core::{Money, Order, OrderStatus, Payment, PaymentMethod, WorkflowStage};
use washfold_store::OrderStore;

use crate::commands::receipt::{process_order_receipts, ReceiptOutcome};
use crate::error::{ApiError, ErrorCode};
use crate::printer::Printer;
use crate::state::{Session, StoreState, TerminalConfig};

/// Days of finished orders kept on the board next to the open ones.
const BOARD_DAYS: u64 = 7;

// =============================================================================
// Checkout
// =============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub order: Order,
    pub receipts: ReceiptOutcome,
}

/// Builds the payment for the current total.
///
/// Cash without a tendered amount is taken as exact change.
pub fn build_payment(
    method: PaymentMethod,
    total: Money,
    tendered: Option<Money>,
    reference: Option<String>,
) -> Result<Payment, ApiError> {
    let payment = match method {
        PaymentMethod::Cash => {
            let tendered = tendered.unwrap_or(total);
            validate_cash_tendered(tendered, total)?;
            Payment::cash(total, tendered)?
        }
        other => Payment::new(other, total),
    };
    Ok(match reference.filter(|r| !r.trim().is_empty()) {
        Some(reference) => payment.with_reference(reference.trim()),
        None => payment,
    })
}

/// Finalizes the session's ticket and runs the receipts.
///
/// A stored order is never rolled back: receipt problems come back in
/// `receipts` next to the saved order.
pub async fn checkout(
    session: &mut Session,
    payment: Payment,
    config: &TerminalConfig,
    stores: &StoreState,
    printer: &dyn Printer,
    now: DateTime<Utc>,
) -> Result<CheckoutResponse, ApiError> {
    debug!("checkout command");
    let tax_rate = session.settings().tax_rate;

    let order = session.finalize(payment, &*stores.orders, now).await?;
    let receipts =
        process_order_receipts(&order, config, tax_rate, printer, &*stores.documents).await;

    Ok(CheckoutResponse { order, receipts })
}

// =============================================================================
// Workflow
// =============================================================================

async fn find_order(orders: &dyn OrderStore, order_number: u64) -> Result<Order, ApiError> {
    orders
        .get_order_by_number(order_number)
        .await?
        .ok_or_else(|| ApiError::not_found("Order", &order_number.to_string()))
}

/// Moves an order one step along the workflow.
pub async fn advance_order(
    orders: &dyn OrderStore,
    order_number: u64,
    now: DateTime<Utc>,
) -> Result<Order, ApiError> {
    debug!(order_number, "advance_order command");
    let order = find_order(orders, order_number).await?;
    let next = order.status.next().ok_or_else(|| {
        ApiError::new(
            ErrorCode::BusinessLogic,
            format!("Order #{} is {}, nothing to advance", order_number, order.status.label()),
        )
    })?;

    let updated = orders.update_status(&order.id, next, now).await?;
    info!(order_number, from = %order.status, to = %updated.status, "Order advanced");
    Ok(updated)
}

pub async fn cancel_order(
    orders: &dyn OrderStore,
    order_number: u64,
    now: DateTime<Utc>,
) -> Result<Order, ApiError> {
    debug!(order_number, "cancel_order command");
    let order = find_order(orders, order_number).await?;
    let updated = orders
        .update_status(&order.id, OrderStatus::Cancelled, now)
        .await?;
    info!(order_number, "Order cancelled");
    Ok(updated)
}

/// Refunds `amount`, or the whole total when `None`.
pub async fn refund_order(
    orders: &dyn OrderStore,
    order_number: u64,
    amount: Option<Money>,
    reason: Option<String>,
    now: DateTime<Utc>,
) -> Result<Order, ApiError> {
    debug!(order_number, "refund_order command");
    let order = find_order(orders, order_number).await?;
    let amount = amount.unwrap_or(order.total);
    validate_refund_amount(amount, order.total)?;

    let updated = orders.record_refund(&order.id, amount, reason, now).await?;
    info!(order_number, amount = %amount, "Order refunded");
    Ok(updated)
}

// =============================================================================
// Board
// =============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardOrder {
    pub order_number: u64,
    pub customer_name: String,
    pub status: OrderStatus,
    pub is_express: bool,
    pub total: Money,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_weight: Decimal,
    pub promised_date: DateTime<Utc>,
    pub urgency: Option<DueUrgency>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardColumn {
    pub stage: WorkflowStage,
    pub title: String,
    pub orders: Vec<BoardOrder>,
}

/// The production board: every open order plus the last week's ready and
/// completed ones.
pub async fn order_board(
    orders: &dyn OrderStore,
    config: &TerminalConfig,
    now: DateTime<Utc>,
) -> Result<Vec<BoardColumn>, ApiError> {
    debug!("order_board command");
    let offset = config.utc_offset();
    let today = now.with_timezone(&offset).date_naive();
    let first_day = today
        .checked_sub_days(Days::new(BOARD_DAYS - 1))
        .unwrap_or(today);
    let (since, _) = day_bounds(first_day, offset);

    let mut board_orders = orders.list_open_orders().await?;
    for order in orders
        .list_orders(since, now + Duration::milliseconds(1))
        .await?
    {
        if !board_orders.iter().any(|o| o.id == order.id) {
            board_orders.push(order);
        }
    }

    Ok(kanban_board(&board_orders)
        .into_iter()
        .map(|column| BoardColumn {
            stage: column.stage,
            title: column.stage.title().to_string(),
            orders: column
                .orders
                .into_iter()
                .map(|o| BoardOrder {
                    order_number: o.order_number,
                    customer_name: o.customer_name.clone(),
                    status: o.status,
                    is_express: o.is_express,
                    total: o.total,
                    total_weight: o.total_weight,
                    promised_date: o.promised_date,
                    urgency: o.urgency(now),
                })
                .collect(),
        })
        .collect())
}

// =============================================================================
// Unit Tests
// =============================================================================

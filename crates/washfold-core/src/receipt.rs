//! # Receipt
//!
//! Renders a finalized [`Order`] as printable 80mm text. Every order prints
//! twice: the customer copy first, then the store copy.
//!
//! ## Differences Between Copies
//! ```text
//! ┌──────────────────────────────┬───────────┬────────────┐
//! │ Section                      │ Customer  │ Store      │
//! ├──────────────────────────────┼───────────┼────────────┤
//! │ Copy banner                  │ CLIENTE   │ TIENDA     │
//! │ Customer address             │     -     │     ✓      │
//! │ Discount reason              │     -     │     ✓      │
//! │ Order notes                  │     -     │     ✓      │
//! │ Footer                       │ Gracias   │ ARCHIVO    │
//! └──────────────────────────────┴───────────┴────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::layout::{date_time_es, format_kg, short_date_es, PrintFormat, TextBuilder};
use crate::money::TaxRate;
use crate::order::Order;
use crate::ticket::LineItem;
use crate::types::{PaymentMethod, StoreInfo};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum ReceiptCopy {
    #[default]
    Customer,
    Store,
}

impl ReceiptCopy {
    /// Print order: customer copy first.
    pub const BOTH: [ReceiptCopy; 2] = [ReceiptCopy::Customer, ReceiptCopy::Store];

    fn banner(&self) -> &'static str {
        match self {
            ReceiptCopy::Customer => "*** COPIA CLIENTE ***",
            ReceiptCopy::Store => "*** COPIA TIENDA ***",
        }
    }
}

/// Renders one copy of the receipt.
///
/// `tax_rate` only labels the ITBMS line; the amount comes from the order.
pub fn render_receipt(
    order: &Order,
    store: &StoreInfo,
    copy: ReceiptCopy,
    tax_rate: TaxRate,
    format: &PrintFormat,
) -> String {
    let mut out = TextBuilder::new(format.width);
    let money = |amount| format.money(amount);

    // Header
    out.blank();
    out.center(&store.name);
    if let Some(address) = store.address.as_deref().filter(|a| !a.trim().is_empty()) {
        out.center(address);
    }
    if let Some(phone) = store.phone.as_deref().filter(|p| !p.trim().is_empty()) {
        out.center(&format!("Tel: {}", phone.trim()));
    }
    if let Some(tax_id) = store.tax_id() {
        out.center(&format!("RUC: {}", tax_id));
    }
    out.blank();
    out.eq_sep();
    out.center(copy.banner());
    out.eq_sep();
    out.blank();

    // Order info
    let created = order.created_at.with_timezone(&format.utc_offset);
    out.pair("Orden:", &format!("#{}", order.order_number));
    out.pair("Fecha:", &date_time_es(created));
    out.blank();

    // Customer
    out.line("CLIENTE:");
    match &order.customer {
        Some(customer) => {
            out.indented("  ", &customer.display_name());
            if let Some(phone) = customer.phone_display() {
                out.indented("  ", &format!("Tel: {}", phone));
            }
            if copy == ReceiptCopy::Store {
                if let Some(address) = customer.address.as_deref().filter(|a| !a.trim().is_empty()) {
                    out.indented("  ", address.trim());
                }
            }
        }
        None => out.indented("  ", &order.customer_name),
    }
    out.blank();

    if order.is_express {
        out.center("*** SERVICIO EXPRESS ***");
        out.blank();
    }

    let promised = order.promised_date.with_timezone(&format.utc_offset);
    out.pair("Fecha Prometida:", &short_date_es(promised.date_naive()));
    out.blank();

    // Detail
    out.dash_sep();
    out.line("DETALLE:");
    out.dash_sep();
    for item in &order.items {
        render_item(&mut out, item, format);
    }
    out.dash_sep();

    // Totals
    out.pair("Subtotal:", &money(order.subtotal));
    if order.discount_amount.is_positive() {
        out.pair("Descuento:", &format!("-{}", money(order.discount_amount)));
        if copy == ReceiptCopy::Store {
            if let Some(reason) = order.discount_reason.as_deref() {
                out.indented("  ", &format!("({})", reason));
            }
        }
    }
    if order.delivery_charge.is_positive() {
        out.pair("Delivery:", &money(order.delivery_charge));
    }
    out.pair(
        &format!("ITBMS ({}%):", tax_rate.percentage()),
        &money(order.tax_amount),
    );
    out.dash_sep();
    out.pair("TOTAL:", &money(order.total));
    out.eq_sep();

    // Payment
    out.blank();
    let payment = &order.payment;
    out.pair("Método de Pago:", payment.method.receipt_label());
    if payment.method == PaymentMethod::Cash {
        if let Some(tendered) = payment.cash_tendered {
            out.pair("Efectivo:", &money(tendered));
            out.pair("Cambio:", &money(payment.change.unwrap_or_default()));
        }
    }
    if let Some(reference) = payment.reference.as_deref() {
        out.pair("Referencia:", reference);
    }

    if copy == ReceiptCopy::Store {
        if let Some(notes) = order.notes.as_deref() {
            out.blank();
            out.dash_sep();
            out.line("NOTAS:");
            for paragraph in notes.lines() {
                out.wrapped(paragraph);
            }
        }
    }

    // Footer
    out.blank();
    out.dash_sep();
    out.blank();
    match copy {
        ReceiptCopy::Customer => {
            out.center("¡Gracias por su preferencia!");
            out.blank();
            out.center("Conserve este recibo para");
            out.center("retirar su pedido.");
        }
        ReceiptCopy::Store => out.center("COPIA PARA ARCHIVO"),
    }
    // Feed before the cut
    out.blank();
    out.blank();
    out.blank();

    out.finish()
}

fn render_item(out: &mut TextBuilder, item: &LineItem, format: &PrintFormat) {
    match item {
        LineItem::Weight(weight) => {
            out.wrapped(&weight.name);
            out.item(
                &format!(
                    "  {}kg x {}/kg",
                    format_kg(item.total_weight()),
                    format.money(weight.unit_price)
                ),
                &format.money(item.line_total()),
            );
            if weight.entries.len() > 1 {
                for (i, entry) in weight.entries.iter().enumerate() {
                    out.line(format!("    Bolsa {}: {}kg", i + 1, entry.weight_kg.normalize()));
                }
            }
        }
        LineItem::Quantity(quantity) if quantity.quantity > 1 => {
            out.wrapped(&quantity.name);
            out.item(
                &format!("  {} x {}", quantity.quantity, format.money(quantity.unit_price)),
                &format.money(item.line_total()),
            );
        }
        LineItem::Quantity(quantity) => {
            out.item(&quantity.name, &format.money(item.line_total()));
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

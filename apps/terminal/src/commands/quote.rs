//! # Quote Command
//!
//! Prices the session's ticket without touching the store.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;
use washfold_core::layout::{date_time_es, format_kg, TextBuilder};
use washfold_core::{LineItem, Money, PrintFormat, TicketTotals};

use crate::state::Session;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteLine {
    pub name: String,
    /// `3 x B/2.50` or `4.50kg x B/1.25/kg (2 bolsas)`
    pub detail: String,
    pub line_total: Money,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    pub lines: Vec<QuoteLine>,
    pub is_express: bool,
    pub discount_reason: Option<String>,
    pub totals: TicketTotals,
}

pub fn quote(session: &Session, format: &PrintFormat, now: DateTime<Utc>) -> QuoteResponse {
    debug!("quote command");
    let ticket = session.ticket();

    let lines = ticket
        .items
        .iter()
        .map(|line| QuoteLine {
            name: line.name().to_string(),
            detail: line_detail(line, format),
            line_total: line.line_total(),
        })
        .collect();

    QuoteResponse {
        lines,
        is_express: ticket.is_express,
        discount_reason: ticket
            .manual_discount
            .as_ref()
            .and_then(|d| d.reason.clone()),
        totals: session.totals(now),
    }
}

fn line_detail(line: &LineItem, format: &PrintFormat) -> String {
    match line {
        LineItem::Quantity(item) => {
            format!("{} x {}", item.quantity, format.money(item.unit_price))
        }
        LineItem::Weight(item) => {
            let bags = item.entries.len();
            format!(
                "{}kg x {}/kg ({} {})",
                format_kg(line.total_weight()),
                format.money(item.unit_price),
                bags,
                if bags == 1 { "bolsa" } else { "bolsas" }
            )
        }
    }
}

impl QuoteResponse {
    /// Counter-screen summary, laid out like the receipt totals.
    pub fn to_text(&self, format: &PrintFormat) -> String {
        let mut out = TextBuilder::new(format.width);
        if self.is_express {
            out.center("*** EXPRESS ***");
        }
        for line in &self.lines {
            out.item(&line.name, &format.money(line.line_total));
            out.indented("  ", &line.detail);
        }
        out.dash_sep();

        let totals = &self.totals;
        out.pair("Subtotal:", &format.money(totals.subtotal));
        if totals.discount_amount.is_positive() {
            out.pair("Descuento:", &format!("-{}", format.money(totals.discount_amount)));
        }
        if totals.delivery_charge.is_positive() {
            out.pair("Delivery:", &format.money(totals.delivery_charge));
        }
        out.pair("ITBMS:", &format.money(totals.tax_amount));
        out.eq_sep();
        out.pair("TOTAL:", &format.money(totals.total));
        out.eq_sep();
        out.pair("Fecha Prometida:", &date_time_es(totals.promised_date));
        out.finish()
    }
}

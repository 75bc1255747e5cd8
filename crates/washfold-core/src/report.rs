//! # Closing Report
//!
//! Printable text for a [`DailyClosing`]. Sections appear in this order and
//! the per-user blocks are skipped when empty:
//!
//! ```text
//! header (store, CIERRE DEL DÍA, long date)
//! RESUMEN DE VENTAS
//! VENTAS POR MÉTODO DE PAGO          non-zero methods only
//! RECONCILIACIÓN DE CAJA             DIFERENCIA: +B/0.00 (CUADRA)
//! DESCUENTOS POR USUARIO             optional
//! REEMBOLSOS POR USUARIO             optional
//! RESUMEN POR USUARIO                optional
//! NOTAS                              optional
//! footer (closed at / by)
//! ```

use rust_decimal::Decimal;

use crate::closing::{ClosingState, DailyClosing, UserAttribution};
use crate::layout::{long_date_es, PrintFormat, TextBuilder};
use crate::types::StoreInfo;

pub fn render_closing_report(closing: &DailyClosing, store: &StoreInfo, format: &PrintFormat) -> String {
    let report = &closing.report;
    let money = |amount| format.money(amount);
    let mut out = TextBuilder::new(format.width);

    out.blank();
    out.center(&store.name);
    out.center("CIERRE DEL DÍA");
    out.blank();
    out.eq_sep();
    out.center(&long_date_es(report.date));
    out.eq_sep();
    out.blank();

    out.line("RESUMEN DE VENTAS");
    out.dash_sep();
    out.pair("Total de Órdenes:", &report.order_count.to_string());
    out.pair("Ventas Brutas:", &money(report.total_sales));
    out.pair("Descuentos:", &format!("-{}", money(report.total_discounts)));
    out.pair("Reembolsos:", &format!("-{}", money(report.total_refunds)));
    out.dash_sep();
    out.pair("VENTAS NETAS:", &money(report.net_sales));
    out.blank();

    out.line("VENTAS POR MÉTODO DE PAGO");
    out.dash_sep();
    for (method, amount) in &report.sales_by_method {
        if amount.is_positive() {
            out.pair(&format!("  {}:", method.report_label()), &money(*amount));
        }
    }
    out.blank();

    out.line("RECONCILIACIÓN DE CAJA");
    out.dash_sep();
    out.pair("Balance Apertura:", &money(report.opening_balance));
    out.pair("+ Ventas Efectivo:", &money(report.cash_sales));
    if report.cash_refunds.is_positive() {
        out.pair("- Reembolsos Efectivo:", &money(report.cash_refunds));
    }
    out.pair("Efectivo Esperado:", &money(report.expected_cash));
    out.pair("Efectivo Contado:", &money(report.counted_cash));
    out.dash_sep();
    let variance = if report.variance.rounded() < Decimal::ZERO {
        money(report.variance)
    } else {
        format!("+{}", money(report.variance))
    };
    out.pair(
        "DIFERENCIA:",
        &format!("{} ({})", variance, report.variance_status.label()),
    );
    out.blank();

    if !report.discounts_by_user.is_empty() {
        out.line("DESCUENTOS POR USUARIO");
        out.dash_sep();
        attribution_block(&mut out, &report.discounts_by_user, format, false);
        out.blank();
    }

    if !report.refunds_by_user.is_empty() {
        out.line("REEMBOLSOS POR USUARIO");
        out.dash_sep();
        attribution_block(&mut out, &report.refunds_by_user, format, true);
        out.blank();
    }

    if !report.activity_by_user.is_empty() {
        out.line("RESUMEN POR USUARIO");
        out.dash_sep();
        for user in &report.activity_by_user {
            out.indented("  ", &user.user_name);
            out.line(format!(
                "    Órdenes: {} | Ventas: {}",
                user.orders,
                money(user.sales)
            ));
            if user.discounts.is_positive() || user.refunds.is_positive() {
                out.line(format!(
                    "    Desc: -{} | Reemb: -{}",
                    money(user.discounts),
                    money(user.refunds)
                ));
            }
        }
        out.blank();
    }

    if let Some(notes) = closing.notes.as_deref() {
        out.line("NOTAS");
        out.dash_sep();
        for paragraph in notes.lines() {
            out.wrapped(paragraph);
        }
        out.blank();
    }

    out.eq_sep();
    if let ClosingState::Closed { closed_at, closed_by } = &closing.state {
        let local = closed_at.with_timezone(&format.utc_offset);
        out.center(&format!("Cerrado: {}", local.format("%m/%d/%Y, %I:%M:%S %p")));
        out.center(&format!("Por: {}", closed_by));
    }
    out.blank();
    out.center("*** FIN DEL REPORTE ***");
    out.blank();
    out.blank();
    out.blank();

    out.finish()
}

fn attribution_block(
    out: &mut TextBuilder,
    users: &[UserAttribution],
    format: &PrintFormat,
    with_reason: bool,
) {
    for user in users {
        out.pair(&format!("  {}:", user.user_name), &format.money(user.total));
        for detail in &user.details {
            out.line(format!(
                "    #{}: -{}",
                detail.order_number,
                format.money(detail.amount)
            ));
            if with_reason {
                out.indented("      ", &format!("Razón: {}", detail.reason));
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::closing::{compute_daily_closing, CashCount, Denomination};
    use crate::money::Money;
    use crate::order::tests::sample_order;
    use crate::order::{Order, OrderStatus};
    use crate::types::PaymentMethod;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    fn orders() -> Vec<Order> {
        let mut cash = sample_order(150, PaymentMethod::Cash);
        cash.user_id = Some("u-1".into());
        cash.user_name = Some("María".into());
        cash.discount_amount = Money::from_units(5);

        let mut card = sample_order(80, PaymentMethod::Card);
        card.order_number = 3482;
        card.user_id = Some("u-1".into());
        card.user_name = Some("María".into());

        let mut refunded = sample_order(20, PaymentMethod::Cash);
        refunded.order_number = 3483;
        refunded.status = OrderStatus::Refunded;
        vec![cash, card, refunded]
    }

    fn closing() -> DailyClosing {
        let count = CashCount::new()
            .with(Denomination::Bill100, 2)
            .with(Denomination::Bill20, 1)
            .with(Denomination::Bill5, 1);
        let format = PrintFormat::default();
        let report = compute_daily_closing(&orders(), day(), format.utc_offset, Money::from_units(100), &count, &[]);
        DailyClosing::open(report, count, Some("Faltó cambio en la mañana".into()))
    }

    fn render(closing: &DailyClosing) -> String {
        render_closing_report(closing, &StoreInfo::default(), &PrintFormat::default())
    }

    fn line<'a>(text: &'a str, label: &str) -> &'a str {
        text.lines()
            .find(|l| l.starts_with(label))
            .unwrap_or_else(|| panic!("missing {label}"))
    }

    #[test]
    fn test_report_sections() {
        let text = render(&closing());
        assert!(text.contains("CIERRE DEL DÍA"));
        assert!(text.contains("viernes, 15 de marzo de 2024"));
        assert!(line(&text, "Total de Órdenes:").ends_with(" 3"));
        assert!(line(&text, "Ventas Brutas:").ends_with("B/250.00"));
        assert!(line(&text, "Descuentos:").ends_with("-B/5.00"));
        assert!(line(&text, "Reembolsos:").ends_with("-B/20.00"));
        assert!(line(&text, "VENTAS NETAS:").ends_with("B/230.00"));
        assert!(line(&text, "  Tarjeta:").ends_with("B/80.00"));
        assert!(!text.contains("  Yappy:"));
        assert!(text.contains("*** FIN DEL REPORTE ***"));
        assert!(text.contains("NOTAS\n"));
    }

    #[test]
    fn test_reconciliation_lines() {
        let text = render(&closing());
        // 100 + 170 cash - 20 refund = 250 expected, 225 counted
        assert!(line(&text, "+ Ventas Efectivo:").ends_with("B/170.00"));
        assert!(line(&text, "- Reembolsos Efectivo:").ends_with("B/20.00"));
        assert!(line(&text, "Efectivo Esperado:").ends_with("B/250.00"));
        assert!(line(&text, "Efectivo Contado:").ends_with("B/225.00"));
        assert!(line(&text, "DIFERENCIA:").ends_with("B/-25.00 (REVISAR)"));
    }

    #[test]
    fn test_balanced_variance_gets_plus_sign() {
        let count = CashCount::new().with(Denomination::Bill100, 1);
        let report = compute_daily_closing(&[], day(), PrintFormat::default().utc_offset, Money::from_units(100), &count, &[]);
        let text = render(&DailyClosing::open(report, count, None));
        assert!(line(&text, "DIFERENCIA:").ends_with("+B/0.00 (CUADRA)"));
        assert!(!text.contains("RESUMEN POR USUARIO"));
        assert!(!text.contains("NOTAS"));
    }

    #[test]
    fn test_user_sections() {
        let text = render(&closing());
        assert!(text.contains("DESCUENTOS POR USUARIO"));
        assert!(text.contains("    #3481: -B/5.00"));
        assert!(text.contains("REEMBOLSOS POR USUARIO"));
        assert!(text.contains("    #3483: -B/20.00"));
        assert!(text.contains("      Razón: Sin especificar"));
        assert!(text.contains("    Órdenes: 2 | Ventas: B/230.00"));
        assert!(text.contains("    Desc: -B/5.00 | Reemb: -B/0.00"));
    }

    #[test]
    fn test_closed_footer() {
        let mut closing = closing();
        let closed_at = Utc.with_ymd_and_hms(2024, 3, 16, 1, 15, 0).unwrap();
        closing.close("María", closed_at, true).unwrap();
        let text = render(&closing);
        assert!(text.contains("Cerrado: 03/15/2024, 08:15:00 PM"));
        assert!(text.contains("Por: María"));
        for l in text.lines() {
            assert!(l.chars().count() <= 48, "overflow: {l:?}");
        }
    }

    #[test]
    fn test_long_operator_names_wrap() {
        let long_name = "María Fernanda de los Ángeles Gutiérrez Castillo";
        let mut orders = orders();
        for order in orders.iter_mut() {
            order.user_id = Some("u-9".into());
            order.user_name = Some(long_name.into());
        }
        let count = CashCount::new().with(Denomination::Bill100, 2);
        let report = compute_daily_closing(&orders, day(), PrintFormat::default().utc_offset, Money::from_units(100), &count, &[]);
        let mut closing = DailyClosing::open(report, count, None);
        let closed_at = Utc.with_ymd_and_hms(2024, 3, 16, 1, 15, 0).unwrap();
        closing.close(long_name, closed_at, true).unwrap();

        let text = render(&closing);
        assert!(text.contains("RESUMEN POR USUARIO"));
        assert!(text.contains("  María Fernanda"));
        for l in text.lines() {
            assert!(l.chars().count() <= 48, "overflow: {l:?}");
        }
    }

    #[test]
    fn test_report_output_is_byte_identical_for_same_inputs() {
        assert_eq!(render(&closing()), render(&closing()));
    }
}

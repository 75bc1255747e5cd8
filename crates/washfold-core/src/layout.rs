//! # Text Layout
//!
//! Fixed-width helpers for 80mm thermal paper (48 columns, Font A). The
//! receipt and the closing report are both built from these.
//!
//! Widths count `char`s, not bytes, so `Órdenes` or `ñ` take one column.
//!
//! ```text
//! ================================================   separator('=')
//!                  WASH & FOLD                       center
//! Subtotal:                                B/20.00   label_value
//! Lavado y doblado con suavizante              ┐
//! hipoalergénico                     B/12.50   ┘     line_item (wrapped)
//! ```

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Offset, Utc, Weekday};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::money::Money;
use crate::{DEFAULT_CURRENCY_PREFIX, PAPER_WIDTH};

/// Panama, UTC-05:00, no daylight saving.
pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = -300;

// =============================================================================
// Print Format
// =============================================================================

/// Paper and locale settings shared by every printed document.
#[derive(Debug, Clone, PartialEq)]
pub struct PrintFormat {
    pub width: usize,
    pub currency_prefix: String,
    pub utc_offset: FixedOffset,
}

impl PrintFormat {
    /// Builds a format from an offset in minutes east of UTC (Panama is -300).
    /// Out-of-range offsets fall back to UTC.
    pub fn new(width: usize, currency_prefix: impl Into<String>, utc_offset_minutes: i32) -> Self {
        PrintFormat {
            width,
            currency_prefix: currency_prefix.into(),
            utc_offset: offset_from_minutes(utc_offset_minutes),
        }
    }

    pub fn money(&self, amount: Money) -> String {
        format_currency(amount, &self.currency_prefix)
    }
}

impl Default for PrintFormat {
    fn default() -> Self {
        PrintFormat::new(PAPER_WIDTH, DEFAULT_CURRENCY_PREFIX, DEFAULT_UTC_OFFSET_MINUTES)
    }
}

pub fn offset_from_minutes(minutes: i32) -> FixedOffset {
    FixedOffset::east_opt(minutes.saturating_mul(60)).unwrap_or_else(|| Utc.fix())
}

// =============================================================================
// Line Helpers
// =============================================================================

fn width_of(text: &str) -> usize {
    text.chars().count()
}

/// Left-pads `text` so it sits in the middle of the line. Never pads the
/// right side.
pub fn center(text: &str, width: usize) -> String {
    let padding = width.saturating_sub(width_of(text)) / 2;
    format!("{}{}", " ".repeat(padding), text)
}

pub fn right_align(text: &str, width: usize) -> String {
    let padding = width.saturating_sub(width_of(text));
    format!("{}{}", " ".repeat(padding), text)
}

pub fn separator(ch: char, width: usize) -> String {
    std::iter::repeat(ch).take(width).collect()
}

/// `label` left, `value` right, at least one space between them.
pub fn label_value(label: &str, value: &str, width: usize) -> String {
    let spaces = width
        .saturating_sub(width_of(label) + width_of(value))
        .max(1);
    format!("{}{}{}", label, " ".repeat(spaces), value)
}

/// A description with its price right-aligned on the last line.
///
/// Descriptions longer than the space left by the price wrap onto further
/// lines; leading indentation is kept on every wrapped line.
pub fn line_item(description: &str, price: &str, width: usize) -> Vec<String> {
    let budget = width.saturating_sub(width_of(price) + 1).max(1);
    if width_of(description) <= budget {
        return vec![label_value(description, price, width)];
    }

    let trimmed = description.trim_start_matches(' ');
    let indent = &description[..description.len() - trimmed.len()];
    let inner = budget.saturating_sub(indent.len()).max(1);

    let mut lines: Vec<String> = word_wrap(trimmed, inner)
        .into_iter()
        .map(|line| format!("{}{}", indent, line))
        .collect();
    match lines.pop() {
        Some(last) => lines.push(label_value(&last, price, width)),
        None => lines.push(right_align(price, width)),
    }
    lines
}

/// Greedy word wrap. Words longer than the line are split.
pub fn word_wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split(' ').filter(|w| !w.is_empty()) {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let rest = word.split_off(width);
            lines.push(word.into_iter().collect());
            word = rest;
        }
        let word: String = word.into_iter().collect();
        if word.is_empty() {
            continue;
        }

        let needed = if current.is_empty() {
            width_of(&word)
        } else {
            width_of(&current) + 1 + width_of(&word)
        };
        if needed <= width {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(&word);
        } else {
            lines.push(std::mem::replace(&mut current, word));
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// `B/12.50`. Rounded half-up to two decimals.
pub fn format_currency(amount: Money, prefix: &str) -> String {
    amount.format_with(prefix)
}

/// Weight with two decimals, half-up: `4.25`.
pub fn format_kg(weight: Decimal) -> String {
    let mut rounded = weight.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded.to_string()
}

// =============================================================================
// Spanish Dates
// =============================================================================

const MONTHS: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "lunes",
        Weekday::Tue => "martes",
        Weekday::Wed => "miércoles",
        Weekday::Thu => "jueves",
        Weekday::Fri => "viernes",
        Weekday::Sat => "sábado",
        Weekday::Sun => "domingo",
    }
}

fn month_name(date: NaiveDate) -> &'static str {
    MONTHS[date.month0() as usize]
}

fn abbreviate(word: &str) -> String {
    word.chars().take(3).collect()
}

/// `viernes, 15 de marzo de 2024`
pub fn long_date_es(date: NaiveDate) -> String {
    format!(
        "{}, {} de {} de {}",
        weekday_name(date.weekday()),
        date.day(),
        month_name(date),
        date.year()
    )
}

/// `vie, 15 mar`
pub fn short_date_es(date: NaiveDate) -> String {
    format!(
        "{}, {} {}",
        abbreviate(weekday_name(date.weekday())),
        date.day(),
        abbreviate(month_name(date))
    )
}

/// `03/15/2024 09:30 AM`, the way Panamanian registers print it.
pub fn date_time_es(at: DateTime<FixedOffset>) -> String {
    at.format("%m/%d/%Y %I:%M %p").to_string()
}

// =============================================================================
// Text Builder
// =============================================================================

/// Accumulates the lines of one printed document.
#[derive(Debug, Clone)]
pub struct TextBuilder {
    lines: Vec<String>,
    width: usize,
}

impl TextBuilder {
    pub fn new(width: usize) -> Self {
        TextBuilder {
            lines: Vec::new(),
            width,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn blank(&mut self) {
        self.lines.push(String::new());
    }

    pub fn line(&mut self, text: impl Into<String>) {
        self.lines.push(text.into());
    }

    /// Word-wrapped free text, e.g. notes or an address.
    pub fn wrapped(&mut self, text: &str) {
        let lines = word_wrap(text, self.width);
        self.lines.extend(lines);
    }

    /// Word-wrapped text with `indent` in front of every line.
    pub fn indented(&mut self, indent: &str, text: &str) {
        let inner = self.width.saturating_sub(width_of(indent));
        for line in word_wrap(text, inner) {
            self.lines.push(format!("{}{}", indent, line));
        }
    }

    pub fn center(&mut self, text: &str) {
        for line in word_wrap(text, self.width) {
            self.lines.push(center(&line, self.width));
        }
    }

    pub fn right(&mut self, text: &str) {
        for line in word_wrap(text, self.width) {
            self.lines.push(right_align(&line, self.width));
        }
    }

    pub fn eq_sep(&mut self) {
        self.lines.push(separator('=', self.width));
    }

    pub fn dash_sep(&mut self) {
        self.lines.push(separator('-', self.width));
    }

    /// Label/value pair. When both do not fit on one line the value moves
    /// to its own right-aligned line.
    pub fn pair(&mut self, label: &str, value: &str) {
        if width_of(label) + 1 + width_of(value) <= self.width {
            self.lines.push(label_value(label, value, self.width));
        } else {
            self.wrapped(label);
            self.right(value);
        }
    }

    pub fn item(&mut self, description: &str, price: &str) {
        let lines = line_item(description, price, self.width);
        self.lines.extend(lines);
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn finish(self) -> String {
        self.lines.join("\n")
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    #[test]
    fn test_center_pads_left_only() {
        assert_eq!(center("ABCD", 10), "   ABCD");
        assert_eq!(center("ABC", 10), "   ABC");
        assert_eq!(center(&"x".repeat(60), 48), "x".repeat(60));
        // Accented characters count as one column
        assert_eq!(center("CIERRE DEL DÍA", 20), "   CIERRE DEL DÍA");
    }

    #[test]
    fn test_right_align_and_separator() {
        assert_eq!(right_align("B/5.00", 10), "    B/5.00");
        assert_eq!(separator('=', 5), "=====");
    }

    #[test]
    fn test_label_value_fills_width() {
        let line = label_value("Subtotal:", "B/20.00", 48);
        assert_eq!(line.chars().count(), 48);
        assert!(line.starts_with("Subtotal:"));
        assert!(line.ends_with("B/20.00"));

        let tight = label_value("Método de Pago:", "Factura a Crédito", 20);
        assert_eq!(tight, "Método de Pago: Factura a Crédito");
    }

    #[test]
    fn test_line_item_wraps_long_descriptions() {
        let description = "Lavado y doblado especial con suavizante hipoalergénico";
        let lines = line_item(description, "B/12.50", 48);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(line.chars().count() <= 48, "overflow: {line:?}");
        }
        assert!(lines.last().unwrap().ends_with("B/12.50"));
        let rejoined: Vec<&str> = lines.iter().flat_map(|l| l.split_whitespace()).collect();
        assert_eq!(rejoined.last(), Some(&"B/12.50"));
        assert_eq!(rejoined.len(), description.split(' ').count() + 1);
    }

    #[test]
    fn test_line_item_keeps_indent() {
        let lines = line_item("  3 x B/10.00 camisas de vestir planchadas", "B/30.00", 30);
        assert!(lines.iter().all(|l| l.starts_with("  ")));
        assert!(lines.iter().all(|l| l.chars().count() <= 30));
    }

    #[test]
    fn test_word_wrap_splits_long_words() {
        assert_eq!(word_wrap("uno dos tres", 7), vec!["uno dos", "tres"]);
        assert_eq!(word_wrap("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
        assert!(word_wrap("   ", 10).is_empty());
    }

    #[test]
    fn test_currency_and_weight_format() {
        assert_eq!(format_currency(Money::new(dec!(12.5)), "B/"), "B/12.50");
        assert_eq!(format_currency(Money::new(dec!(0.005)), "$"), "$0.01");
        assert_eq!(format_kg(dec!(4.125)), "4.13");
        assert_eq!(format_kg(dec!(3)), "3.00");
    }

    #[test]
    fn test_spanish_dates() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        assert_eq!(long_date_es(date), "viernes, 15 de marzo de 2024");
        assert_eq!(short_date_es(date), "vie, 15 mar");

        let at = offset_from_minutes(-300)
            .with_ymd_and_hms(2024, 3, 15, 14, 5, 0)
            .unwrap();
        assert_eq!(date_time_es(at), "03/15/2024 02:05 PM");
    }

    #[test]
    fn test_builder_pair_overflow_moves_value() {
        let mut builder = TextBuilder::new(20);
        builder.pair("Total de Órdenes:", "12");
        builder.pair("Balance de apertura de caja:", "B/100.00");
        let text = builder.finish();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0].chars().count(), 20);
        assert_eq!(lines.last().unwrap(), &"            B/100.00");
    }

    #[test]
    fn test_default_format() {
        let format = PrintFormat::default();
        assert_eq!(format.width, 48);
        assert_eq!(format.utc_offset.local_minus_utc(), -5 * 3600);
        assert_eq!(format.money(Money::from_cents(1250)), "B/12.50");
        assert_eq!(offset_from_minutes(100_000).local_minus_utc(), 0);
    }
}

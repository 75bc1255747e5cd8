//! # Ticket Module
//!
//! The in-progress order at the counter and the calculator that prices it.
//!
//! ## Ticket Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Ticket Lifecycle                                │
//! │                                                                         │
//! │   Ticket::new() ──► add_product / add_weighed / update / remove        │
//! │        ▲                     │                                          │
//! │        │                     ▼                                          │
//! │        │          set_customer / confirm_walk_in / set_express          │
//! │        │          set_manual_discount / set_delivery / set_notes        │
//! │        │                     │                                          │
//! │        │                     ▼                                          │
//! │        │          TicketTotals::compute(ticket, settings, now)          │
//! │        │          (recomputed on every read, never cached)              │
//! │        │                     │                                          │
//! │        │                     ▼                                          │
//! │        └──── clear() ◄── Order::from_ticket + payment                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Totals Composition
//! ```text
//! subtotal        = Σ line_total
//! discount        = clamp(percentage of subtotal | amount, 0, subtotal)
//! after_discount  = subtotal − discount
//! taxable_amount  = after_discount + delivery_charge
//! tax_amount      = taxable_amount × rate
//! total           = after_discount + delivery_charge + tax_amount
//! ```
//!
//! Nothing is rounded here; see [`crate::money`].

use chrono::{DateTime, Days, FixedOffset, TimeZone};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{Customer, PricingMode, Product, ServiceSettings};
use crate::validation::{
    validate_discount_amount, validate_discount_percentage, validate_notes, validate_quantity,
    validate_weight_kg, ValidationResult,
};
use crate::{MAX_ITEM_QUANTITY, MAX_TICKET_ITEMS};

/// Hour of day at which every promised date is fixed.
const PROMISED_HOUR: u32 = 12;

// =============================================================================
// Weight Entry
// =============================================================================

/// One weighed bag of laundry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct WeightEntry {
    #[serde(with = "rust_decimal::serde::float")]
    #[ts(type = "number")]
    pub weight_kg: Decimal,

    /// Piece count, when the operator counted the bag.
    #[serde(default)]
    pub pieces: Option<u32>,

    /// Weighed wet (e.g. rejected from the dryer).
    #[serde(default)]
    pub wet: bool,

    #[serde(default)]
    pub note: Option<String>,
}

impl WeightEntry {
    /// Creates a dry bag entry.
    ///
    /// ## Errors
    /// Weight must be positive and within the scale's range.
    pub fn new(weight_kg: Decimal) -> ValidationResult<Self> {
        validate_weight_kg(weight_kg)?;
        Ok(WeightEntry {
            weight_kg,
            pieces: None,
            wet: false,
            note: None,
        })
    }

    pub fn with_pieces(mut self, pieces: u32) -> Self {
        self.pieces = Some(pieces);
        self
    }

    pub fn wet(mut self) -> Self {
        self.wet = true;
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

// =============================================================================
// Line Items
// =============================================================================

/// A quantity-priced line: `quantity × unit_price`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantityItem {
    pub product_id: String,
    pub name: String,
    /// Frozen when the line was added.
    pub unit_price: Money,
    pub quantity: u32,
}

/// A weight-priced line: `Σ entry weight × unit_price` (price per kg).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightItem {
    pub product_id: String,
    pub name: String,
    /// Price per kg, frozen when the line was added.
    pub unit_price: Money,
    pub entries: Vec<WeightEntry>,
}

/// One line on a ticket or order.
///
/// Derived figures (`line_total`, `total_weight`, `bags`, `pieces`) are
/// always computed from the inputs, so they can never go stale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "pricing_mode", rename_all = "snake_case")]
pub enum LineItem {
    Quantity(QuantityItem),
    Weight(WeightItem),
}

impl LineItem {
    /// A new quantity line for `product` with quantity 1.
    pub fn for_quantity(product: &Product, is_express: bool) -> CoreResult<Self> {
        expect_mode(product, PricingMode::Quantity)?;
        Ok(LineItem::Quantity(QuantityItem {
            product_id: product.id.clone(),
            name: product.name.clone(),
            unit_price: product.unit_price(is_express),
            quantity: 1,
        }))
    }

    /// A new weight line for `product` with the given bags.
    pub fn for_weight(
        product: &Product,
        is_express: bool,
        entries: Vec<WeightEntry>,
    ) -> CoreResult<Self> {
        expect_mode(product, PricingMode::Weight)?;
        if entries.is_empty() {
            return Err(ValidationError::Required {
                field: "weight entries".to_string(),
            }
            .into());
        }
        for entry in &entries {
            validate_weight_kg(entry.weight_kg)?;
        }
        Ok(LineItem::Weight(WeightItem {
            product_id: product.id.clone(),
            name: product.name.clone(),
            unit_price: product.unit_price(is_express),
            entries,
        }))
    }

    pub fn product_id(&self) -> &str {
        match self {
            LineItem::Quantity(item) => &item.product_id,
            LineItem::Weight(item) => &item.product_id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            LineItem::Quantity(item) => &item.name,
            LineItem::Weight(item) => &item.name,
        }
    }

    pub fn pricing_mode(&self) -> PricingMode {
        match self {
            LineItem::Quantity(_) => PricingMode::Quantity,
            LineItem::Weight(_) => PricingMode::Weight,
        }
    }

    pub fn unit_price(&self) -> Money {
        match self {
            LineItem::Quantity(item) => item.unit_price,
            LineItem::Weight(item) => item.unit_price,
        }
    }

    pub fn line_total(&self) -> Money {
        match self {
            LineItem::Quantity(item) => item.unit_price * item.quantity,
            LineItem::Weight(item) => item.unit_price * self.total_weight(),
        }
    }

    /// Kilograms on this line; zero for quantity lines.
    pub fn total_weight(&self) -> Decimal {
        match self {
            LineItem::Quantity(_) => Decimal::ZERO,
            LineItem::Weight(item) => item.entries.iter().map(|e| e.weight_kg).sum(),
        }
    }

    /// Bags on this line; zero for quantity lines.
    pub fn bags(&self) -> usize {
        match self {
            LineItem::Quantity(_) => 0,
            LineItem::Weight(item) => item.entries.len(),
        }
    }

    /// Quantity for quantity lines, counted pieces for weight lines.
    pub fn pieces(&self) -> u32 {
        match self {
            LineItem::Quantity(item) => item.quantity,
            LineItem::Weight(item) => item.entries.iter().filter_map(|e| e.pieces).sum(),
        }
    }
}

fn expect_mode(product: &Product, expected: PricingMode) -> CoreResult<()> {
    if product.pricing_mode == expected {
        Ok(())
    } else {
        Err(CoreError::PricingModeMismatch {
            product: product.name.clone(),
            expected: expected.to_string(),
            actual: product.pricing_mode.to_string(),
        })
    }
}

// =============================================================================
// Manual Discount
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum DiscountKind {
    /// `value` is a percentage in (0, 100].
    Percentage,
    /// `value` is an amount in Balboas.
    Amount,
}

/// The single operator-entered discount a ticket may carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ManualDiscount {
    #[serde(rename = "type")]
    pub kind: DiscountKind,

    #[serde(with = "rust_decimal::serde::float")]
    #[ts(type = "number")]
    pub value: Decimal,

    #[serde(default)]
    pub reason: Option<String>,
}

impl ManualDiscount {
    /// A percentage discount; `percent` must be in (0, 100].
    pub fn percentage(percent: Decimal, reason: Option<String>) -> ValidationResult<Self> {
        validate_discount_percentage(percent)?;
        Ok(ManualDiscount {
            kind: DiscountKind::Percentage,
            value: percent,
            reason: clean_reason(reason),
        })
    }

    /// A fixed-amount discount; must be positive. The upper bound (the
    /// subtotal) is checked when it is applied to a ticket.
    pub fn amount(amount: Money, reason: Option<String>) -> ValidationResult<Self> {
        if !amount.is_positive() {
            return Err(ValidationError::MustBePositive {
                field: "discount amount".to_string(),
            });
        }
        Ok(ManualDiscount {
            kind: DiscountKind::Amount,
            value: amount.amount(),
            reason: clean_reason(reason),
        })
    }

    /// Discount on `subtotal`, clamped to `[0, subtotal]`.
    ///
    /// Clamps instead of failing so a stale discount never blocks the
    /// counter (e.g. after a line is removed below the discount amount).
    pub fn amount_for(&self, subtotal: Money) -> Money {
        let raw = match self.kind {
            DiscountKind::Percentage => subtotal.percentage(self.value),
            DiscountKind::Amount => Money::new(self.value),
        };
        raw.clamp_to(Money::zero(), subtotal.max(Money::zero()))
    }
}

fn clean_reason(reason: Option<String>) -> Option<String> {
    reason
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
}

// =============================================================================
// Ticket
// =============================================================================

/// The order being built at the counter.
///
/// ## Invariants
/// - Quantity lines are unique by product id (adding again increments)
/// - Weight lines never merge: each call to `add_weighed` is a new line
/// - At most [`MAX_TICKET_ITEMS`] lines, at most [`MAX_ITEM_QUANTITY`] per line
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub items: Vec<LineItem>,

    pub customer: Option<Customer>,

    /// `false` until the operator either picks a customer or confirms the
    /// ticket is for a walk-in. `customer == None && customer_confirmed`
    /// means walk-in.
    #[serde(default)]
    pub customer_confirmed: bool,

    #[serde(default)]
    pub is_express: bool,

    #[serde(default)]
    pub manual_discount: Option<ManualDiscount>,

    /// Delivery service, charged at its catalog price.
    #[serde(default)]
    pub delivery: Option<Product>,

    #[serde(default)]
    pub notes: Option<String>,
}

impl Ticket {
    pub fn new() -> Self {
        Ticket::default()
    }

    /// Adds one unit of a quantity-priced product.
    ///
    /// ## Behavior
    /// - Product already on the ticket: quantity + 1
    /// - Otherwise: new line at the current express/regular price
    pub fn add_product(&mut self, product: &Product) -> CoreResult<()> {
        expect_mode(product, PricingMode::Quantity)?;

        let existing = self.items.iter_mut().find_map(|line| match line {
            LineItem::Quantity(item) if item.product_id == product.id => Some(item),
            _ => None,
        });

        if let Some(item) = existing {
            let requested = item.quantity.saturating_add(1);
            if requested > MAX_ITEM_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested,
                    max: MAX_ITEM_QUANTITY,
                });
            }
            item.quantity = requested;
            return Ok(());
        }

        self.ensure_room()?;
        self.items
            .push(LineItem::for_quantity(product, self.is_express)?);
        Ok(())
    }

    /// Adds a new weight line with the bags weighed in one session.
    ///
    /// Returns the position of the new line.
    pub fn add_weighed(&mut self, product: &Product, entries: Vec<WeightEntry>) -> CoreResult<usize> {
        self.ensure_room()?;
        let line = LineItem::for_weight(product, self.is_express, entries)?;
        self.items.push(line);
        Ok(self.items.len() - 1)
    }

    /// Appends another bag to an existing weight line.
    pub fn add_weight_entry(&mut self, index: usize, entry: WeightEntry) -> CoreResult<()> {
        validate_weight_kg(entry.weight_kg)?;
        match self.items.get_mut(index) {
            Some(LineItem::Weight(item)) => {
                item.entries.push(entry);
                Ok(())
            }
            Some(LineItem::Quantity(item)) => Err(CoreError::PricingModeMismatch {
                product: item.name.clone(),
                expected: PricingMode::Weight.to_string(),
                actual: PricingMode::Quantity.to_string(),
            }),
            None => Err(CoreError::LineNotFound(index)),
        }
    }

    /// Sets the quantity of a quantity line; 0 removes the line.
    pub fn update_quantity(&mut self, index: usize, quantity: u32) -> CoreResult<()> {
        if quantity == 0 {
            return self.remove_item(index).map(|_| ());
        }
        validate_quantity(quantity).map_err(|_| CoreError::QuantityTooLarge {
            requested: quantity,
            max: MAX_ITEM_QUANTITY,
        })?;

        match self.items.get_mut(index) {
            Some(LineItem::Quantity(item)) => {
                item.quantity = quantity;
                Ok(())
            }
            Some(LineItem::Weight(item)) => Err(CoreError::PricingModeMismatch {
                product: item.name.clone(),
                expected: PricingMode::Quantity.to_string(),
                actual: PricingMode::Weight.to_string(),
            }),
            None => Err(CoreError::LineNotFound(index)),
        }
    }

    /// Removes the line at `index` and returns it.
    pub fn remove_item(&mut self, index: usize) -> CoreResult<LineItem> {
        if index >= self.items.len() {
            return Err(CoreError::LineNotFound(index));
        }
        Ok(self.items.remove(index))
    }

    /// Attaches a registered customer and marks the customer step done.
    pub fn set_customer(&mut self, customer: Customer) {
        self.customer = Some(customer);
        self.customer_confirmed = true;
    }

    /// Explicitly marks the ticket as walk-in.
    pub fn confirm_walk_in(&mut self) {
        self.customer = None;
        self.customer_confirmed = true;
    }

    pub fn is_walk_in(&self) -> bool {
        self.customer.is_none()
    }

    /// Toggles express service. Lines already on the ticket keep their price.
    pub fn set_express(&mut self, is_express: bool) {
        self.is_express = is_express;
    }

    /// Sets or replaces the manual discount.
    ///
    /// ## Errors
    /// An amount discount larger than the current subtotal is rejected.
    pub fn set_manual_discount(&mut self, discount: ManualDiscount) -> CoreResult<()> {
        match discount.kind {
            DiscountKind::Percentage => validate_discount_percentage(discount.value)?,
            DiscountKind::Amount => {
                validate_discount_amount(Money::new(discount.value), self.subtotal())?
            }
        }
        self.manual_discount = Some(discount);
        Ok(())
    }

    pub fn clear_manual_discount(&mut self) {
        self.manual_discount = None;
    }

    pub fn set_delivery(&mut self, delivery: Option<Product>) {
        self.delivery = delivery;
    }

    pub fn set_notes(&mut self, notes: &str) -> CoreResult<()> {
        validate_notes(notes)?;
        let notes = notes.trim();
        self.notes = (!notes.is_empty()).then(|| notes.to_string());
        Ok(())
    }

    /// Resets to an empty ticket, ready for the next customer.
    pub fn clear(&mut self) {
        *self = Ticket::new();
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn subtotal(&self) -> Money {
        self.items.iter().map(LineItem::line_total).sum()
    }

    fn ensure_room(&self) -> CoreResult<()> {
        if self.items.len() >= MAX_TICKET_ITEMS {
            return Err(CoreError::TicketTooLarge {
                max: MAX_TICKET_ITEMS,
            });
        }
        Ok(())
    }
}

// =============================================================================
// Ticket Totals
// =============================================================================

/// Everything the order-entry screen and the persisted order need to know
/// about a ticket's price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TicketTotals {
    pub subtotal: Money,
    pub discount_amount: Money,
    pub after_discount: Money,
    pub delivery_charge: Money,
    pub taxable_amount: Money,
    pub tax_amount: Money,
    pub total: Money,

    #[serde(with = "rust_decimal::serde::float")]
    #[ts(type = "number")]
    pub total_weight: Decimal,
    pub total_bags: u32,
    pub total_pieces: u32,

    /// Noon, `completion_days` after `now`, in the store's offset.
    #[ts(as = "String")]
    pub promised_date: DateTime<FixedOffset>,
}

impl TicketTotals {
    /// Prices a ticket.
    ///
    /// Pure and deterministic: `now` is the only notion of time, and it
    /// also fixes the UTC offset of the promised date.
    pub fn compute(
        ticket: &Ticket,
        settings: &ServiceSettings,
        now: DateTime<FixedOffset>,
    ) -> TicketTotals {
        let subtotal = ticket.subtotal();

        let discount_amount = ticket
            .manual_discount
            .as_ref()
            .map(|d| d.amount_for(subtotal))
            .unwrap_or_default();

        let after_discount = subtotal - discount_amount;
        let delivery_charge = ticket
            .delivery
            .as_ref()
            .map(|p| p.price)
            .unwrap_or_default();
        let taxable_amount = after_discount + delivery_charge;
        let tax_amount = taxable_amount.calculate_tax(settings.tax_rate);
        let total = after_discount + delivery_charge + tax_amount;

        TicketTotals {
            subtotal,
            discount_amount,
            after_discount,
            delivery_charge,
            taxable_amount,
            tax_amount,
            total,
            total_weight: ticket.items.iter().map(LineItem::total_weight).sum(),
            total_bags: ticket.items.iter().map(|l| l.bags() as u32).sum(),
            total_pieces: ticket.items.iter().map(LineItem::pieces).sum(),
            promised_date: promised_date(now, settings.completion_days(ticket.is_express)),
        }
    }
}

/// Free-function form of [`TicketTotals::compute`].
pub fn compute_ticket_totals(
    ticket: &Ticket,
    settings: &ServiceSettings,
    now: DateTime<FixedOffset>,
) -> TicketTotals {
    TicketTotals::compute(ticket, settings, now)
}

/// `now`'s calendar date plus `days`, at noon in `now`'s offset.
pub fn promised_date(now: DateTime<FixedOffset>, days: u32) -> DateTime<FixedOffset> {
    let offset = *now.offset();
    now.date_naive()
        .checked_add_days(Days::new(u64::from(days)))
        .and_then(|date| date.and_hms_opt(PROMISED_HOUR, 0, 0))
        .and_then(|local| offset.from_local_datetime(&local).single())
        .unwrap_or(now)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::TaxRate;
    use chrono::Timelike;
    use rust_decimal_macros::dec;

    fn panama_now() -> DateTime<FixedOffset> {
        FixedOffset::west_opt(5 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 15, 16, 45, 0)
            .unwrap()
    }

    fn shirt() -> Product {
        Product::new("p-shirt", "Camisa", PricingMode::Quantity, Money::from_cents(250))
            .with_express_price(Money::from_cents(400))
    }

    fn wash_per_kg() -> Product {
        Product::new("p-wash", "Lavado y Doblado", PricingMode::Weight, Money::from_cents(150))
    }

    fn flat(amount_units: i64) -> Product {
        Product::new("p-flat", "Servicio", PricingMode::Quantity, Money::from_units(amount_units))
    }

    fn delivery(amount_units: i64) -> Product {
        Product::new("p-delivery", "Delivery", PricingMode::Quantity, Money::from_units(amount_units))
    }

    #[test]
    fn test_empty_ticket_totals_are_zero() {
        let mut ticket = Ticket::new();
        ticket.set_express(true);
        ticket.manual_discount = Some(ManualDiscount::percentage(dec!(50), None).unwrap());

        let totals = TicketTotals::compute(&ticket, &ServiceSettings::default(), panama_now());
        assert!(totals.total.is_zero());
        assert!(totals.tax_amount.is_zero());
        assert!(totals.discount_amount.is_zero());
    }

    #[test]
    fn test_example_scenario_percentage_discount_with_delivery() {
        let mut ticket = Ticket::new();
        ticket.add_product(&flat(100)).unwrap();
        ticket
            .set_manual_discount(ManualDiscount::percentage(dec!(10), None).unwrap())
            .unwrap();
        ticket.set_delivery(Some(delivery(5)));

        let totals = TicketTotals::compute(&ticket, &ServiceSettings::default(), panama_now());
        assert_eq!(totals.subtotal, Money::from_units(100));
        assert_eq!(totals.discount_amount, Money::from_units(10));
        assert_eq!(totals.after_discount, Money::from_units(90));
        assert_eq!(totals.taxable_amount, Money::from_units(95));
        assert_eq!(totals.tax_amount, Money::from_cents(665));
        assert_eq!(totals.total, Money::from_cents(10165));
    }

    #[test]
    fn test_total_identity_holds_without_rounding() {
        let mut ticket = Ticket::new();
        ticket.add_product(&shirt()).unwrap();
        ticket
            .add_weighed(
                &wash_per_kg(),
                vec![WeightEntry::new(dec!(3.33)).unwrap()],
            )
            .unwrap();
        ticket
            .set_manual_discount(ManualDiscount::percentage(dec!(12.5), None).unwrap())
            .unwrap();
        ticket.set_delivery(Some(delivery(3)));

        let totals = TicketTotals::compute(&ticket, &ServiceSettings::default(), panama_now());
        assert_eq!(
            totals.total,
            totals.subtotal - totals.discount_amount + totals.delivery_charge + totals.tax_amount
        );
        // 2.50 + 3.33 × 1.50 = 7.495, kept exact
        assert_eq!(totals.subtotal.amount(), dec!(7.495));
    }

    #[test]
    fn test_discount_never_exceeds_subtotal() {
        let mut ticket = Ticket::new();
        ticket.add_product(&flat(20)).unwrap();

        // Stale amount discount after the subtotal dropped is clamped
        ticket.manual_discount = Some(ManualDiscount::amount(Money::from_units(50), None).unwrap());
        let totals = TicketTotals::compute(&ticket, &ServiceSettings::default(), panama_now());
        assert_eq!(totals.discount_amount, Money::from_units(20));
        assert!(totals.total.is_zero());

        ticket.manual_discount = Some(ManualDiscount::percentage(dec!(100), None).unwrap());
        let totals = TicketTotals::compute(&ticket, &ServiceSettings::default(), panama_now());
        assert_eq!(totals.discount_amount, Money::from_units(20));
    }

    #[test]
    fn test_amount_discount_above_subtotal_is_rejected() {
        let mut ticket = Ticket::new();
        ticket.add_product(&flat(20)).unwrap();

        let too_much = ManualDiscount::amount(Money::from_units(25), None).unwrap();
        assert!(ticket.set_manual_discount(too_much).is_err());
        assert!(ticket.manual_discount.is_none());

        let ok = ManualDiscount::amount(Money::from_units(20), Some("  cliente frecuente ".into()))
            .unwrap();
        ticket.set_manual_discount(ok).unwrap();
        let reason = ticket.manual_discount.as_ref().and_then(|d| d.reason.as_deref());
        assert_eq!(reason, Some("cliente frecuente"));
    }

    #[test]
    fn test_invalid_discount_values_are_rejected() {
        assert!(ManualDiscount::percentage(dec!(0), None).is_err());
        assert!(ManualDiscount::percentage(dec!(100.01), None).is_err());
        assert!(ManualDiscount::percentage(dec!(-5), None).is_err());
        assert!(ManualDiscount::amount(Money::from_cents(-100), None).is_err());
    }

    #[test]
    fn test_same_quantity_product_merges() {
        let mut ticket = Ticket::new();
        ticket.add_product(&shirt()).unwrap();
        ticket.add_product(&shirt()).unwrap();

        assert_eq!(ticket.items.len(), 1);
        assert_eq!(ticket.items[0].pieces(), 2);
        assert_eq!(ticket.items[0].line_total(), Money::from_units(5));
    }

    #[test]
    fn test_weight_lines_never_merge() {
        let mut ticket = Ticket::new();
        let bag = || vec![WeightEntry::new(dec!(4)).unwrap()];
        ticket.add_weighed(&wash_per_kg(), bag()).unwrap();
        ticket.add_weighed(&wash_per_kg(), bag()).unwrap();
        assert_eq!(ticket.items.len(), 2);
    }

    #[test]
    fn test_weight_line_example_two_bags() {
        let mut ticket = Ticket::new();
        let index = ticket
            .add_weighed(
                &wash_per_kg(),
                vec![
                    WeightEntry::new(dec!(3.20)).unwrap().with_pieces(12),
                    WeightEntry::new(dec!(2.80)).unwrap().wet(),
                ],
            )
            .unwrap();

        let line = &ticket.items[index];
        assert_eq!(line.total_weight(), dec!(6.00));
        assert_eq!(line.bags(), 2);
        assert_eq!(line.pieces(), 12);
        assert_eq!(line.line_total(), Money::from_units(9));

        let totals = TicketTotals::compute(&ticket, &ServiceSettings::default(), panama_now());
        assert_eq!(totals.total_weight, dec!(6));
        assert_eq!(totals.total_bags, 2);
    }

    #[test]
    fn test_add_weight_entry_recomputes_line() {
        let mut ticket = Ticket::new();
        let index = ticket
            .add_weighed(&wash_per_kg(), vec![WeightEntry::new(dec!(2)).unwrap()])
            .unwrap();
        ticket
            .add_weight_entry(index, WeightEntry::new(dec!(1)).unwrap())
            .unwrap();
        assert_eq!(ticket.items[index].line_total(), Money::from_cents(450));

        ticket.add_product(&shirt()).unwrap();
        let err = ticket
            .add_weight_entry(1, WeightEntry::new(dec!(1)).unwrap())
            .unwrap_err();
        assert!(matches!(err, CoreError::PricingModeMismatch { .. }));
    }

    #[test]
    fn test_pricing_mode_mismatch() {
        let mut ticket = Ticket::new();
        assert!(matches!(
            ticket.add_product(&wash_per_kg()),
            Err(CoreError::PricingModeMismatch { .. })
        ));
        assert!(ticket
            .add_weighed(&shirt(), vec![WeightEntry::new(dec!(1)).unwrap()])
            .is_err());
        assert!(ticket.add_weighed(&wash_per_kg(), vec![]).is_err());
    }

    #[test]
    fn test_express_price_is_frozen_on_the_line() {
        let mut ticket = Ticket::new();
        ticket.set_express(true);
        ticket.add_product(&shirt()).unwrap();
        ticket.set_express(false);
        ticket.add_product(&shirt()).unwrap();

        // Merged into the express line, at the express price
        assert_eq!(ticket.items.len(), 1);
        assert_eq!(ticket.items[0].unit_price(), Money::from_units(4));
    }

    #[test]
    fn test_update_and_remove() {
        let mut ticket = Ticket::new();
        ticket.add_product(&shirt()).unwrap();
        ticket.update_quantity(0, 5).unwrap();
        assert_eq!(ticket.items[0].pieces(), 5);

        assert!(matches!(
            ticket.update_quantity(0, 1000),
            Err(CoreError::QuantityTooLarge { requested: 1000, max: 999 })
        ));
        assert!(matches!(
            ticket.update_quantity(3, 1),
            Err(CoreError::LineNotFound(3))
        ));

        ticket.update_quantity(0, 0).unwrap();
        assert!(ticket.is_empty());
    }

    #[test]
    fn test_merge_on_saturated_quantity_is_rejected() {
        let mut ticket = Ticket::new();
        ticket.add_product(&shirt()).unwrap();
        if let LineItem::Quantity(item) = &mut ticket.items[0] {
            item.quantity = u32::MAX;
        }

        assert!(matches!(
            ticket.add_product(&shirt()),
            Err(CoreError::QuantityTooLarge { requested: u32::MAX, max: 999 })
        ));
        assert_eq!(ticket.items[0].pieces(), u32::MAX);
    }

    #[test]
    fn test_ticket_line_limit() {
        let mut ticket = Ticket::new();
        for i in 0..MAX_TICKET_ITEMS {
            let p = Product::new(format!("p-{i}"), "X", PricingMode::Quantity, Money::from_units(1));
            ticket.add_product(&p).unwrap();
        }
        let extra = Product::new("p-extra", "X", PricingMode::Quantity, Money::from_units(1));
        assert!(matches!(
            ticket.add_product(&extra),
            Err(CoreError::TicketTooLarge { .. })
        ));
    }

    #[test]
    fn test_customer_confirmation() {
        let mut ticket = Ticket::new();
        assert!(!ticket.customer_confirmed);

        ticket.confirm_walk_in();
        assert!(ticket.customer_confirmed);
        assert!(ticket.is_walk_in());

        ticket.set_customer(Customer::new("c-1", "Ana", "Pérez"));
        assert!(!ticket.is_walk_in());

        ticket.clear();
        assert!(!ticket.customer_confirmed);
        assert!(ticket.customer.is_none());
    }

    #[test]
    fn test_promised_date_is_noon_after_lead_time() {
        let now = panama_now();
        let mut ticket = Ticket::new();
        ticket.add_product(&shirt()).unwrap();

        let regular = TicketTotals::compute(&ticket, &ServiceSettings::default(), now);
        assert_eq!(regular.promised_date.date_naive().to_string(), "2024-03-16");
        assert_eq!(regular.promised_date.hour(), 12);
        assert_eq!(regular.promised_date.offset(), now.offset());

        ticket.set_express(true);
        let express = TicketTotals::compute(&ticket, &ServiceSettings::default(), now);
        assert_eq!(express.promised_date.date_naive().to_string(), "2024-03-15");
        assert_eq!(express.promised_date.minute(), 0);
    }

    #[test]
    fn test_zero_tax_rate() {
        let settings = ServiceSettings {
            tax_rate: TaxRate::zero(),
            ..ServiceSettings::default()
        };
        let mut ticket = Ticket::new();
        ticket.add_product(&flat(10)).unwrap();
        let totals = TicketTotals::compute(&ticket, &settings, panama_now());
        assert_eq!(totals.total, Money::from_units(10));
    }

    #[test]
    fn test_ticket_json_shape() {
        let mut ticket = Ticket::new();
        ticket
            .add_weighed(&wash_per_kg(), vec![WeightEntry::new(dec!(2.5)).unwrap()])
            .unwrap();
        ticket.manual_discount = Some(ManualDiscount::percentage(dec!(10), None).unwrap());

        let json = serde_json::to_value(&ticket).unwrap();
        assert_eq!(json["items"][0]["pricing_mode"], "weight");
        assert_eq!(json["items"][0]["entries"][0]["weight_kg"], 2.5);
        assert_eq!(json["manual_discount"]["type"], "percentage");

        let back: Ticket = serde_json::from_value(json).unwrap();
        assert_eq!(back, ticket);
    }
}

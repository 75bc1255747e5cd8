//! # Money Module
//!
//! Provides the `Money` and `TaxRate` types for handling monetary values.
//!
//! ## Round Once, at the End
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  WHERE ROUNDING HAPPENS                                                 │
//! │                                                                         │
//! │  line totals ──► subtotal ──► discount ──► tax ──► total                │
//! │       (exact decimal, no rounding anywhere in this chain)               │
//! │                                                     │                   │
//! │                                                     ▼                   │
//! │                                   format: round half-up to 2 places     │
//! │                                                                         │
//! │  6.00kg × B/1.50 = 9.0000 exactly; 95.00 × 7% = 6.6500 exactly         │
//! │  Rounding intermediates would let totals drift by a cent.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use washfold_core::money::{Money, TaxRate};
//!
//! let price = Money::from_cents(1050); // B/10.50
//! let tax = price.calculate_tax(TaxRate::from_bps(700));
//! assert_eq!(tax.to_string(), "B/0.74"); // 0.735 rounds half-up
//! ```

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use ts_rs::TS;

use crate::DEFAULT_CURRENCY_PREFIX;

/// Decimal places shown on every printed amount.
const DISPLAY_SCALE: u32 = 2;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary amount in Balboas, kept at full decimal precision.
///
/// ## Design Decisions
/// - **Decimal, not cents**: weight pricing (kg × price/kg) and percentage
///   tax produce sub-cent intermediates; they are carried exactly
/// - **Signed**: variances and refunds go negative
/// - **JSON as number**: `12.5` on the wire, matching the data store
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(
    #[serde(with = "rust_decimal::serde::float")]
    #[ts(type = "number")]
    Decimal,
);

impl Money {
    /// Wraps an exact decimal amount.
    #[inline]
    pub const fn new(amount: Decimal) -> Self {
        Money(amount)
    }

    /// Creates a Money value from cents.
    ///
    /// ## Example
    /// ```rust
    /// use washfold_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(1250).to_string(), "B/12.50");
    /// assert_eq!(Money::from_cents(-500).to_string(), "B/-5.00");
    /// ```
    #[inline]
    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::new(cents, 2))
    }

    /// Creates a Money value from whole Balboas.
    #[inline]
    pub fn from_units(units: i64) -> Self {
        Money(Decimal::from(units))
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    /// The exact, unrounded amount.
    #[inline]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// The amount rounded half-up (away from zero) to two decimals.
    ///
    /// Negative zero is normalized so `-0.001` never prints as `-0.00`.
    pub fn rounded(&self) -> Decimal {
        let mut rounded = self
            .0
            .round_dp_with_strategy(DISPLAY_SCALE, RoundingStrategy::MidpointAwayFromZero);
        if rounded.is_zero() {
            return Decimal::new(0, DISPLAY_SCALE);
        }
        // 12.5 must print as 12.50
        rounded.rescale(DISPLAY_SCALE);
        rounded
    }

    /// Whole cents after display rounding.
    pub fn cents(&self) -> i64 {
        (self.rounded() * Decimal::ONE_HUNDRED).to_i64().unwrap_or(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Returns the absolute value.
    #[inline]
    pub fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Restricts the amount to `[min, max]`.
    pub fn clamp_to(self, min: Money, max: Money) -> Money {
        if self < min {
            min
        } else if self > max {
            max
        } else {
            self
        }
    }

    /// Calculates tax on this amount, unrounded.
    ///
    /// ## Example
    /// ```rust
    /// use washfold_core::money::{Money, TaxRate};
    ///
    /// let taxable = Money::from_units(95);
    /// let tax = taxable.calculate_tax(TaxRate::from_bps(700));
    /// assert_eq!(tax, Money::from_cents(665));
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        Money(rate.apply(self.0))
    }

    /// Returns `percent`% of this amount, unrounded.
    pub fn percentage(&self, percent: Decimal) -> Money {
        Money(self.0 * percent / Decimal::ONE_HUNDRED)
    }

    /// Formats with an explicit currency prefix: `B/12.50`, `B/-5.00`.
    pub fn format_with(&self, prefix: &str) -> String {
        format!("{}{}", prefix, self.rounded())
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display uses the receipt format with the default `B/` prefix.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", DEFAULT_CURRENCY_PREFIX, self.rounded())
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Money(amount)
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

/// Multiplication by a quantity.
impl Mul<u32> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: u32) -> Self {
        Money(self.0 * Decimal::from(qty))
    }
}

/// Multiplication by a weight or any other decimal factor.
impl Mul<Decimal> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, factor: Decimal) -> Self {
        Money(self.0 * factor)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01%. Panama's ITBMS at 7.00% is 700 bps, which keeps
/// configured rates exact and comparable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Panama ITBMS, used whenever the store has not configured a rate.
    pub const ITBMS: TaxRate = TaxRate(700);

    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a percentage such as `7.00`.
    ///
    /// Returns `None` for negative rates; sub-basis-point digits are
    /// rounded half-up.
    pub fn from_percentage(percent: Decimal) -> Option<Self> {
        if percent.is_sign_negative() && !percent.is_zero() {
            return None;
        }
        (percent * Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_u32()
            .map(TaxRate)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (`700` → `7`).
    pub fn percentage(&self) -> Decimal {
        Decimal::new(self.0 as i64, 2).normalize()
    }

    /// Tax on `amount`, unrounded.
    pub fn apply(&self, amount: Decimal) -> Decimal {
        amount * Decimal::from(self.0) / Decimal::from(10_000u32)
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    /// Checks if tax rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::ITBMS
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

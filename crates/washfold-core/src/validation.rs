//! # Validation Module
//!
//! Input rules applied at the boundary, before values reach the ticket
//! calculator or the reconciliation engine.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Session command (apps/terminal)                              │
//! │  └── THIS MODULE: reject bad discounts, weights, phones...             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Ticket calculator                                            │
//! │  └── Clamps anything that slipped through (never fails)                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Data store                                                   │
//! │  └── Unique order numbers, one closing per date                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use washfold_core::validation::{validate_panama_phone, validate_quantity};
//!
//! assert!(validate_panama_phone("6123-4567").is_ok());
//! assert!(validate_quantity(5).is_ok());
//! ```

use rust_decimal::Decimal;

use crate::error::ValidationError;
use crate::money::{Money, TaxRate};
use crate::MAX_ITEM_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Heaviest single bag the counter scale accepts.
pub const MAX_BAG_WEIGHT_KG: Decimal = Decimal::from_parts(500, 0, 0, false, 0);

/// Highest configurable tax rate (100%).
pub const MAX_TAX_RATE_BPS: u32 = 10_000;

const MAX_NOTES_LEN: usize = 500;
const MAX_NAME_LEN: usize = 200;

// =============================================================================
// Amount Validators
// =============================================================================

/// Percentage discounts must be in (0, 100].
pub fn validate_discount_percentage(percent: Decimal) -> ValidationResult<()> {
    if percent <= Decimal::ZERO || percent > Decimal::ONE_HUNDRED {
        return Err(ValidationError::OutOfRange {
            field: "discount percentage".to_string(),
            min: "0".to_string(),
            max: "100".to_string(),
        });
    }
    Ok(())
}

/// Amount discounts must be in (0, subtotal].
///
/// ## Example
/// ```rust
/// use washfold_core::money::Money;
/// use washfold_core::validation::validate_discount_amount;
///
/// let subtotal = Money::from_units(20);
/// assert!(validate_discount_amount(Money::from_units(20), subtotal).is_ok());
/// assert!(validate_discount_amount(Money::from_units(21), subtotal).is_err());
/// ```
pub fn validate_discount_amount(amount: Money, subtotal: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "discount amount".to_string(),
        });
    }
    if amount > subtotal {
        return Err(ValidationError::AboveMaximum {
            field: "discount amount".to_string(),
            max: subtotal.to_string(),
        });
    }
    Ok(())
}

/// A single bag must weigh something, and no more than the scale allows.
pub fn validate_weight_kg(weight_kg: Decimal) -> ValidationResult<()> {
    if weight_kg <= Decimal::ZERO {
        return Err(ValidationError::MustBePositive {
            field: "weight".to_string(),
        });
    }
    if weight_kg > MAX_BAG_WEIGHT_KG {
        return Err(ValidationError::AboveMaximum {
            field: "weight".to_string(),
            max: format!("{}kg", MAX_BAG_WEIGHT_KG),
        });
    }
    Ok(())
}

/// Quantity on a line: 1 to [`MAX_ITEM_QUANTITY`].
pub fn validate_quantity(quantity: u32) -> ValidationResult<()> {
    if quantity == 0 || quantity > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: "1".to_string(),
            max: MAX_ITEM_QUANTITY.to_string(),
        });
    }
    Ok(())
}

pub fn validate_tax_rate(rate: TaxRate) -> ValidationResult<()> {
    if rate.bps() > MAX_TAX_RATE_BPS {
        return Err(ValidationError::OutOfRange {
            field: "tax rate".to_string(),
            min: "0%".to_string(),
            max: "100%".to_string(),
        });
    }
    Ok(())
}

/// Cash handed over must cover the order total.
pub fn validate_cash_tendered(tendered: Money, total: Money) -> ValidationResult<()> {
    if tendered.rounded() < total.rounded() {
        return Err(ValidationError::OutOfRange {
            field: "cash tendered".to_string(),
            min: total.to_string(),
            max: "any".to_string(),
        });
    }
    Ok(())
}

/// A refund is positive and never larger than what was paid.
pub fn validate_refund_amount(refund: Money, order_total: Money) -> ValidationResult<()> {
    if !refund.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "refund amount".to_string(),
        });
    }
    if refund > order_total {
        return Err(ValidationError::AboveMaximum {
            field: "refund amount".to_string(),
            max: order_total.to_string(),
        });
    }
    Ok(())
}

pub fn validate_opening_balance(balance: Money) -> ValidationResult<()> {
    if balance.is_negative() {
        return Err(ValidationError::Negative {
            field: "opening balance".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    validate_required_text("name", name, MAX_NAME_LEN)
}

pub fn validate_customer_name(name: &str) -> ValidationResult<()> {
    validate_required_text("customer name", name, MAX_NAME_LEN)
}

/// Notes are optional but bounded.
pub fn validate_notes(notes: &str) -> ValidationResult<()> {
    if notes.trim().chars().count() > MAX_NOTES_LEN {
        return Err(ValidationError::TooLong {
            field: "notes".to_string(),
            max: MAX_NOTES_LEN,
        });
    }
    Ok(())
}

fn validate_required_text(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }
    Ok(())
}

/// Panamanian mobile number: 8 digits starting with 6 (or 5 for newer
/// ranges). Dashes and spaces are ignored.
pub fn validate_panama_phone(phone: &str) -> ValidationResult<()> {
    let digits: String = phone.chars().filter(|c| !matches!(c, '-' | ' ')).collect();
    let valid = digits.len() == 8
        && digits.chars().all(|c| c.is_ascii_digit())
        && matches!(digits.chars().next(), Some('5') | Some('6'));
    if !valid {
        return Err(ValidationError::InvalidFormat {
            field: "phone".to_string(),
            reason: "expected 8 digits starting with 5 or 6".to_string(),
        });
    }
    Ok(())
}

/// Panamanian cédula: `PROVINCE-BOOK-ENTRY`, e.g. `8-123-4567` or
/// `PE-12-345`. Province up to 4 letters/digits (any case), then 1-4 and
/// 1-6 digits.
pub fn validate_cedula(cedula: &str) -> ValidationResult<()> {
    let parts: Vec<&str> = cedula.trim().split('-').collect();
    let valid = match parts.as_slice() {
        [province, book, entry] => {
            (1..=4).contains(&province.len())
                && province.chars().all(|c| c.is_ascii_alphanumeric())
                && is_digits(book, 1, 4)
                && is_digits(entry, 1, 6)
        }
        _ => false,
    };
    if !valid {
        return Err(ValidationError::InvalidFormat {
            field: "cédula".to_string(),
            reason: "expected format like 8-123-4567".to_string(),
        });
    }
    Ok(())
}

/// RUC: three or more dash-separated digit groups, e.g. `155-1234-56789`.
pub fn validate_ruc(ruc: &str) -> ValidationResult<()> {
    let parts: Vec<&str> = ruc.trim().split('-').collect();
    let valid = parts.len() >= 3 && parts.iter().all(|p| is_digits(p, 1, 12));
    if !valid {
        return Err(ValidationError::InvalidFormat {
            field: "RUC".to_string(),
            reason: "expected digit groups separated by dashes".to_string(),
        });
    }
    Ok(())
}

fn is_digits(s: &str, min: usize, max: usize) -> bool {
    (min..=max).contains(&s.len()) && s.chars().all(|c| c.is_ascii_digit())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_discount_percentage_bounds() {
        assert!(validate_discount_percentage(dec!(0.5)).is_ok());
        assert!(validate_discount_percentage(dec!(100)).is_ok());
        assert!(validate_discount_percentage(dec!(0)).is_err());
        assert!(validate_discount_percentage(dec!(101)).is_err());
    }

    #[test]
    fn test_weight() {
        assert!(validate_weight_kg(dec!(0.1)).is_ok());
        assert!(validate_weight_kg(dec!(0)).is_err());
        assert!(validate_weight_kg(dec!(-2)).is_err());
        assert!(validate_weight_kg(dec!(500.01)).is_err());
    }

    #[test]
    fn test_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_refund_and_cash() {
        let total = Money::from_units(30);
        assert!(validate_refund_amount(Money::from_units(30), total).is_ok());
        assert!(validate_refund_amount(Money::from_units(31), total).is_err());
        assert!(validate_refund_amount(Money::zero(), total).is_err());

        assert!(validate_cash_tendered(Money::from_units(30), total).is_ok());
        assert!(validate_cash_tendered(Money::from_cents(2999), total).is_err());
        assert!(validate_opening_balance(Money::from_cents(-1)).is_err());
    }

    #[test]
    fn test_tax_rate_limit() {
        assert!(validate_tax_rate(TaxRate::ITBMS).is_ok());
        assert!(validate_tax_rate(TaxRate::from_bps(10_001)).is_err());
    }

    #[test]
    fn test_panama_phone() {
        assert!(validate_panama_phone("61234567").is_ok());
        assert!(validate_panama_phone("6123-4567").is_ok());
        assert!(validate_panama_phone("51234567").is_ok());
        assert!(validate_panama_phone("71234567").is_err());
        assert!(validate_panama_phone("6123456").is_err());
        assert!(validate_panama_phone("6123456a").is_err());
    }

    #[test]
    fn test_cedula() {
        assert!(validate_cedula("8-123-4567").is_ok());
        assert!(validate_cedula("PE-12-345").is_ok());
        assert!(validate_cedula("8-12345-1").is_err());
        assert!(validate_cedula("8-123").is_err());
        assert!(validate_cedula("pe-12-345").is_ok());
        assert!(validate_cedula("PE.1-12-345").is_err());
    }

    #[test]
    fn test_ruc() {
        assert!(validate_ruc("155-1234-56789").is_ok());
        assert!(validate_ruc("8-123-4567").is_ok());
        assert!(validate_ruc("155-ABC-1").is_err());
        assert!(validate_ruc("1551234").is_err());
    }

    #[test]
    fn test_text_fields() {
        assert!(validate_product_name("Lavado por kg").is_ok());
        assert!(validate_product_name("   ").is_err());
        assert!(validate_notes("").is_ok());
        assert!(validate_notes(&"x".repeat(501)).is_err());
        assert!(validate_customer_name(&"ñ".repeat(200)).is_ok());
    }
}

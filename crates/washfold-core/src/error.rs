//! # Error Types
//!
//! Domain-specific error types for washfold-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  washfold-core errors (this file)                                      │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  washfold-store errors (separate crate)                                │
//! │  └── StoreError       - Data-store operation failures                  │
//! │                                                                         │
//! │  Terminal errors (in app)                                              │
//! │  └── ApiError         - What the operator sees (serialized)            │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ApiError ← StoreError             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// No line at the given position on the ticket.
    #[error("Ticket has no line at position {0}")]
    LineNotFound(usize),

    /// A product was added through the wrong entry point.
    ///
    /// ## When This Occurs
    /// - A weight-priced product is tapped as a quantity item
    /// - A bag is weighed for a quantity-priced product
    #[error("Product {product} is priced by {actual}, not by {expected}")]
    PricingModeMismatch {
        product: String,
        expected: String,
        actual: String,
    },

    /// Finalizing a ticket without any lines.
    #[error("Ticket is empty")]
    TicketEmpty,

    /// The operator has neither picked a customer nor confirmed walk-in.
    #[error("Customer has not been confirmed for this ticket")]
    CustomerNotConfirmed,

    /// Ticket has exceeded the maximum allowed lines.
    #[error("Ticket cannot have more than {max} lines")]
    TicketTooLarge { max: usize },

    /// Line quantity exceeds the maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: u32, max: u32 },

    /// Payment cannot settle the order.
    #[error("Invalid payment: {reason}")]
    InvalidPayment { reason: String },

    /// Order status cannot move as requested.
    ///
    /// ## When This Occurs
    /// - Advancing a completed order
    /// - Cancelling an order that was already refunded
    #[error("Order #{order_number} cannot go from {from} to {to}")]
    InvalidStatusTransition {
        order_number: u64,
        from: String,
        to: String,
    },

    /// A closed day is immutable.
    #[error("Daily closing for {date} is already closed")]
    ClosingAlreadyClosed { date: String },

    /// The cash variance is large enough that the operator must confirm it.
    ///
    /// ## User Workflow
    /// ```text
    /// Counted 310.00, expected 330.00
    ///      │
    ///      ▼
    /// variance -20.00 → Review
    ///      │
    ///      ▼
    /// VarianceConfirmationRequired ──► operator confirms ──► close
    /// ```
    #[error("Cash variance of {variance} requires operator confirmation")]
    VarianceConfirmationRequired { variance: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These are raised at the input boundary, before any value reaches the
/// ticket calculator or the reconciliation engine.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: String,
        min: String,
        max: String,
    },

    /// Value exceeds a limit that depends on other input (e.g. the subtotal).
    #[error("{field} cannot exceed {max}")]
    AboveMaximum { field: String, max: String },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} cannot be negative")]
    Negative { field: String },

    /// Invalid format (phone, cédula, RUC, date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InvalidStatusTransition {
            order_number: 3481,
            from: "completed".to_string(),
            to: "washing".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Order #3481 cannot go from completed to washing"
        );

        let err = CoreError::PricingModeMismatch {
            product: "Edredón".to_string(),
            expected: "quantity".to_string(),
            actual: "weight".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Product Edredón is priced by weight, not by quantity"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::OutOfRange {
            field: "discount percentage".to_string(),
            min: "0".to_string(),
            max: "100".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "discount percentage must be between 0 and 100"
        );

        let err = ValidationError::AboveMaximum {
            field: "discount amount".to_string(),
            max: "B/20.00".to_string(),
        };
        assert_eq!(err.to_string(), "discount amount cannot exceed B/20.00");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "name".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}

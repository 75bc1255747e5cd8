//! # API Error Type
//!
//! Unified error type for terminal commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Terminal                           │
//! │                                                                         │
//! │  Command Function: Result<T, ApiError>                                  │
//! │         │                                                               │
//! │         ├── Store failure? ─── StoreError::Unavailable ──┐              │
//! │         │                                                │              │
//! │         ├── Ticket rule?  ──── CoreError::TicketEmpty ───┤              │
//! │         │                                                ▼              │
//! │         ├── Bad config?   ──── ConfigError::Invalid ──► ApiError        │
//! │         │                                           { code, message }   │
//! │         └── Success ───────────────────────────────────────────────►    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Printer failures are NOT converted here on the receipt and closing paths:
//! those commands report partial success instead of failing.

use serde::Serialize;
use std::fmt;
use thiserror::Error;
use washfold_core::{CoreError, ValidationError};
use washfold_store::StoreError;

use crate::printer::PrintError;

/// Error returned from terminal commands.
///
/// ## Serialization
/// ```json
/// {
///   "code": "VARIANCE_CONFIRMATION_REQUIRED",
///   "message": "Cash variance of -3.00 requires operator confirmation"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for command responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found
    NotFound,

    /// Input validation failed
    ValidationError,

    /// Data store operation failed
    StoreError,

    /// Business rule rejected the operation
    BusinessLogic,

    /// Internal error
    Internal,

    /// Ticket operation failed
    TicketError,

    /// Payment does not match the order
    PaymentError,

    /// A `REVISAR` cash variance needs explicit operator confirmation
    VarianceConfirmationRequired,

    /// Configuration could not be loaded or is invalid
    ConfigError,

    /// Printer rejected or could not receive the job
    PrintError,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            StoreError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::ValidationError,
                format!("{} '{}' already exists", field, value),
            ),
            StoreError::InvalidState(message) => ApiError::new(ErrorCode::BusinessLogic, message),
            StoreError::Domain(e) => ApiError::from(e),
            StoreError::Unavailable(e) => {
                tracing::error!("Data store unavailable: {}", e);
                ApiError::new(ErrorCode::StoreError, "Data store unavailable")
            }
            StoreError::Internal(e) => {
                tracing::error!("Internal store error: {}", e);
                ApiError::new(ErrorCode::StoreError, "Data store operation failed")
            }
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        match err {
            CoreError::LineNotFound(_)
            | CoreError::PricingModeMismatch { .. }
            | CoreError::TicketEmpty
            | CoreError::CustomerNotConfirmed
            | CoreError::TicketTooLarge { .. } => ApiError::new(ErrorCode::TicketError, message),
            CoreError::QuantityTooLarge { .. } => ApiError::validation(message),
            CoreError::InvalidPayment { .. } => ApiError::new(ErrorCode::PaymentError, message),
            CoreError::InvalidStatusTransition { .. } | CoreError::ClosingAlreadyClosed { .. } => {
                ApiError::new(ErrorCode::BusinessLogic, message)
            }
            CoreError::VarianceConfirmationRequired { .. } => {
                ApiError::new(ErrorCode::VarianceConfirmationRequired, message)
            }
            CoreError::Validation(e) => ApiError::from(e),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        ApiError::new(ErrorCode::ConfigError, err.to_string())
    }
}

impl From<PrintError> for ApiError {
    fn from(err: PrintError) -> Self {
        ApiError::new(ErrorCode::PrintError, err.to_string())
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors while loading or saving `terminal.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A value is present but unusable.
    ///
    /// ## When This Occurs
    /// - Tax rate above 100%
    /// - UTC offset outside ±14 hours
    /// - Paper narrower than a receipt line
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

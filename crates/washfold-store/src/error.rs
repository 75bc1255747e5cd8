//! # Store Error Types
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  Backend failure / missing record / rule violation                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  StoreError (this module) ← Adds context and categorization            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ApiError (terminal app) ← Stable code + message                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;
use washfold_core::CoreError;

/// Data-store operation errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Entity not found.
    ///
    /// ## When This Occurs
    /// - Unknown order ID on a status update or refund
    /// - Unknown product or customer ID
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique key already taken.
    ///
    /// ## When This Occurs
    /// - Inserting an order whose ID already exists
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// The record is not in a state the store accepts.
    ///
    /// ## When This Occurs
    /// - Persisting a closing that has not been closed
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A business rule rejected the change (e.g. an illegal status move).
    #[error(transparent)]
    Domain(#[from] CoreError),

    /// The backing service could not be reached.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Internal store error: {0}")]
    Internal(String),
}

impl StoreError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        StoreError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        StoreError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

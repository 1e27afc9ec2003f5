//! # Error Types
//!
//! Domain-specific error types for storely-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  storely-core errors (this file)                                       │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  storely-db errors (separate crate)                                    │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  storely-orders errors (separate crate)                                │
//! │  └── EngineError      - Core ∪ Db, what callers of the engine see      │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → EngineError → API layer           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (ids, amounts)
//! 3. Errors are enum variants, never String
//! 4. Each variant maps 1:1 to a user-facing message in the API layer
//! 5. Nothing here is transient: every error is invalid input or stale
//!    business state, surfaced to the caller for decision

use thiserror::Error;

use crate::money::Money;
use crate::types::OrderStatus;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations raised by the order engine.
///
/// The orchestrator rolls back its transaction and re-raises these
/// unchanged; nothing is swallowed or retried inside the core.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Order cannot be found.
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// Order item cannot be found on the order.
    #[error("Order item not found: {0}")]
    ItemNotFound(String),

    /// Product cannot be found in the catalog.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Promotion cannot be found by id or code.
    #[error("Promotion not found: {0}")]
    PromotionNotFound(String),

    /// No inventory record exists for the product.
    ///
    /// Raised by reserve only. Release tolerates missing rows and
    /// creates them instead, because it is a compensating action.
    #[error("Inventory not found for product: {0}")]
    InventoryNotFound(String),

    /// Operation attempted on an order in the wrong state.
    ///
    /// ## When This Occurs
    /// - Mutating a Paid or Canceled order
    /// - Canceling a Paid order
    /// - Removing a promotion when none is applied
    #[error("Order {order_id} is {status}: {reason}")]
    InvalidState {
        order_id: String,
        status: OrderStatus,
        reason: String,
    },

    /// Insufficient stock to reserve the requested quantity.
    ///
    /// ## User Workflow
    /// ```text
    /// addItem (qty: 6)
    ///      │
    ///      ▼
    /// conditional decrement fails: available = 5
    ///      │
    ///      ▼
    /// InsufficientStock { available: 5, requested: 6 }
    ///      │
    ///      ▼
    /// UI shows: "Only 5 left in stock"
    /// ```
    #[error("Insufficient stock for product {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        available: i64,
        requested: i64,
    },

    /// Promotion status is not "active".
    #[error("Promotion is not active")]
    PromotionInactive,

    /// The promotion window has not opened yet.
    #[error("Promotion has not started yet")]
    PromotionNotStarted,

    /// The promotion window has closed.
    #[error("Promotion has expired")]
    PromotionExpired,

    /// Order total is below the promotion's minimum.
    #[error("Order amount must be at least {minimum}")]
    PromotionMinimumNotMet { minimum: Money },

    /// The promotion's usage limit has been consumed.
    #[error("Promotion usage limit has been reached")]
    PromotionUsageExceeded,

    /// Tendered payment amount does not equal the final amount.
    /// Exact equality is required; there is no tolerance.
    #[error("Payment amount {received} does not match order amount {expected}")]
    AmountMismatch { expected: Money, received: Money },

    /// Customer paid amount is provided but below the final amount.
    #[error("Customer paid {paid} is insufficient, {required} required")]
    InsufficientPayment { required: Money, paid: Money },

    /// Payment method string does not parse to a known method.
    #[error("Invalid payment method: {0}")]
    InvalidPaymentMethod(String),

    /// Checkout or promotion application attempted on an itemless order.
    #[error("Order {0} has no items")]
    EmptyOrder(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates an InvalidState error with context.
    pub fn invalid_state(
        order_id: impl Into<String>,
        status: OrderStatus,
        reason: impl Into<String>,
    ) -> Self {
        CoreError::InvalidState {
            order_id: order_id.into(),
            status,
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when request input doesn't meet requirements, before any
/// business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Value must be strictly positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., bad code shape).
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
        let err = CoreError::InsufficientStock {
            product_id: "prod-7".to_string(),
            available: 5,
            requested: 6,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for product prod-7: available 5, requested 6"
        );
    }

    #[test]
    fn test_amount_mismatch_formats_money() {
        let err = CoreError::AmountMismatch {
            expected: Money::from_cents(2250),
            received: Money::from_cents(2500),
        };
        assert_eq!(
            err.to_string(),
            "Payment amount $25.00 does not match order amount $22.50"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}

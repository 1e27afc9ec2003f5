//! # Validation Module
//!
//! Input validation utilities for Storely.
//!
//! These run before business logic: the engine validates request shape
//! here, business rules in `promo`/the orchestrator, and the database
//! backs both with NOT NULL/CHECK/UNIQUE constraints.
//!
//! ## Usage
//! ```rust
//! use storely_core::validation::{validate_quantity, validate_promo_code};
//!
//! validate_quantity(5).unwrap();
//! validate_promo_code("SAVE10").unwrap();
//! ```

use crate::error::ValidationError;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validates an item quantity.
///
/// ## Rules
/// - Must be strictly positive (reserve/release amounts and line
///   quantities are all > 0 by contract)
pub fn validate_quantity(quantity: i64) -> ValidationResult<()> {
    if quantity <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    Ok(())
}

/// Validates a promotion code.
///
/// ## Rules
/// - Must not be empty after trimming
/// - Must be at most 50 characters
pub fn validate_promo_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "promo_code".to_string(),
        });
    }

    if code.len() > 50 {
        return Err(ValidationError::InvalidFormat {
            field: "promo_code".to_string(),
            reason: "must be at most 50 characters".to_string(),
        });
    }

    Ok(())
}

/// Validates a tendered payment amount.
///
/// ## Rules
/// - Must not be negative (zero is legal: a fully discounted order has a
///   final amount of zero)
pub fn validate_payment_amount(amount_cents: i64) -> ValidationResult<()> {
    if amount_cents < 0 {
        return Err(ValidationError::MustBePositive {
            field: "amount".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

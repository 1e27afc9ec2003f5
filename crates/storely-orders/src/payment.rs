//! # Payment Finalizer
//!
//! The last step of checkout: validates the tendered payment against the
//! order's final amount, records the payment, marks the order paid, and
//! counts the promotion redemption.
//!
//! ## Finalization Steps (fixed order)
//! ```text
//! 1. final = max(0, total − discount)
//! 2. tendered amount ≠ final            → AmountMismatch (exact, no tolerance)
//! 3. customer_paid given (>0) and < final → InsufficientPayment
//! 4. payment method fails to parse      → InvalidPaymentMethod
//! 5. request customer_id → attached to the order
//! 6. Payment row inserted (amount = final, parsed method, now)
//! 7. order.status = Paid
//! 8. applied promotion → guarded used_count + 1
//!    (0 rows affected → PromotionUsageExceeded, whole checkout rolls back)
//! ```
//! Step 8 is the ONLY place a promotion's usage is ever incremented -
//! application alone never consumes a redemption.

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::debug;
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::requests::CheckoutRequest;
use storely_core::validation::validate_payment_amount;
use storely_core::{CoreError, Money, Order, OrderStatus, Payment, PaymentMethod};
use storely_db::{PaymentRepository, PromotionRepository};

/// Checkout payment validation and persistence.
#[derive(Debug)]
pub struct PaymentFinalizer;

impl PaymentFinalizer {
    /// Finalizes payment for an order whose totals are already
    /// recomputed.
    ///
    /// Mutates the order (customer attach, status) in memory; the caller
    /// persists the header and owns the transaction.
    pub async fn finalize(
        conn: &mut SqliteConnection,
        order: &mut Order,
        request: &CheckoutRequest,
    ) -> EngineResult<Payment> {
        validate_payment_amount(request.amount_cents)?;

        let final_amount = order.final_amount();
        let tendered = Money::from_cents(request.amount_cents);

        if tendered != final_amount {
            return Err(EngineError::Core(CoreError::AmountMismatch {
                expected: final_amount,
                received: tendered,
            }));
        }

        if let Some(paid_cents) = request.customer_paid_cents {
            let paid = Money::from_cents(paid_cents);
            if paid.is_positive() && paid < final_amount {
                return Err(EngineError::Core(CoreError::InsufficientPayment {
                    required: final_amount,
                    paid,
                }));
            }
        }

        let method: PaymentMethod = request.payment_method.parse()?;

        if let Some(customer_id) = &request.customer_id {
            order.customer_id = Some(customer_id.clone());
        }

        let payment = Payment {
            payment_id: Uuid::new_v4().to_string(),
            order_id: order.order_id.clone(),
            amount_cents: final_amount.cents(),
            payment_method: method,
            payment_date: Utc::now(),
        };
        PaymentRepository::insert(conn, &payment).await?;

        order.status = OrderStatus::Paid;

        if let Some(promo_id) = &order.promo_id {
            // Re-checks the limit inside the UPDATE: a concurrent checkout
            // that consumed the last redemption makes this one fail here
            // and roll back completely.
            if !PromotionRepository::try_increment_usage(conn, promo_id).await? {
                return Err(EngineError::Core(CoreError::PromotionUsageExceeded));
            }
        }

        debug!(
            order_id = %order.order_id,
            amount_cents = payment.amount_cents,
            method = ?method,
            "Payment finalized"
        );
        Ok(payment)
    }
}

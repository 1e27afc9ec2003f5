//! # Payment Repository
//!
//! Database operations for payment records.
//!
//! Payments are append-only: exactly one row is inserted per successful
//! checkout and nothing ever updates or deletes it.

use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::DbResult;
use storely_core::Payment;

/// Repository for payment database operations.
#[derive(Debug)]
pub struct PaymentRepository;

impl PaymentRepository {
    /// Inserts a payment record.
    pub async fn insert(conn: &mut SqliteConnection, payment: &Payment) -> DbResult<()> {
        debug!(
            order_id = %payment.order_id,
            amount_cents = payment.amount_cents,
            "Inserting payment"
        );

        sqlx::query(
            "INSERT INTO payments (payment_id, order_id, amount_cents, payment_method, payment_date) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&payment.payment_id)
        .bind(&payment.order_id)
        .bind(payment.amount_cents)
        .bind(payment.payment_method)
        .bind(payment.payment_date)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Fetches all payments recorded for an order.
    ///
    /// Under the one-payment-per-checkout invariant this is zero or one
    /// row; returning the vector lets callers assert exactly that.
    pub async fn fetch_for_order(
        conn: &mut SqliteConnection,
        order_id: &str,
    ) -> DbResult<Vec<Payment>> {
        let payments = sqlx::query_as::<_, Payment>(
            "SELECT payment_id, order_id, amount_cents, payment_method, payment_date \
             FROM payments WHERE order_id = ?1 ORDER BY payment_date",
        )
        .bind(order_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(payments)
    }
}

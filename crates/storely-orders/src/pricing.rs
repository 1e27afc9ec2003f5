//! # Pricing Engine
//!
//! Recomputes an order's total and discount from its current items.
//!
//! ## When Recompute Runs
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create with items ─┐                                                   │
//! │  addItem ───────────┤                                                   │
//! │  updateItem ────────┼──► recalculate(order) ──► persist header          │
//! │  deleteItem ────────┤                                                   │
//! │  update (customer) ─┤                                                   │
//! │  promo add/remove ──┘                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A promotion that lapsed since it was applied (window closed, total
//! dropped below the minimum, usage exhausted) is silently dropped from
//! the order here - the mutation that triggered the recompute must not
//! fail over it. Explicit application goes through the throwing
//! [`crate::promotion::PromotionValidator`] instead.

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::EngineResult;
use storely_core::{promo, Money, Order};
use storely_db::PromotionRepository;

/// Total and discount recomputation.
#[derive(Debug)]
pub struct PricingEngine;

impl PricingEngine {
    /// Recomputes the order's total as Σ quantity × price and reconciles
    /// the applied promotion's discount against it.
    ///
    /// Mutates the order in memory only; the caller persists the header.
    pub async fn recalculate(conn: &mut SqliteConnection, order: &mut Order) -> EngineResult<()> {
        let total: Money = order
            .items
            .iter()
            .map(|item| item.price().multiply_quantity(item.quantity))
            .sum();

        order.total_cents = Some(total.cents());
        order.discount_cents = 0;

        if let Some(promo_id) = order.promo_id.clone() {
            let promotion = PromotionRepository::fetch_by_id(conn, &promo_id).await?;
            match promotion {
                Some(p) if promo::is_currently_valid(&p, total, Utc::now()) => {
                    order.discount_cents = promo::compute_discount(&p, total).cents();
                }
                _ => {
                    debug!(
                        order_id = %order.order_id,
                        promo_id = %promo_id,
                        "Promotion no longer valid, dropping from order"
                    );
                    order.promo_id = None;
                }
            }
        }

        debug!(
            order_id = %order.order_id,
            total_cents = total.cents(),
            discount_cents = order.discount_cents,
            "Order recalculated"
        );
        Ok(())
    }
}

//! # Inventory Ledger
//!
//! Atomic reserve/release of per-product stock.
//!
//! ## Reserve vs Release (intentionally asymmetric)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  reserve  — STRICT                                                      │
//! │    Missing row        → InventoryNotFound                               │
//! │    Not enough stock   → InsufficientStock { available, requested }      │
//! │    The decrement is one conditional UPDATE; two concurrent              │
//! │    reservations can never jointly overdraw a product.                   │
//! │                                                                         │
//! │  release  — TOLERANT                                                    │
//! │    Missing row        → created with the released quantity              │
//! │    Release compensates an earlier reservation; failing the              │
//! │    surrounding transaction over a missing row would lose more state     │
//! │    than it protects.                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::SqliteConnection;
use tracing::{debug, warn};

use crate::error::{EngineError, EngineResult};
use storely_core::validation::validate_quantity;
use storely_core::{CoreError, Order};
use storely_db::InventoryRepository;

/// Atomic stock reservation and compensating release.
#[derive(Debug)]
pub struct InventoryLedger;

impl InventoryLedger {
    /// Reserves `quantity` units of a product, failing if the product has
    /// no inventory record or not enough stock.
    ///
    /// The check-and-decrement is a single conditional UPDATE. When it
    /// affects no row, one follow-up read distinguishes the two failure
    /// modes for the caller's error message.
    pub async fn reserve(
        conn: &mut SqliteConnection,
        product_id: &str,
        quantity: i64,
    ) -> EngineResult<()> {
        validate_quantity(quantity)?;

        if InventoryRepository::try_decrement(conn, product_id, quantity).await? {
            debug!(product_id = %product_id, quantity, "Stock reserved");
            return Ok(());
        }

        match InventoryRepository::fetch(conn, product_id).await? {
            None => Err(EngineError::Core(CoreError::InventoryNotFound(
                product_id.to_string(),
            ))),
            Some(inventory) => Err(EngineError::Core(CoreError::InsufficientStock {
                product_id: product_id.to_string(),
                available: inventory.quantity,
                requested: quantity,
            })),
        }
    }

    /// Releases `quantity` units back to a product's stock, creating the
    /// inventory record if the product never had one.
    pub async fn release(
        conn: &mut SqliteConnection,
        product_id: &str,
        quantity: i64,
    ) -> EngineResult<()> {
        validate_quantity(quantity)?;

        InventoryRepository::increment_or_insert(conn, product_id, quantity).await?;
        debug!(product_id = %product_id, quantity, "Stock released");
        Ok(())
    }

    /// Releases the stock of every line in the order that carries a
    /// product.
    ///
    /// Best-effort compensation: an individual failure is logged and the
    /// remaining lines are still released.
    pub async fn release_for_order(conn: &mut SqliteConnection, order: &Order) {
        for item in &order.items {
            let Some(product_id) = &item.product_id else {
                continue;
            };
            if let Err(e) = Self::release(conn, product_id, item.quantity).await {
                warn!(
                    order_id = %order.order_id,
                    product_id = %product_id,
                    error = %e,
                    "Best-effort stock release failed"
                );
            }
        }
    }
}

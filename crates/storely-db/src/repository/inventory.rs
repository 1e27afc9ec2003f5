//! # Inventory Repository
//!
//! Database operations for stock levels.
//!
//! ## The Conditional Decrement
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              Why reserve is ONE statement, not read-then-write          │
//! │                                                                         │
//! │  WRONG (check-then-act race):                                           │
//! │    SELECT quantity ... → 5                                              │
//! │    (another writer takes 5)                                             │
//! │    UPDATE quantity = 5 - 5   ← oversells                                │
//! │                                                                         │
//! │  RIGHT (this repository):                                               │
//! │    UPDATE inventory SET quantity = quantity - ?2                        │
//! │    WHERE product_id = ?1 AND quantity >= ?2                             │
//! │                                                                         │
//! │    rows_affected = 1 → reserved                                         │
//! │    rows_affected = 0 → row missing OR not enough stock                  │
//! │                        (caller fetches once to tell the two apart)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! The `quantity >= 0` CHECK in the schema backs the same invariant.

use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::DbResult;
use storely_core::Inventory;

/// Repository for inventory database operations.
#[derive(Debug)]
pub struct InventoryRepository;

impl InventoryRepository {
    /// Fetches the stock record for a product.
    pub async fn fetch(
        conn: &mut SqliteConnection,
        product_id: &str,
    ) -> DbResult<Option<Inventory>> {
        let inventory = sqlx::query_as::<_, Inventory>(
            "SELECT product_id, quantity FROM inventory WHERE product_id = ?1",
        )
        .bind(product_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(inventory)
    }

    /// Atomically decrements stock if at least `quantity` is available.
    ///
    /// ## Returns
    /// * `Ok(true)` - Stock decremented
    /// * `Ok(false)` - Row missing or insufficient stock; caller
    ///   distinguishes via [`InventoryRepository::fetch`]
    pub async fn try_decrement(
        conn: &mut SqliteConnection,
        product_id: &str,
        quantity: i64,
    ) -> DbResult<bool> {
        debug!(product_id = %product_id, quantity, "Reserving stock");

        let result = sqlx::query(
            "UPDATE inventory SET quantity = quantity - ?2 \
             WHERE product_id = ?1 AND quantity >= ?2",
        )
        .bind(product_id)
        .bind(quantity)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Adds stock back, creating the row if the product never had one.
    ///
    /// Release is a compensating action: a missing row must not fail the
    /// surrounding transaction, so this is an upsert.
    pub async fn increment_or_insert(
        conn: &mut SqliteConnection,
        product_id: &str,
        quantity: i64,
    ) -> DbResult<()> {
        debug!(product_id = %product_id, quantity, "Releasing stock");

        sqlx::query(
            "INSERT INTO inventory (product_id, quantity) VALUES (?1, ?2) \
             ON CONFLICT(product_id) DO UPDATE SET quantity = quantity + excluded.quantity",
        )
        .bind(product_id)
        .bind(quantity)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Inserts a stock record. Used for seeding.
    pub async fn insert(conn: &mut SqliteConnection, inventory: &Inventory) -> DbResult<()> {
        sqlx::query("INSERT INTO inventory (product_id, quantity) VALUES (?1, ?2)")
            .bind(&inventory.product_id)
            .bind(inventory.quantity)
            .execute(&mut *conn)
            .await?;

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::product::ProductRepository;
    use chrono::Utc;
    use storely_core::Product;

    async fn seed(db: &Database, product_id: &str, quantity: i64) {
        let mut conn = db.pool().acquire().await.unwrap();
        // Inventory rows reference products, so satisfy the FK first.
        ProductRepository::insert(
            &mut conn,
            &Product {
                product_id: product_id.to_string(),
                name: format!("Product {product_id}"),
                price_cents: 100,
                created_at: Utc::now(),
            },
        )
        .await
        .unwrap();
        InventoryRepository::insert(
            &mut conn,
            &Inventory {
                product_id: product_id.to_string(),
                quantity,
            },
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_decrement_of_exact_remaining_stock_succeeds_once() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        seed(&db, "prod-1", 4).await;
        let mut conn = db.pool().acquire().await.unwrap();

        // Taking everything that is left is allowed...
        assert!(InventoryRepository::try_decrement(&mut conn, "prod-1", 4)
            .await
            .unwrap());
        let left = InventoryRepository::fetch(&mut conn, "prod-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(left.quantity, 0);

        // ...but one more unit is not, and the row stays at zero.
        assert!(!InventoryRepository::try_decrement(&mut conn, "prod-1", 1)
            .await
            .unwrap());
        let left = InventoryRepository::fetch(&mut conn, "prod-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(left.quantity, 0);
    }

    #[tokio::test]
    async fn test_decrement_of_missing_row_affects_nothing() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();

        assert!(!InventoryRepository::try_decrement(&mut conn, "ghost", 1)
            .await
            .unwrap());
        assert!(InventoryRepository::fetch(&mut conn, "ghost")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_concurrent_decrements_never_overdraw() {
        // Two writers need two connections, so this test runs against a
        // file-backed database instead of the single-connection in-memory
        // config.
        let path = std::env::temp_dir().join(format!(
            "storely-inventory-race-{}.db",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);

        let db = Database::new(DbConfig::new(&path).max_connections(2))
            .await
            .unwrap();
        seed(&db, "prod-1", 5).await;

        // Both reservations want 3 of 5: only one can win.
        let (first, second) = (db.clone(), db.clone());
        let t1 = tokio::spawn(async move {
            let mut conn = first.pool().acquire().await.unwrap();
            InventoryRepository::try_decrement(&mut conn, "prod-1", 3)
                .await
                .unwrap()
        });
        let t2 = tokio::spawn(async move {
            let mut conn = second.pool().acquire().await.unwrap();
            InventoryRepository::try_decrement(&mut conn, "prod-1", 3)
                .await
                .unwrap()
        });
        let (won1, won2) = (t1.await.unwrap(), t2.await.unwrap());

        assert!(
            won1 ^ won2,
            "exactly one of two competing reservations may succeed"
        );
        let mut conn = db.pool().acquire().await.unwrap();
        let left = InventoryRepository::fetch(&mut conn, "prod-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(left.quantity, 2);
        drop(conn);

        db.close().await;
        let _ = std::fs::remove_file(&path);
        let _ = std::fs::remove_file(path.with_extension("db-wal"));
        let _ = std::fs::remove_file(path.with_extension("db-shm"));
    }
}

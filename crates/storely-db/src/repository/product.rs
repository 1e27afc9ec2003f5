//! # Product Repository
//!
//! Database operations for catalog products.
//!
//! The order engine treats the catalog as a collaborator: it only needs
//! an existence check and the price to snapshot onto a new line item.
//! Catalog administration happens in a separate service, so this
//! repository stays small (insert is kept for seeding and tests).

use sqlx::SqliteConnection;

use crate::error::DbResult;
use storely_core::Product;

/// Repository for product database operations.
#[derive(Debug)]
pub struct ProductRepository;

impl ProductRepository {
    /// Fetches a product by its id.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn fetch(
        conn: &mut SqliteConnection,
        product_id: &str,
    ) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            "SELECT product_id, name, price_cents, created_at \
             FROM products WHERE product_id = ?1",
        )
        .bind(product_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(product)
    }

    /// Inserts a product. Used for seeding.
    pub async fn insert(conn: &mut SqliteConnection, product: &Product) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO products (product_id, name, price_cents, created_at) \
             VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&product.product_id)
        .bind(&product.name)
        .bind(product.price_cents)
        .bind(product.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }
}

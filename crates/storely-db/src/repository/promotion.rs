//! # Promotion Repository
//!
//! Database operations for promotions.
//!
//! ## The Guarded Usage Increment
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │            used_count is incremented by ONE conditional UPDATE          │
//! │                                                                         │
//! │  UPDATE promotions SET used_count = used_count + 1                      │
//! │  WHERE promo_id = ?1                                                    │
//! │    AND (usage_limit = 0 OR used_count < usage_limit)                    │
//! │                                                                         │
//! │  rows_affected = 1 → redemption counted                                 │
//! │  rows_affected = 0 → limit already consumed; checkout fails with        │
//! │                      PromotionUsageExceeded and rolls back              │
//! │                                                                         │
//! │  Re-checking the limit inside the UPDATE means two concurrent           │
//! │  checkouts can never both take the last redemption.                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::DbResult;
use storely_core::Promotion;

const PROMO_COLUMNS: &str = "promo_id, promo_code, status, start_date, end_date, \
     min_order_cents, usage_limit, used_count, discount_type, discount_value";

/// Repository for promotion database operations.
#[derive(Debug)]
pub struct PromotionRepository;

impl PromotionRepository {
    /// Fetches a promotion by its id.
    pub async fn fetch_by_id(
        conn: &mut SqliteConnection,
        promo_id: &str,
    ) -> DbResult<Option<Promotion>> {
        let promotion = sqlx::query_as::<_, Promotion>(&format!(
            "SELECT {PROMO_COLUMNS} FROM promotions WHERE promo_id = ?1"
        ))
        .bind(promo_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(promotion)
    }

    /// Fetches a promotion by its human-facing code (exact match).
    pub async fn fetch_by_code(
        conn: &mut SqliteConnection,
        promo_code: &str,
    ) -> DbResult<Option<Promotion>> {
        let promotion = sqlx::query_as::<_, Promotion>(&format!(
            "SELECT {PROMO_COLUMNS} FROM promotions WHERE promo_code = ?1"
        ))
        .bind(promo_code)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(promotion)
    }

    /// Counts a redemption, guarded by the usage limit.
    ///
    /// ## Returns
    /// * `Ok(true)` - Redemption counted
    /// * `Ok(false)` - Limit already consumed (or promotion missing)
    pub async fn try_increment_usage(
        conn: &mut SqliteConnection,
        promo_id: &str,
    ) -> DbResult<bool> {
        debug!(promo_id = %promo_id, "Counting promotion redemption");

        let result = sqlx::query(
            "UPDATE promotions SET used_count = used_count + 1 \
             WHERE promo_id = ?1 AND (usage_limit = 0 OR used_count < usage_limit)",
        )
        .bind(promo_id)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Inserts a promotion. Used for seeding; promotions are otherwise
    /// administered outside this engine.
    pub async fn insert(conn: &mut SqliteConnection, promotion: &Promotion) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO promotions \
             (promo_id, promo_code, status, start_date, end_date, min_order_cents, \
              usage_limit, used_count, discount_type, discount_value) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )
        .bind(&promotion.promo_id)
        .bind(&promotion.promo_code)
        .bind(&promotion.status)
        .bind(promotion.start_date)
        .bind(promotion.end_date)
        .bind(promotion.min_order_cents)
        .bind(promotion.usage_limit)
        .bind(promotion.used_count)
        .bind(promotion.discount_type)
        .bind(promotion.discount_value)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }
}

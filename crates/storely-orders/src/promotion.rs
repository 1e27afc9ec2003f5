//! # Promotion Validator
//!
//! Lookup plus the throwing eligibility checks from storely-core, used
//! when a promotion is explicitly applied (create, applyPromotion,
//! checkout with a code). The *silent* counterpart lives in the Pricing
//! Engine's recompute.

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::{EngineError, EngineResult};
use storely_core::validation::validate_promo_code;
use storely_core::{promo, CoreError, Money, Promotion};
use storely_db::PromotionRepository;

/// Throwing promotion validation against the current order total.
#[derive(Debug)]
pub struct PromotionValidator;

impl PromotionValidator {
    /// Looks a promotion up by code and validates it for redemption.
    ///
    /// Fails with `PromotionNotFound` when the code is unknown, otherwise
    /// with the first violated eligibility rule, in the fixed order the
    /// API maps to user messages.
    pub async fn validate_by_code(
        conn: &mut SqliteConnection,
        promo_code: &str,
        order_total: Money,
    ) -> EngineResult<Promotion> {
        validate_promo_code(promo_code)?;

        let code = promo_code.trim();
        let promotion = PromotionRepository::fetch_by_code(conn, code)
            .await?
            .ok_or_else(|| CoreError::PromotionNotFound(code.to_string()))?;

        Self::check(&promotion, order_total)?;
        Ok(promotion)
    }

    /// Looks a promotion up by id and validates it for redemption.
    pub async fn validate_by_id(
        conn: &mut SqliteConnection,
        promo_id: &str,
        order_total: Money,
    ) -> EngineResult<Promotion> {
        let promotion = PromotionRepository::fetch_by_id(conn, promo_id)
            .await?
            .ok_or_else(|| CoreError::PromotionNotFound(promo_id.to_string()))?;

        Self::check(&promotion, order_total)?;
        Ok(promotion)
    }

    fn check(promotion: &Promotion, order_total: Money) -> EngineResult<()> {
        promo::check_redeemable(promotion, order_total, Utc::now()).map_err(EngineError::Core)?;
        debug!(
            promo_id = %promotion.promo_id,
            promo_code = %promotion.promo_code,
            "Promotion validated"
        );
        Ok(())
    }
}

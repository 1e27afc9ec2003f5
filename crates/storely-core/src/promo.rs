//! # Promotion Rules
//!
//! Pure promotion eligibility and discount math. No I/O: callers load the
//! `Promotion` and pass it in together with the order total and `now`.
//!
//! ## Two Validation Modes (intentionally asymmetric)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  check_redeemable()  — THROWING, ordered                                │
//! │    Used when the user explicitly applies a code. The first failed      │
//! │    rule wins so the API can tell the user exactly what is wrong.       │
//! │                                                                         │
//! │  is_currently_valid() — SILENT predicate                                │
//! │    Used during recalculation triggered by unrelated mutations          │
//! │    (add/remove item). A lapsed promotion is dropped from the order,    │
//! │    never turned into an error for the whole operation.                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! Do not unify these: the asymmetry is per call site.

use chrono::{DateTime, Utc};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{DiscountType, Promotion};

/// Validates a promotion for explicit application, failing fast with a
/// specific error on the first violated rule.
///
/// ## Rule Order (must not change — the API maps errors 1:1 to messages)
/// 1. not active          → PromotionInactive
/// 2. now < start_date    → PromotionNotStarted
/// 3. now > end_date      → PromotionExpired
/// 4. total < minimum     → PromotionMinimumNotMet (only when minimum > 0)
/// 5. usage exhausted     → PromotionUsageExceeded (only when limit > 0)
pub fn check_redeemable(
    promotion: &Promotion,
    order_total: Money,
    now: DateTime<Utc>,
) -> CoreResult<()> {
    if !promotion.is_active() {
        return Err(CoreError::PromotionInactive);
    }
    if now < promotion.start_date {
        return Err(CoreError::PromotionNotStarted);
    }
    if now > promotion.end_date {
        return Err(CoreError::PromotionExpired);
    }
    if promotion.min_order_cents > 0 && order_total < promotion.min_order_amount() {
        return Err(CoreError::PromotionMinimumNotMet {
            minimum: promotion.min_order_amount(),
        });
    }
    if promotion.usage_limit > 0 && promotion.used_count >= promotion.usage_limit {
        return Err(CoreError::PromotionUsageExceeded);
    }
    Ok(())
}

/// Silent validity predicate used by recalculation.
///
/// Same five conditions as [`check_redeemable`], collapsed to a bool: the
/// pricing engine drops a lapsed promotion instead of failing the
/// surrounding mutation.
pub fn is_currently_valid(promotion: &Promotion, order_total: Money, now: DateTime<Utc>) -> bool {
    promotion.is_active()
        && now >= promotion.start_date
        && now <= promotion.end_date
        && order_total >= promotion.min_order_amount()
        && (promotion.usage_limit == 0 || promotion.used_count < promotion.usage_limit)
}

/// Computes the discount a promotion grants on an order amount.
///
/// Percent promotions take their share of the amount (basis points);
/// fixed promotions are capped so the discount never exceeds the amount.
/// Pure function, no rounding beyond integer-cent math.
pub fn compute_discount(promotion: &Promotion, order_amount: Money) -> Money {
    match promotion.discount_type {
        DiscountType::Percent => order_amount.percentage(promotion.discount_value),
        DiscountType::FixedAmount => {
            Money::from_cents(promotion.discount_value).min(order_amount)
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn promo() -> Promotion {
        let now = Utc::now();
        Promotion {
            promo_id: "p1".into(),
            promo_code: "SAVE10".into(),
            status: "active".into(),
            start_date: now - Duration::days(1),
            end_date: now + Duration::days(1),
            min_order_cents: 2000,
            usage_limit: 3,
            used_count: 0,
            discount_type: DiscountType::Percent,
            discount_value: 1000,
        }
    }

    #[test]
    fn test_redeemable_happy_path() {
        let p = promo();
        assert!(check_redeemable(&p, Money::from_cents(2500), Utc::now()).is_ok());
    }

    #[test]
    fn test_inactive_wins_over_everything() {
        let mut p = promo();
        p.status = "paused".into();
        p.used_count = 3; // usage also exhausted, but inactive is checked first
        let err = check_redeemable(&p, Money::from_cents(2500), Utc::now()).unwrap_err();
        assert!(matches!(err, CoreError::PromotionInactive));
    }

    #[test]
    fn test_not_started() {
        let mut p = promo();
        p.start_date = Utc::now() + Duration::hours(1);
        let err = check_redeemable(&p, Money::from_cents(2500), Utc::now()).unwrap_err();
        assert!(matches!(err, CoreError::PromotionNotStarted));
    }

    #[test]
    fn test_expired() {
        let mut p = promo();
        p.end_date = Utc::now() - Duration::hours(1);
        let err = check_redeemable(&p, Money::from_cents(2500), Utc::now()).unwrap_err();
        assert!(matches!(err, CoreError::PromotionExpired));
    }

    #[test]
    fn test_minimum_not_met() {
        let p = promo();
        let err = check_redeemable(&p, Money::from_cents(1999), Utc::now()).unwrap_err();
        assert!(matches!(err, CoreError::PromotionMinimumNotMet { .. }));
    }

    #[test]
    fn test_minimum_skipped_when_zero() {
        let mut p = promo();
        p.min_order_cents = 0;
        assert!(check_redeemable(&p, Money::zero(), Utc::now()).is_ok());
    }

    #[test]
    fn test_usage_exhausted() {
        let mut p = promo();
        p.used_count = 3;
        let err = check_redeemable(&p, Money::from_cents(2500), Utc::now()).unwrap_err();
        assert!(matches!(err, CoreError::PromotionUsageExceeded));
    }

    #[test]
    fn test_unlimited_usage() {
        let mut p = promo();
        p.usage_limit = 0;
        p.used_count = 9999;
        assert!(check_redeemable(&p, Money::from_cents(2500), Utc::now()).is_ok());
    }

    #[test]
    fn test_silent_predicate_mirrors_throwing_rules() {
        let now = Utc::now();
        let mut p = promo();
        assert!(is_currently_valid(&p, Money::from_cents(2500), now));
        assert!(!is_currently_valid(&p, Money::from_cents(1999), now));
        p.used_count = 3;
        assert!(!is_currently_valid(&p, Money::from_cents(2500), now));
    }

    #[test]
    fn test_percent_discount() {
        let p = promo();
        // 10% of $25.00 = $2.50
        assert_eq!(
            compute_discount(&p, Money::from_cents(2500)).cents(),
            250
        );
    }

    #[test]
    fn test_fixed_discount_capped_at_order_amount() {
        let mut p = promo();
        p.discount_type = DiscountType::FixedAmount;
        p.discount_value = 5000; // $50 off
        assert_eq!(
            compute_discount(&p, Money::from_cents(2500)).cents(),
            2500
        );
        assert_eq!(
            compute_discount(&p, Money::from_cents(9000)).cents(),
            5000
        );
    }
}

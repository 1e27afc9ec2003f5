//! # Domain Types
//!
//! Core domain types used throughout Storely.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Order       │   │   OrderItem     │   │    Payment      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  order_id       │──►│  order_item_id  │   │  payment_id     │       │
//! │  │  status         │   │  product_id?    │   │  order_id (FK)  │       │
//! │  │  total_cents    │   │  price (frozen) │   │  method         │       │
//! │  │  promo_id?      │   │  subtotal_cents │   │  amount_cents   │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   Promotion     │   │   Inventory     │   │    Product      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  promo_code     │   │  product_id PK  │   │  product_id     │       │
//! │  │  window/usage   │   │  quantity ≥ 0   │   │  price_cents    │       │
//! │  │  discount rule  │   └─────────────────┘   └─────────────────┘       │
//! │  └─────────────────┘                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Ownership
//! An Order exclusively owns its OrderItems (one consistency boundary).
//! Inventory, Promotion and Payment are independent aggregates referenced
//! by id from the order — association only, no ownership.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::CoreError;
use crate::money::Money;

// =============================================================================
// Order Status
// =============================================================================

/// The lifecycle state of an order.
///
/// ## State Machine
/// ```text
/// Pending ──checkout──► Paid      (terminal)
///    └─────cancel─────► Canceled  (terminal)
/// ```
/// An order is mutable only while Pending. There is no transition out of
/// Paid or Canceled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Order is open: items, customer and promotion may change.
    Pending,
    /// Order has been paid via checkout. Terminal.
    Paid,
    /// Order was canceled and its stock released. Terminal.
    Canceled,
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Canceled => "canceled",
        };
        f.write_str(s)
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// Supported payment methods. A closed set, decided entirely by data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash payment.
    Cash,
    /// Card payment on external terminal.
    Card,
    /// Bank transfer reference captured at the till.
    BankTransfer,
}

/// Parses a payment method from a request string, case-insensitively.
///
/// The API layer sends the method as free text; anything outside the
/// closed set fails with `InvalidPaymentMethod`.
impl FromStr for PaymentMethod {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "card" => Ok(PaymentMethod::Card),
            "bank_transfer" | "banktransfer" => Ok(PaymentMethod::BankTransfer),
            _ => Err(CoreError::InvalidPaymentMethod(s.to_string())),
        }
    }
}

// =============================================================================
// Discount Type
// =============================================================================

/// How a promotion's `discount_value` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    /// `discount_value` is in basis points (1000 = 10% off the total).
    Percent,
    /// `discount_value` is in cents, capped at the order total.
    FixedAmount,
}

// =============================================================================
// Order
// =============================================================================

/// An order and the fields persisted for it.
///
/// `total_cents` is None until the first recompute; after any recompute it
/// equals the sum of item subtotals. `discount_cents` is non-negative and
/// only non-zero while `promo_id` points at a currently valid promotion.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Order {
    pub order_id: String,
    pub customer_id: Option<String>,
    /// User (cashier/clerk) who created the order.
    pub user_id: Option<String>,
    pub status: OrderStatus,
    /// Creation timestamp. Immutable.
    #[ts(as = "String")]
    pub order_date: DateTime<Utc>,
    /// Sum of item subtotals. None until the first recompute.
    pub total_cents: Option<i64>,
    pub discount_cents: i64,
    /// Applied promotion, if any.
    pub promo_id: Option<String>,
    /// Owned line items. Loaded by fetch-with-details, not by list queries.
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    pub items: Vec<OrderItem>,
}

impl Order {
    /// Checks whether the order is still open for mutation.
    #[inline]
    pub fn is_pending(&self) -> bool {
        self.status == OrderStatus::Pending
    }

    /// Returns the current total as Money (zero before the first recompute).
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents.unwrap_or(0))
    }

    /// Returns the current discount as Money.
    #[inline]
    pub fn discount(&self) -> Money {
        Money::from_cents(self.discount_cents)
    }

    /// The amount actually due at checkout: max(0, total − discount).
    #[inline]
    pub fn final_amount(&self) -> Money {
        (self.total() - self.discount()).floor_at_zero()
    }

    /// Finds an item by its id.
    pub fn item(&self, order_item_id: &str) -> Option<&OrderItem> {
        self.items.iter().find(|i| i.order_item_id == order_item_id)
    }

    /// Finds an item by its id, mutably.
    pub fn item_mut(&mut self, order_item_id: &str) -> Option<&mut OrderItem> {
        self.items
            .iter_mut()
            .find(|i| i.order_item_id == order_item_id)
    }

    /// Finds the line carrying a given product, mutably.
    ///
    /// Used by add-item to merge quantities instead of duplicating lines.
    pub fn item_for_product_mut(&mut self, product_id: &str) -> Option<&mut OrderItem> {
        self.items
            .iter_mut()
            .find(|i| i.product_id.as_deref() == Some(product_id))
    }
}

// =============================================================================
// Order Item
// =============================================================================

/// A line item in an order.
///
/// `price_cents` is a snapshot of the product price at the time the line
/// was added and never changes afterwards, so historical orders keep their
/// amounts even when catalog prices move.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OrderItem {
    pub order_item_id: String,
    pub order_id: String,
    /// Absence means the line carries no inventory backing.
    pub product_id: Option<String>,
    /// Quantity ordered. Always > 0.
    pub quantity: i64,
    /// Unit price snapshot in cents. Immutable once set.
    pub price_cents: i64,
    /// quantity × price, recomputed on every quantity change.
    pub subtotal_cents: i64,
}

impl OrderItem {
    /// Returns the unit price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Returns the line subtotal as Money.
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }

    /// Recomputes the subtotal from the current quantity and price.
    pub fn recompute_subtotal(&mut self) {
        self.subtotal_cents = self.price().multiply_quantity(self.quantity).cents();
    }
}

// =============================================================================
// Inventory
// =============================================================================

/// Available stock for a product. One record per product.
///
/// The `quantity >= 0` invariant is enforced by the Inventory Ledger
/// before any decrement (and backed by a CHECK constraint in the schema).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Inventory {
    pub product_id: String,
    pub quantity: i64,
}

// =============================================================================
// Promotion
// =============================================================================

/// A promotion that can be applied to orders.
///
/// Mutated only by the used_count increment at successful checkout;
/// everything else is managed by administration outside this engine.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Promotion {
    pub promo_id: String,
    /// Human-facing code, unique across promotions.
    pub promo_code: String,
    /// Free-form status string; "active" (case-insensitive) enables the promo.
    pub status: String,
    #[ts(as = "String")]
    pub start_date: DateTime<Utc>,
    #[ts(as = "String")]
    pub end_date: DateTime<Utc>,
    /// Minimum order total for eligibility, in cents. 0 = no minimum.
    pub min_order_cents: i64,
    /// Maximum number of redemptions. 0 = unlimited.
    pub usage_limit: i64,
    /// Redemptions so far. Monotonic; incremented only at checkout.
    pub used_count: i64,
    pub discount_type: DiscountType,
    /// Basis points for Percent, cents for FixedAmount.
    pub discount_value: i64,
}

impl Promotion {
    /// Status check, case-insensitive per the admin tool's conventions.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.status.eq_ignore_ascii_case("active")
    }

    /// Returns the minimum order amount as Money.
    #[inline]
    pub fn min_order_amount(&self) -> Money {
        Money::from_cents(self.min_order_cents)
    }
}

// =============================================================================
// Payment
// =============================================================================

/// A payment record. Immutable once created; created exactly once per
/// successful checkout with the order's final amount.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Payment {
    pub payment_id: String,
    pub order_id: String,
    /// Final amount snapshot in cents.
    pub amount_cents: i64,
    pub payment_method: PaymentMethod,
    #[ts(as = "String")]
    pub payment_date: DateTime<Utc>,
}

impl Payment {
    /// Returns the payment amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Product
// =============================================================================

/// A catalog product. The order engine only reads it: existence check plus
/// the price snapshot taken when a line is added.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub product_id: String,
    pub name: String,
    pub price_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

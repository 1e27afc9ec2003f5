//! # Operation Requests
//!
//! Typed inputs for the order engine's public operations. The API layer
//! deserializes these from its wire format; inside the engine they are
//! plain data.

use serde::{Deserialize, Serialize};

/// One requested order line: which product, how many.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLineRequest {
    pub product_id: String,
    pub quantity: i64,
}

/// Input for creating an order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub customer_id: Option<String>,
    /// User (cashier/clerk) creating the order.
    pub user_id: Option<String>,
    pub items: Vec<OrderLineRequest>,
    /// Promotion applied at creation, by id. Validated throwing.
    pub promo_id: Option<String>,
}

/// Input for updating an order's header fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateOrderRequest {
    pub customer_id: Option<String>,
}

/// Input for checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    /// Tendered amount in cents. Must equal the order's final amount
    /// exactly.
    pub amount_cents: i64,
    /// Payment method as free text; parsed case-insensitively into the
    /// closed method set.
    pub payment_method: String,
    /// Cash handed over by the customer, when tracked. Checked against
    /// the final amount only when provided and positive.
    pub customer_paid_cents: Option<i64>,
    /// Customer to attach to the order at payment time.
    pub customer_id: Option<String>,
    /// Promotion code applied at the till, validated throwing before
    /// payment is finalized.
    pub promo_code: Option<String>,
}

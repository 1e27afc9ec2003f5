//! # Order Lifecycle Orchestrator
//!
//! The entry point of the order engine. Every public operation opens one
//! unit of work, sequences the ledger / validator / pricing / finalizer
//! calls inside it, and commits or rolls back as a whole.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │     create ──► Pending ──checkout──► Paid      (terminal)              │
//! │                   │                                                     │
//! │                   └──────cancel────► Canceled  (terminal)              │
//! │                                                                         │
//! │  While Pending: update, addItem, updateItem, deleteItem,               │
//! │                 applyPromotion, removePromotion                        │
//! │  Terminal states accept no mutation at all.                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Atomicity
//! Any error aborts the whole operation: inventory decrements already
//! applied earlier in the same operation are rolled back with the order
//! and item writes. Nothing is retried; errors reach the caller unchanged.

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::info;
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::inventory::InventoryLedger;
use crate::payment::PaymentFinalizer;
use crate::pricing::PricingEngine;
use crate::promotion::PromotionValidator;
use crate::requests::{CheckoutRequest, CreateOrderRequest, OrderLineRequest, UpdateOrderRequest};
use crate::uow::UnitOfWork;
use storely_core::validation::validate_quantity;
use storely_core::{promo, CoreError, Order, OrderItem, OrderStatus, Product};
use storely_db::{
    Database, DbError, OrderListFilter, OrderRepository, OrderSortField, ProductRepository,
};

/// The order lifecycle engine.
///
/// Cheap to clone; clones share the underlying pool.
#[derive(Debug, Clone)]
pub struct OrderService {
    db: Database,
}

impl OrderService {
    /// Creates a new order service over a database handle.
    pub fn new(db: Database) -> Self {
        OrderService { db }
    }

    // =========================================================================
    // Public Operations
    // =========================================================================

    /// Creates a new Pending order, reserving stock for every line.
    pub async fn create(&self, request: CreateOrderRequest) -> EngineResult<Order> {
        let mut uow = UnitOfWork::begin(&self.db).await?;
        match Self::create_in(uow.conn(), request).await {
            Ok(order) => {
                uow.commit().await?;
                info!(order_id = %order.order_id, items = order.items.len(), "Order created");
                Ok(order)
            }
            Err(err) => {
                uow.rollback().await;
                Err(err)
            }
        }
    }

    /// Fetches an order with its items.
    pub async fn get(&self, order_id: &str) -> EngineResult<Option<Order>> {
        let mut conn = self.db.pool().acquire().await.map_err(DbError::from)?;
        let order = OrderRepository::fetch(&mut conn, order_id).await?;
        Ok(order)
    }

    /// Lists orders with filtering, sorting and pagination.
    ///
    /// Returns the page of orders (without items) and the total count
    /// over the filter.
    pub async fn list_paged(
        &self,
        filter: &OrderListFilter,
        sort: OrderSortField,
        desc: bool,
        page: i64,
        page_size: i64,
    ) -> EngineResult<(Vec<Order>, i64)> {
        let mut conn = self.db.pool().acquire().await.map_err(DbError::from)?;
        let result =
            OrderRepository::list_paged(&mut conn, filter, sort, desc, page, page_size).await?;
        Ok(result)
    }

    /// Updates an order's header (customer) and recomputes totals.
    ///
    /// Returns `Ok(None)` when the order does not exist; all other guard
    /// violations are errors.
    pub async fn update(
        &self,
        order_id: &str,
        request: UpdateOrderRequest,
    ) -> EngineResult<Option<Order>> {
        let mut uow = UnitOfWork::begin(&self.db).await?;
        match Self::update_in(uow.conn(), order_id, request).await {
            Ok(order) => {
                uow.commit().await?;
                if order.is_some() {
                    info!(order_id = %order_id, "Order updated");
                }
                Ok(order)
            }
            Err(err) => {
                uow.rollback().await;
                Err(err)
            }
        }
    }

    /// Adds a line to a Pending order, merging into an existing line for
    /// the same product.
    pub async fn add_item(&self, order_id: &str, line: OrderLineRequest) -> EngineResult<Order> {
        let mut uow = UnitOfWork::begin(&self.db).await?;
        match Self::add_item_in(uow.conn(), order_id, line).await {
            Ok(order) => {
                uow.commit().await?;
                info!(order_id = %order_id, "Item added to order");
                Ok(order)
            }
            Err(err) => {
                uow.rollback().await;
                Err(err)
            }
        }
    }

    /// Changes a line's quantity, reserving a positive delta or releasing
    /// a negative one.
    pub async fn update_item(
        &self,
        order_id: &str,
        order_item_id: &str,
        quantity: i64,
    ) -> EngineResult<Order> {
        let mut uow = UnitOfWork::begin(&self.db).await?;
        match Self::update_item_in(uow.conn(), order_id, order_item_id, quantity).await {
            Ok(order) => {
                uow.commit().await?;
                info!(order_id = %order_id, order_item_id = %order_item_id, "Order item updated");
                Ok(order)
            }
            Err(err) => {
                uow.rollback().await;
                Err(err)
            }
        }
    }

    /// Removes a line from a Pending order, releasing its reserved stock.
    pub async fn delete_item(&self, order_id: &str, order_item_id: &str) -> EngineResult<Order> {
        let mut uow = UnitOfWork::begin(&self.db).await?;
        match Self::delete_item_in(uow.conn(), order_id, order_item_id).await {
            Ok(order) => {
                uow.commit().await?;
                info!(order_id = %order_id, order_item_id = %order_item_id, "Order item deleted");
                Ok(order)
            }
            Err(err) => {
                uow.rollback().await;
                Err(err)
            }
        }
    }

    /// Applies a promotion code to a Pending order with at least one
    /// item, validating it (throwing) against the current total.
    pub async fn apply_promotion(&self, order_id: &str, promo_code: &str) -> EngineResult<Order> {
        let mut uow = UnitOfWork::begin(&self.db).await?;
        match Self::apply_promotion_in(uow.conn(), order_id, promo_code).await {
            Ok(order) => {
                uow.commit().await?;
                info!(order_id = %order_id, promo_code = %promo_code, "Promotion applied");
                Ok(order)
            }
            Err(err) => {
                uow.rollback().await;
                Err(err)
            }
        }
    }

    /// Removes the applied promotion from a Pending order.
    pub async fn remove_promotion(&self, order_id: &str) -> EngineResult<Order> {
        let mut uow = UnitOfWork::begin(&self.db).await?;
        match Self::remove_promotion_in(uow.conn(), order_id).await {
            Ok(order) => {
                uow.commit().await?;
                info!(order_id = %order_id, "Promotion removed");
                Ok(order)
            }
            Err(err) => {
                uow.rollback().await;
                Err(err)
            }
        }
    }

    /// Cancels a Pending order, releasing all reserved stock.
    ///
    /// Returns `Ok(false)` when the order does not exist. Canceling a
    /// Paid or already Canceled order is an `InvalidState` error.
    pub async fn cancel(&self, order_id: &str) -> EngineResult<bool> {
        let mut uow = UnitOfWork::begin(&self.db).await?;
        match Self::cancel_in(uow.conn(), order_id).await {
            Ok(found) => {
                uow.commit().await?;
                if found {
                    info!(order_id = %order_id, "Order canceled");
                }
                Ok(found)
            }
            Err(err) => {
                uow.rollback().await;
                Err(err)
            }
        }
    }

    /// Checks a Pending order out: recompute, optional promo code, then
    /// the Payment Finalizer. On success the order is Paid.
    pub async fn checkout(&self, order_id: &str, request: CheckoutRequest) -> EngineResult<Order> {
        let mut uow = UnitOfWork::begin(&self.db).await?;
        match Self::checkout_in(uow.conn(), order_id, request).await {
            Ok(order) => {
                uow.commit().await?;
                info!(
                    order_id = %order.order_id,
                    total_cents = order.total_cents,
                    discount_cents = order.discount_cents,
                    "Order checked out"
                );
                Ok(order)
            }
            Err(err) => {
                uow.rollback().await;
                Err(err)
            }
        }
    }

    // =========================================================================
    // Transaction Bodies
    // =========================================================================

    async fn create_in(
        conn: &mut SqliteConnection,
        request: CreateOrderRequest,
    ) -> EngineResult<Order> {
        let mut order = Order {
            order_id: new_id(),
            customer_id: request.customer_id,
            user_id: request.user_id,
            status: OrderStatus::Pending,
            order_date: Utc::now(),
            total_cents: None,
            discount_cents: 0,
            promo_id: None,
            items: Vec::new(),
        };

        for line in &request.items {
            let item = Self::build_line(conn, &order.order_id, line).await?;
            order.items.push(item);
        }

        PricingEngine::recalculate(conn, &mut order).await?;

        if let Some(promo_id) = &request.promo_id {
            let promotion =
                PromotionValidator::validate_by_id(conn, promo_id, order.total()).await?;
            order.discount_cents = promo::compute_discount(&promotion, order.total()).cents();
            order.promo_id = Some(promotion.promo_id);
        }

        OrderRepository::insert(conn, &order).await?;
        for item in &order.items {
            OrderRepository::insert_item(conn, item).await?;
        }

        Ok(order)
    }

    async fn update_in(
        conn: &mut SqliteConnection,
        order_id: &str,
        request: UpdateOrderRequest,
    ) -> EngineResult<Option<Order>> {
        let Some(mut order) = OrderRepository::fetch(conn, order_id).await? else {
            return Ok(None);
        };
        ensure_pending(&order, "update")?;

        order.customer_id = request.customer_id;

        PricingEngine::recalculate(conn, &mut order).await?;
        OrderRepository::update(conn, &order).await?;
        Ok(Some(order))
    }

    async fn add_item_in(
        conn: &mut SqliteConnection,
        order_id: &str,
        line: OrderLineRequest,
    ) -> EngineResult<Order> {
        let mut order = Self::fetch_required(conn, order_id).await?;
        ensure_pending(&order, "add an item to")?;
        validate_quantity(line.quantity)?;

        // Reserve before touching the line so an insufficient-stock
        // failure leaves nothing half-written.
        let product = Self::require_product(conn, &line.product_id).await?;
        InventoryLedger::reserve(conn, &line.product_id, line.quantity).await?;

        let merged = match order.item_for_product_mut(&line.product_id) {
            Some(existing) => {
                existing.quantity += line.quantity;
                existing.recompute_subtotal();
                Some(existing.clone())
            }
            None => None,
        };

        match merged {
            Some(item) => OrderRepository::update_item(conn, &item).await?,
            None => {
                let item = line_from_product(order_id, &line, &product);
                OrderRepository::insert_item(conn, &item).await?;
                order.items.push(item);
            }
        }

        PricingEngine::recalculate(conn, &mut order).await?;
        OrderRepository::update(conn, &order).await?;
        Ok(order)
    }

    async fn update_item_in(
        conn: &mut SqliteConnection,
        order_id: &str,
        order_item_id: &str,
        quantity: i64,
    ) -> EngineResult<Order> {
        let mut order = Self::fetch_required(conn, order_id).await?;
        ensure_pending(&order, "update an item of")?;
        validate_quantity(quantity)?;

        let (delta, product_id) = {
            let item = order
                .item(order_item_id)
                .ok_or_else(|| CoreError::ItemNotFound(order_item_id.to_string()))?;
            (quantity - item.quantity, item.product_id.clone())
        };

        match (&product_id, delta) {
            (Some(pid), d) if d > 0 => InventoryLedger::reserve(conn, pid, d).await?,
            (Some(pid), d) if d < 0 => InventoryLedger::release(conn, pid, -d).await?,
            (None, d) if d > 0 => {
                return Err(EngineError::Core(CoreError::invalid_state(
                    order_id,
                    order.status,
                    "cannot increase the quantity of a line without a product",
                )));
            }
            _ => {}
        }

        let updated = {
            let item = order
                .item_mut(order_item_id)
                .ok_or_else(|| CoreError::ItemNotFound(order_item_id.to_string()))?;
            item.quantity = quantity;
            item.recompute_subtotal();
            item.clone()
        };
        OrderRepository::update_item(conn, &updated).await?;

        PricingEngine::recalculate(conn, &mut order).await?;
        OrderRepository::update(conn, &order).await?;
        Ok(order)
    }

    async fn delete_item_in(
        conn: &mut SqliteConnection,
        order_id: &str,
        order_item_id: &str,
    ) -> EngineResult<Order> {
        let mut order = Self::fetch_required(conn, order_id).await?;
        ensure_pending(&order, "delete an item from")?;

        let (quantity, product_id) = {
            let item = order
                .item(order_item_id)
                .ok_or_else(|| CoreError::ItemNotFound(order_item_id.to_string()))?;
            (item.quantity, item.product_id.clone())
        };

        if let Some(pid) = &product_id {
            InventoryLedger::release(conn, pid, quantity).await?;
        }

        OrderRepository::delete_item(conn, order_item_id).await?;
        order.items.retain(|i| i.order_item_id != order_item_id);

        PricingEngine::recalculate(conn, &mut order).await?;
        OrderRepository::update(conn, &order).await?;
        Ok(order)
    }

    async fn apply_promotion_in(
        conn: &mut SqliteConnection,
        order_id: &str,
        promo_code: &str,
    ) -> EngineResult<Order> {
        let mut order = Self::fetch_required(conn, order_id).await?;
        ensure_pending(&order, "apply a promotion to")?;
        if order.items.is_empty() {
            return Err(EngineError::Core(CoreError::EmptyOrder(
                order_id.to_string(),
            )));
        }

        PricingEngine::recalculate(conn, &mut order).await?;

        let promotion =
            PromotionValidator::validate_by_code(conn, promo_code, order.total()).await?;
        order.discount_cents = promo::compute_discount(&promotion, order.total()).cents();
        order.promo_id = Some(promotion.promo_id);

        OrderRepository::update(conn, &order).await?;
        Ok(order)
    }

    async fn remove_promotion_in(
        conn: &mut SqliteConnection,
        order_id: &str,
    ) -> EngineResult<Order> {
        let mut order = Self::fetch_required(conn, order_id).await?;
        ensure_pending(&order, "remove a promotion from")?;

        if order.promo_id.is_none() {
            return Err(EngineError::Core(CoreError::invalid_state(
                order_id,
                order.status,
                "no promotion applied",
            )));
        }

        order.promo_id = None;
        PricingEngine::recalculate(conn, &mut order).await?;
        OrderRepository::update(conn, &order).await?;
        Ok(order)
    }

    async fn cancel_in(conn: &mut SqliteConnection, order_id: &str) -> EngineResult<bool> {
        let Some(mut order) = OrderRepository::fetch(conn, order_id).await? else {
            return Ok(false);
        };
        ensure_pending(&order, "cancel")?;

        InventoryLedger::release_for_order(conn, &order).await;

        order.status = OrderStatus::Canceled;
        OrderRepository::update(conn, &order).await?;
        Ok(true)
    }

    async fn checkout_in(
        conn: &mut SqliteConnection,
        order_id: &str,
        request: CheckoutRequest,
    ) -> EngineResult<Order> {
        let mut order = Self::fetch_required(conn, order_id).await?;
        ensure_pending(&order, "check out")?;
        if order.items.is_empty() {
            return Err(EngineError::Core(CoreError::EmptyOrder(
                order_id.to_string(),
            )));
        }

        PricingEngine::recalculate(conn, &mut order).await?;

        if let Some(code) = &request.promo_code {
            let promotion =
                PromotionValidator::validate_by_code(conn, code, order.total()).await?;
            order.discount_cents = promo::compute_discount(&promotion, order.total()).cents();
            order.promo_id = Some(promotion.promo_id);
        }

        PaymentFinalizer::finalize(conn, &mut order, &request).await?;

        OrderRepository::update(conn, &order).await?;
        Ok(order)
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    async fn fetch_required(conn: &mut SqliteConnection, order_id: &str) -> EngineResult<Order> {
        OrderRepository::fetch(conn, order_id)
            .await?
            .ok_or_else(|| EngineError::Core(CoreError::OrderNotFound(order_id.to_string())))
    }

    async fn require_product(
        conn: &mut SqliteConnection,
        product_id: &str,
    ) -> EngineResult<Product> {
        ProductRepository::fetch(conn, product_id)
            .await?
            .ok_or_else(|| EngineError::Core(CoreError::ProductNotFound(product_id.to_string())))
    }

    /// Builds a reserved line for create: existence check, stock
    /// reservation, price snapshot.
    async fn build_line(
        conn: &mut SqliteConnection,
        order_id: &str,
        line: &OrderLineRequest,
    ) -> EngineResult<OrderItem> {
        validate_quantity(line.quantity)?;
        let product = Self::require_product(conn, &line.product_id).await?;
        InventoryLedger::reserve(conn, &line.product_id, line.quantity).await?;
        Ok(line_from_product(order_id, line, &product))
    }
}

/// Builds a line with the product's current price snapshotted onto it.
/// Stock must already be reserved by the caller.
fn line_from_product(order_id: &str, line: &OrderLineRequest, product: &Product) -> OrderItem {
    let mut item = OrderItem {
        order_item_id: new_id(),
        order_id: order_id.to_string(),
        product_id: Some(line.product_id.clone()),
        quantity: line.quantity,
        price_cents: product.price_cents,
        subtotal_cents: 0,
    };
    item.recompute_subtotal();
    item
}

/// Checks the order is still open for mutation.
fn ensure_pending(order: &Order, action: &str) -> EngineResult<()> {
    if order.is_pending() {
        Ok(())
    } else {
        Err(EngineError::Core(CoreError::invalid_state(
            &order.order_id,
            order.status,
            format!("cannot {action} a {} order", order.status),
        )))
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

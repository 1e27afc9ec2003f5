//! # Order Repository
//!
//! Database operations for orders and their line items.
//!
//! ## Key Operations
//! - Insert / fetch-with-items / header update
//! - Line item CRUD
//! - Paged, filtered, sorted listing with a stable id tie-break
//!
//! ## Listing
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    How Paged Listing Works                              │
//! │                                                                         │
//! │  list_paged(filter, sort, desc, page, page_size)                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  WHERE clauses from filter (status / customer / user)                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ORDER BY <sort column> <ASC|DESC>, order_id ASC                       │
//! │       │        └── secondary key keeps pages stable when the           │
//! │       │            primary sort value ties (e.g. same order_date)      │
//! │       ▼                                                                 │
//! │  LIMIT page_size OFFSET (page-1)*page_size   +   COUNT(*) over filter  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! List rows come back without items; use [`OrderRepository::fetch`] for the
//! full aggregate.

use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use tracing::debug;

use crate::error::DbResult;
use storely_core::{Order, OrderItem, OrderStatus};

// =============================================================================
// Listing Parameters
// =============================================================================

/// Filter for the order listing. All fields are optional and AND-combined.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct OrderListFilter {
    pub status: Option<OrderStatus>,
    pub customer_id: Option<String>,
    pub user_id: Option<String>,
}

/// Sortable columns for the order listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderSortField {
    Id,
    /// Creation date. The default sort, ascending.
    Date,
    Total,
    Status,
    Customer,
    User,
}

impl Default for OrderSortField {
    fn default() -> Self {
        OrderSortField::Date
    }
}

impl OrderSortField {
    /// Maps the closed enum to its column. Never interpolates user input.
    fn column(self) -> &'static str {
        match self {
            OrderSortField::Id => "order_id",
            OrderSortField::Date => "order_date",
            OrderSortField::Total => "total_cents",
            OrderSortField::Status => "status",
            OrderSortField::Customer => "customer_id",
            OrderSortField::User => "user_id",
        }
    }
}

const ORDER_COLUMNS: &str =
    "order_id, customer_id, user_id, status, order_date, total_cents, discount_cents, promo_id";

// =============================================================================
// Repository
// =============================================================================

/// Repository for order database operations.
///
/// Stateless; every method runs on the caller's connection so a whole
/// lifecycle operation shares one transaction.
#[derive(Debug)]
pub struct OrderRepository;

impl OrderRepository {
    /// Inserts a new order header. Items are inserted separately.
    pub async fn insert(conn: &mut SqliteConnection, order: &Order) -> DbResult<()> {
        debug!(order_id = %order.order_id, "Inserting order");

        sqlx::query(
            "INSERT INTO orders \
             (order_id, customer_id, user_id, status, order_date, total_cents, discount_cents, promo_id) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .bind(&order.order_id)
        .bind(&order.customer_id)
        .bind(&order.user_id)
        .bind(order.status)
        .bind(order.order_date)
        .bind(order.total_cents)
        .bind(order.discount_cents)
        .bind(&order.promo_id)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Fetches an order with its line items.
    ///
    /// ## Returns
    /// * `Ok(Some(Order))` - Order found, items loaded
    /// * `Ok(None)` - No such order
    pub async fn fetch(conn: &mut SqliteConnection, order_id: &str) -> DbResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE order_id = ?1"
        ))
        .bind(order_id)
        .fetch_optional(&mut *conn)
        .await?;

        let Some(mut order) = order else {
            return Ok(None);
        };

        order.items = Self::fetch_items(conn, order_id).await?;
        Ok(Some(order))
    }

    /// Fetches the line items of an order, in stable id order.
    pub async fn fetch_items(
        conn: &mut SqliteConnection,
        order_id: &str,
    ) -> DbResult<Vec<OrderItem>> {
        let items = sqlx::query_as::<_, OrderItem>(
            "SELECT order_item_id, order_id, product_id, quantity, price_cents, subtotal_cents \
             FROM order_items WHERE order_id = ?1 ORDER BY order_item_id",
        )
        .bind(order_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(items)
    }

    /// Updates the mutable header fields of an order.
    ///
    /// `order_date` is immutable and deliberately absent from the SET list.
    ///
    /// ## Returns
    /// * `Ok(true)` - Order existed and was updated
    /// * `Ok(false)` - No such order
    pub async fn update(conn: &mut SqliteConnection, order: &Order) -> DbResult<bool> {
        debug!(order_id = %order.order_id, status = %order.status, "Updating order header");

        let result = sqlx::query(
            "UPDATE orders SET customer_id = ?2, user_id = ?3, status = ?4, \
             total_cents = ?5, discount_cents = ?6, promo_id = ?7 \
             WHERE order_id = ?1",
        )
        .bind(&order.order_id)
        .bind(&order.customer_id)
        .bind(&order.user_id)
        .bind(order.status)
        .bind(order.total_cents)
        .bind(order.discount_cents)
        .bind(&order.promo_id)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Inserts a line item.
    pub async fn insert_item(conn: &mut SqliteConnection, item: &OrderItem) -> DbResult<()> {
        debug!(
            order_id = %item.order_id,
            order_item_id = %item.order_item_id,
            quantity = item.quantity,
            "Inserting order item"
        );

        sqlx::query(
            "INSERT INTO order_items \
             (order_item_id, order_id, product_id, quantity, price_cents, subtotal_cents) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&item.order_item_id)
        .bind(&item.order_id)
        .bind(&item.product_id)
        .bind(item.quantity)
        .bind(item.price_cents)
        .bind(item.subtotal_cents)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Updates a line item's quantity and subtotal.
    ///
    /// The price snapshot is immutable, only the quantity-derived fields
    /// change.
    pub async fn update_item(conn: &mut SqliteConnection, item: &OrderItem) -> DbResult<()> {
        debug!(
            order_item_id = %item.order_item_id,
            quantity = item.quantity,
            "Updating order item"
        );

        sqlx::query(
            "UPDATE order_items SET quantity = ?2, subtotal_cents = ?3 WHERE order_item_id = ?1",
        )
        .bind(&item.order_item_id)
        .bind(item.quantity)
        .bind(item.subtotal_cents)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Deletes a line item.
    pub async fn delete_item(conn: &mut SqliteConnection, order_item_id: &str) -> DbResult<bool> {
        debug!(order_item_id = %order_item_id, "Deleting order item");

        let result = sqlx::query("DELETE FROM order_items WHERE order_item_id = ?1")
            .bind(order_item_id)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists orders with filtering, sorting and pagination.
    ///
    /// ## Arguments
    /// * `filter` - Optional status/customer/user filters, AND-combined
    /// * `sort` - Sort column; `desc` flips the direction
    /// * `page` - 1-based page number (values < 1 are treated as 1)
    /// * `page_size` - Rows per page
    ///
    /// ## Returns
    /// `(orders_on_page, total_count_over_filter)`. The orders come back
    /// without items.
    pub async fn list_paged(
        conn: &mut SqliteConnection,
        filter: &OrderListFilter,
        sort: OrderSortField,
        desc: bool,
        page: i64,
        page_size: i64,
    ) -> DbResult<(Vec<Order>, i64)> {
        let page = page.max(1);
        let offset = (page - 1) * page_size;

        debug!(?filter, ?sort, desc, page, page_size, "Listing orders");

        let mut count_query =
            QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM orders WHERE 1 = 1");
        Self::push_filters(&mut count_query, filter);
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(&mut *conn)
            .await?;

        let mut query = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE 1 = 1"
        ));
        Self::push_filters(&mut query, filter);
        query.push(" ORDER BY ");
        query.push(sort.column());
        query.push(if desc { " DESC" } else { " ASC" });
        // Stable tie-break so pages never shuffle rows with equal sort keys
        query.push(", order_id ASC");
        query.push(" LIMIT ");
        query.push_bind(page_size);
        query.push(" OFFSET ");
        query.push_bind(offset);

        let orders: Vec<Order> = query.build_query_as().fetch_all(&mut *conn).await?;

        Ok((orders, total))
    }

    fn push_filters(query: &mut QueryBuilder<'_, Sqlite>, filter: &OrderListFilter) {
        if let Some(status) = filter.status {
            query.push(" AND status = ");
            query.push_bind(status);
        }
        if let Some(customer_id) = &filter.customer_id {
            query.push(" AND customer_id = ");
            query.push_bind(customer_id.clone());
        }
        if let Some(user_id) = &filter.user_id {
            query.push(" AND user_id = ");
            query.push_bind(user_id.clone());
        }
    }
}

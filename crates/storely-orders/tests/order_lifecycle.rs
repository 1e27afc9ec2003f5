//! Integration tests for the order lifecycle engine, run against an
//! in-memory SQLite database with the real migrations applied.

use chrono::{Duration, Utc};

use storely_core::{
    CoreError, DiscountType, Inventory, OrderStatus, Product, Promotion,
};
use storely_db::{
    Database, DbConfig, InventoryRepository, OrderListFilter, OrderSortField, PaymentRepository,
    ProductRepository, PromotionRepository,
};
use storely_orders::{
    CheckoutRequest, CreateOrderRequest, EngineError, OrderLineRequest, OrderService,
    UpdateOrderRequest,
};

// =============================================================================
// Helpers
// =============================================================================

async fn setup() -> (Database, OrderService) {
    // Every test calls setup; only the first registration wins, the rest
    // are no-ops. Run with --nocapture to see engine logs.
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let service = OrderService::new(db.clone());
    (db, service)
}

async fn seed_product(db: &Database, product_id: &str, price_cents: i64, stock: i64) {
    let mut conn = db.pool().acquire().await.unwrap();
    ProductRepository::insert(
        &mut conn,
        &Product {
            product_id: product_id.to_string(),
            name: format!("Product {product_id}"),
            price_cents,
            created_at: Utc::now(),
        },
    )
    .await
    .unwrap();
    InventoryRepository::insert(
        &mut conn,
        &Inventory {
            product_id: product_id.to_string(),
            quantity: stock,
        },
    )
    .await
    .unwrap();
}

async fn seed_promotion(db: &Database, promotion: &Promotion) {
    let mut conn = db.pool().acquire().await.unwrap();
    PromotionRepository::insert(&mut conn, promotion).await.unwrap();
}

fn percent_promo(promo_id: &str, code: &str, bps: i64, min_order_cents: i64) -> Promotion {
    let now = Utc::now();
    Promotion {
        promo_id: promo_id.to_string(),
        promo_code: code.to_string(),
        status: "active".to_string(),
        start_date: now - Duration::days(1),
        end_date: now + Duration::days(1),
        min_order_cents,
        usage_limit: 0,
        used_count: 0,
        discount_type: DiscountType::Percent,
        discount_value: bps,
    }
}

async fn stock_of(db: &Database, product_id: &str) -> i64 {
    let mut conn = db.pool().acquire().await.unwrap();
    InventoryRepository::fetch(&mut conn, product_id)
        .await
        .unwrap()
        .unwrap()
        .quantity
}

async fn used_count_of(db: &Database, promo_id: &str) -> i64 {
    let mut conn = db.pool().acquire().await.unwrap();
    PromotionRepository::fetch_by_id(&mut conn, promo_id)
        .await
        .unwrap()
        .unwrap()
        .used_count
}

fn line(product_id: &str, quantity: i64) -> OrderLineRequest {
    OrderLineRequest {
        product_id: product_id.to_string(),
        quantity,
    }
}

fn create_request(lines: Vec<OrderLineRequest>) -> CreateOrderRequest {
    CreateOrderRequest {
        customer_id: None,
        user_id: None,
        items: lines,
        promo_id: None,
    }
}

fn checkout_request(amount_cents: i64) -> CheckoutRequest {
    CheckoutRequest {
        amount_cents,
        payment_method: "cash".to_string(),
        customer_paid_cents: None,
        customer_id: None,
        promo_code: None,
    }
}

// =============================================================================
// Create / Recompute
// =============================================================================

#[tokio::test]
async fn create_computes_total_and_reserves_stock() {
    let (db, service) = setup().await;
    seed_product(&db, "prod-a", 1000, 10).await;
    seed_product(&db, "prod-b", 500, 10).await;

    let order = service
        .create(create_request(vec![line("prod-a", 2), line("prod-b", 1)]))
        .await
        .unwrap();

    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.total_cents, Some(2500));
    assert_eq!(order.discount_cents, 0);
    assert_eq!(order.items.len(), 2);
    assert_eq!(stock_of(&db, "prod-a").await, 8);
    assert_eq!(stock_of(&db, "prod-b").await, 9);
}

#[tokio::test]
async fn create_rolls_back_earlier_reservations_on_failure() {
    let (db, service) = setup().await;
    seed_product(&db, "prod-a", 1000, 10).await;
    seed_product(&db, "prod-b", 500, 1).await;

    let err = service
        .create(create_request(vec![line("prod-a", 2), line("prod-b", 5)]))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        EngineError::Core(CoreError::InsufficientStock { available: 1, requested: 5, .. })
    ));
    // The first line's reservation was rolled back with the rest
    assert_eq!(stock_of(&db, "prod-a").await, 10);
    assert_eq!(stock_of(&db, "prod-b").await, 1);

    let (_, total) = service
        .list_paged(&OrderListFilter::default(), OrderSortField::Date, false, 1, 10)
        .await
        .unwrap();
    assert_eq!(total, 0);
}

#[tokio::test]
async fn create_with_unknown_product_fails() {
    let (_db, service) = setup().await;

    let err = service
        .create(create_request(vec![line("ghost", 1)]))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        EngineError::Core(CoreError::ProductNotFound(_))
    ));
}

// =============================================================================
// Item Mutations
// =============================================================================

#[tokio::test]
async fn add_item_merges_lines_for_same_product() {
    let (db, service) = setup().await;
    seed_product(&db, "prod-a", 1000, 10).await;

    let order = service
        .create(create_request(vec![line("prod-a", 2)]))
        .await
        .unwrap();
    let order = service.add_item(&order.order_id, line("prod-a", 3)).await.unwrap();

    assert_eq!(order.items.len(), 1);
    assert_eq!(order.items[0].quantity, 5);
    assert_eq!(order.items[0].subtotal_cents, 5000);
    assert_eq!(order.total_cents, Some(5000));
    assert_eq!(stock_of(&db, "prod-a").await, 5);
}

#[tokio::test]
async fn add_item_insufficient_stock_leaves_inventory_unchanged() {
    let (db, service) = setup().await;
    seed_product(&db, "prod-a", 1000, 10).await;
    seed_product(&db, "prod-x", 300, 5).await;

    let order = service
        .create(create_request(vec![line("prod-a", 1)]))
        .await
        .unwrap();

    let err = service
        .add_item(&order.order_id, line("prod-x", 6))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        EngineError::Core(CoreError::InsufficientStock { available: 5, requested: 6, .. })
    ));
    assert_eq!(stock_of(&db, "prod-x").await, 5);

    // Order itself is untouched
    let order = service.get(&order.order_id).await.unwrap().unwrap();
    assert_eq!(order.items.len(), 1);
    assert_eq!(order.total_cents, Some(1000));
}

#[tokio::test]
async fn update_item_reserves_positive_delta_and_releases_negative() {
    let (db, service) = setup().await;
    seed_product(&db, "prod-a", 1000, 10).await;

    let order = service
        .create(create_request(vec![line("prod-a", 3)]))
        .await
        .unwrap();
    assert_eq!(stock_of(&db, "prod-a").await, 7);
    let item_id = order.items[0].order_item_id.clone();

    let order = service.update_item(&order.order_id, &item_id, 5).await.unwrap();
    assert_eq!(stock_of(&db, "prod-a").await, 5);
    assert_eq!(order.total_cents, Some(5000));

    let order = service.update_item(&order.order_id, &item_id, 2).await.unwrap();
    assert_eq!(stock_of(&db, "prod-a").await, 8);
    assert_eq!(order.total_cents, Some(2000));
    assert_eq!(order.items[0].subtotal_cents, 2000);
}

#[tokio::test]
async fn delete_item_releases_full_quantity() {
    let (db, service) = setup().await;
    seed_product(&db, "prod-a", 1000, 10).await;
    seed_product(&db, "prod-b", 500, 10).await;

    let order = service
        .create(create_request(vec![line("prod-a", 2), line("prod-b", 4)]))
        .await
        .unwrap();
    assert_eq!(stock_of(&db, "prod-b").await, 6);

    let item_b = order
        .items
        .iter()
        .find(|i| i.product_id.as_deref() == Some("prod-b"))
        .unwrap()
        .order_item_id
        .clone();

    let order = service.delete_item(&order.order_id, &item_b).await.unwrap();

    // Release after reserve restores the pre-reserve value
    assert_eq!(stock_of(&db, "prod-b").await, 10);
    assert_eq!(order.items.len(), 1);
    assert_eq!(order.total_cents, Some(2000));
}

#[tokio::test]
async fn mutating_a_paid_order_fails() {
    let (db, service) = setup().await;
    seed_product(&db, "prod-a", 1000, 10).await;

    let order = service
        .create(create_request(vec![line("prod-a", 1)]))
        .await
        .unwrap();
    service
        .checkout(&order.order_id, checkout_request(1000))
        .await
        .unwrap();

    let err = service
        .add_item(&order.order_id, line("prod-a", 1))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Core(CoreError::InvalidState { .. })
    ));
}

// =============================================================================
// Promotions
// =============================================================================

#[tokio::test]
async fn apply_promotion_sets_discount() {
    let (db, service) = setup().await;
    seed_product(&db, "prod-a", 1000, 10).await;
    seed_product(&db, "prod-b", 500, 10).await;
    seed_promotion(&db, &percent_promo("promo-1", "SAVE10", 1000, 2000)).await;

    let order = service
        .create(create_request(vec![line("prod-a", 2), line("prod-b", 1)]))
        .await
        .unwrap();
    let order = service.apply_promotion(&order.order_id, "SAVE10").await.unwrap();

    assert_eq!(order.total_cents, Some(2500));
    assert_eq!(order.discount_cents, 250);
    assert_eq!(order.promo_id.as_deref(), Some("promo-1"));
    // Application alone never consumes a redemption
    assert_eq!(used_count_of(&db, "promo-1").await, 0);
}

#[tokio::test]
async fn apply_promotion_below_minimum_fails() {
    let (db, service) = setup().await;
    seed_product(&db, "prod-a", 1000, 10).await;
    seed_promotion(&db, &percent_promo("promo-1", "SAVE10", 1000, 2000)).await;

    let order = service
        .create(create_request(vec![line("prod-a", 1)]))
        .await
        .unwrap();

    let err = service
        .apply_promotion(&order.order_id, "SAVE10")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Core(CoreError::PromotionMinimumNotMet { .. })
    ));
}

#[tokio::test]
async fn exhausted_promotion_is_never_usable() {
    let (db, service) = setup().await;
    seed_product(&db, "prod-a", 1000, 10).await;
    let mut promo = percent_promo("promo-1", "SAVE10", 1000, 0);
    promo.usage_limit = 3;
    promo.used_count = 3;
    seed_promotion(&db, &promo).await;

    let order = service
        .create(create_request(vec![line("prod-a", 2)]))
        .await
        .unwrap();

    let err = service
        .apply_promotion(&order.order_id, "SAVE10")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Core(CoreError::PromotionUsageExceeded)
    ));
}

#[tokio::test]
async fn lapsed_promotion_is_dropped_silently_on_recompute() {
    let (db, service) = setup().await;
    seed_product(&db, "prod-a", 1000, 10).await;
    seed_promotion(&db, &percent_promo("promo-1", "SAVE10", 1000, 2000)).await;

    let order = service
        .create(create_request(vec![line("prod-a", 2)]))
        .await
        .unwrap();
    let order = service.apply_promotion(&order.order_id, "SAVE10").await.unwrap();
    assert_eq!(order.discount_cents, 200);
    let item_id = order.items[0].order_item_id.clone();

    // Shrinking the order below the promotion minimum drops the promo
    // instead of failing the item mutation
    let order = service.update_item(&order.order_id, &item_id, 1).await.unwrap();
    assert_eq!(order.total_cents, Some(1000));
    assert_eq!(order.discount_cents, 0);
    assert!(order.promo_id.is_none());
}

#[tokio::test]
async fn remove_promotion_requires_one_applied() {
    let (db, service) = setup().await;
    seed_product(&db, "prod-a", 1000, 10).await;
    seed_promotion(&db, &percent_promo("promo-1", "SAVE10", 1000, 0)).await;

    let order = service
        .create(create_request(vec![line("prod-a", 2)]))
        .await
        .unwrap();

    let err = service.remove_promotion(&order.order_id).await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::Core(CoreError::InvalidState { .. })
    ));

    let order = service.apply_promotion(&order.order_id, "SAVE10").await.unwrap();
    assert_eq!(order.discount_cents, 200);

    let order = service.remove_promotion(&order.order_id).await.unwrap();
    assert!(order.promo_id.is_none());
    assert_eq!(order.discount_cents, 0);
}

#[tokio::test]
async fn apply_promotion_on_empty_order_fails() {
    let (db, service) = setup().await;
    seed_promotion(&db, &percent_promo("promo-1", "SAVE10", 1000, 0)).await;

    let order = service.create(create_request(vec![])).await.unwrap();

    let err = service
        .apply_promotion(&order.order_id, "SAVE10")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Core(CoreError::EmptyOrder(_))));
}

// =============================================================================
// Checkout
// =============================================================================

#[tokio::test]
async fn checkout_requires_exact_final_amount() {
    let (db, service) = setup().await;
    seed_product(&db, "prod-a", 1000, 10).await;
    seed_product(&db, "prod-b", 500, 10).await;
    seed_promotion(&db, &percent_promo("promo-1", "SAVE10", 1000, 2000)).await;

    // 2 × 10.00 + 1 × 5.00 = 25.00; 10% promo (min 20.00) → final 22.50
    let order = service
        .create(create_request(vec![line("prod-a", 2), line("prod-b", 1)]))
        .await
        .unwrap();
    let order = service.apply_promotion(&order.order_id, "SAVE10").await.unwrap();

    let err = service
        .checkout(&order.order_id, checkout_request(2500))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Core(CoreError::AmountMismatch { .. })
    ));

    let order = service
        .checkout(&order.order_id, checkout_request(2250))
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::Paid);
    assert_eq!(used_count_of(&db, "promo-1").await, 1);

    let mut conn = db.pool().acquire().await.unwrap();
    let payments = PaymentRepository::fetch_for_order(&mut conn, &order.order_id)
        .await
        .unwrap();
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].amount_cents, 2250);
}

#[tokio::test]
async fn checkout_on_paid_order_never_creates_second_payment() {
    let (db, service) = setup().await;
    seed_product(&db, "prod-a", 1000, 10).await;

    let order = service
        .create(create_request(vec![line("prod-a", 1)]))
        .await
        .unwrap();
    service
        .checkout(&order.order_id, checkout_request(1000))
        .await
        .unwrap();

    let err = service
        .checkout(&order.order_id, checkout_request(1000))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Core(CoreError::InvalidState { .. })
    ));

    let mut conn = db.pool().acquire().await.unwrap();
    let payments = PaymentRepository::fetch_for_order(&mut conn, &order.order_id)
        .await
        .unwrap();
    assert_eq!(payments.len(), 1);
}

#[tokio::test]
async fn checkout_with_promo_code_applies_it() {
    let (db, service) = setup().await;
    seed_product(&db, "prod-a", 1000, 10).await;
    seed_promotion(&db, &percent_promo("promo-1", "SAVE10", 1000, 0)).await;

    let order = service
        .create(create_request(vec![line("prod-a", 2)]))
        .await
        .unwrap();

    let mut request = checkout_request(1800); // 2000 − 10%
    request.promo_code = Some("SAVE10".to_string());
    let order = service.checkout(&order.order_id, request).await.unwrap();

    assert_eq!(order.status, OrderStatus::Paid);
    assert_eq!(order.discount_cents, 200);
    assert_eq!(used_count_of(&db, "promo-1").await, 1);
}

#[tokio::test]
async fn checkout_rejects_bad_method_and_insufficient_cash() {
    let (db, service) = setup().await;
    seed_product(&db, "prod-a", 1000, 10).await;

    let order = service
        .create(create_request(vec![line("prod-a", 1)]))
        .await
        .unwrap();

    let mut request = checkout_request(1000);
    request.payment_method = "crypto".to_string();
    let err = service.checkout(&order.order_id, request).await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::Core(CoreError::InvalidPaymentMethod(_))
    ));

    let mut request = checkout_request(1000);
    request.customer_paid_cents = Some(500);
    let err = service.checkout(&order.order_id, request).await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::Core(CoreError::InsufficientPayment { .. })
    ));

    // Order is still pending and payable after the failed attempts
    let order = service
        .checkout(&order.order_id, checkout_request(1000))
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::Paid);
}

#[tokio::test]
async fn checkout_on_empty_order_fails() {
    let (_db, service) = setup().await;

    let order = service.create(create_request(vec![])).await.unwrap();
    let err = service
        .checkout(&order.order_id, checkout_request(0))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Core(CoreError::EmptyOrder(_))));
}

// =============================================================================
// Cancel
// =============================================================================

#[tokio::test]
async fn cancel_restores_stock_and_is_terminal() {
    let (db, service) = setup().await;
    seed_product(&db, "prod-y", 800, 5).await;

    let order = service
        .create(create_request(vec![line("prod-y", 3)]))
        .await
        .unwrap();
    assert_eq!(stock_of(&db, "prod-y").await, 2);

    assert!(service.cancel(&order.order_id).await.unwrap());
    assert_eq!(stock_of(&db, "prod-y").await, 5);

    let order = service.get(&order.order_id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Canceled);

    let err = service.cancel(&order.order_id).await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::Core(CoreError::InvalidState { .. })
    ));
}

#[tokio::test]
async fn cancel_missing_order_returns_false() {
    let (_db, service) = setup().await;
    assert!(!service.cancel("no-such-order").await.unwrap());
}

#[tokio::test]
async fn paid_order_cannot_be_canceled() {
    let (db, service) = setup().await;
    seed_product(&db, "prod-a", 1000, 10).await;

    let order = service
        .create(create_request(vec![line("prod-a", 1)]))
        .await
        .unwrap();
    service
        .checkout(&order.order_id, checkout_request(1000))
        .await
        .unwrap();

    let err = service.cancel(&order.order_id).await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::Core(CoreError::InvalidState { .. })
    ));
}

// =============================================================================
// Update / Get / Listing
// =============================================================================

#[tokio::test]
async fn update_changes_customer_and_returns_none_for_missing_order() {
    let (db, service) = setup().await;
    seed_product(&db, "prod-a", 1000, 10).await;

    let order = service
        .create(create_request(vec![line("prod-a", 1)]))
        .await
        .unwrap();

    let updated = service
        .update(
            &order.order_id,
            UpdateOrderRequest {
                customer_id: Some("cust-1".to_string()),
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.customer_id.as_deref(), Some("cust-1"));
    assert_eq!(updated.total_cents, Some(1000));

    let missing = service
        .update("no-such-order", UpdateOrderRequest::default())
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn get_returns_order_with_items() {
    let (db, service) = setup().await;
    seed_product(&db, "prod-a", 1000, 10).await;

    let created = service
        .create(create_request(vec![line("prod-a", 2)]))
        .await
        .unwrap();

    let fetched = service.get(&created.order_id).await.unwrap().unwrap();
    assert_eq!(fetched.order_id, created.order_id);
    assert_eq!(fetched.items.len(), 1);
    assert_eq!(fetched.items[0].subtotal_cents, 2000);

    assert!(service.get("no-such-order").await.unwrap().is_none());
}

#[tokio::test]
async fn list_paged_filters_and_pages_stably() {
    let (db, service) = setup().await;
    seed_product(&db, "prod-a", 1000, 100).await;

    let mut ids = Vec::new();
    for _ in 0..3 {
        let order = service
            .create(create_request(vec![line("prod-a", 1)]))
            .await
            .unwrap();
        ids.push(order.order_id);
    }

    let filter = OrderListFilter::default();
    let (page1, total) = service
        .list_paged(&filter, OrderSortField::Date, false, 1, 2)
        .await
        .unwrap();
    let (page2, _) = service
        .list_paged(&filter, OrderSortField::Date, false, 2, 2)
        .await
        .unwrap();

    assert_eq!(total, 3);
    assert_eq!(page1.len(), 2);
    assert_eq!(page2.len(), 1);

    // No row appears on two pages, even with identical order dates
    let mut seen: Vec<String> = page1
        .iter()
        .chain(page2.iter())
        .map(|o| o.order_id.clone())
        .collect();
    seen.sort();
    let mut expected = ids.clone();
    expected.sort();
    assert_eq!(seen, expected);

    let pending = OrderListFilter {
        status: Some(OrderStatus::Pending),
        ..Default::default()
    };
    let (_, pending_total) = service
        .list_paged(&pending, OrderSortField::Date, false, 1, 10)
        .await
        .unwrap();
    assert_eq!(pending_total, 3);

    let paid = OrderListFilter {
        status: Some(OrderStatus::Paid),
        ..Default::default()
    };
    let (rows, paid_total) = service
        .list_paged(&paid, OrderSortField::Date, false, 1, 10)
        .await
        .unwrap();
    assert_eq!(paid_total, 0);
    assert!(rows.is_empty());
}

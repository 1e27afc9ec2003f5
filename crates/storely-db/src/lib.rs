//! # storely-db: Database Layer for Storely
//!
//! This crate provides database access for the Storely order backend.
//! It uses SQLite for storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Storely Data Flow                                │
//! │                                                                         │
//! │  Order engine operation (e.g. checkout)                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    storely-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │  (order.rs,   │    │  (embedded)  │  │   │
//! │  │   │               │    │  inventory.rs,│    │              │  │   │
//! │  │   │ SqlitePool    │    │  promotion.rs,│    │ 001_init.sql │  │   │
//! │  │   │ begin() ──────┼───►│  payment.rs,  │    │ ...          │  │   │
//! │  │   │ Transactions  │    │  product.rs)  │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database (WAL, foreign keys on)                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (order, inventory, ...)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use storely_db::{Database, DbConfig};
//! use storely_db::repository::order::OrderRepository;
//!
//! let db = Database::new(DbConfig::new("path/to/storely.db")).await?;
//!
//! // One transaction across multiple repositories
//! let mut tx = db.begin().await?;
//! let order = OrderRepository::fetch(&mut tx, "order-uuid").await?;
//! tx.commit().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::inventory::InventoryRepository;
pub use repository::order::{OrderListFilter, OrderRepository, OrderSortField};
pub use repository::payment::PaymentRepository;
pub use repository::product::ProductRepository;
pub use repository::promotion::PromotionRepository;

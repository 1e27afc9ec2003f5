//! # Repository Module
//!
//! Database repository implementations for Storely.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.  │
//! │                                                                         │
//! │  Order engine operation                                                │
//! │       │                                                                 │
//! │       │  let mut tx = db.begin().await?;                               │
//! │       │  OrderRepository::fetch(&mut tx, id)                           │
//! │       │  InventoryRepository::try_decrement(&mut tx, product, qty)     │
//! │       │  tx.commit()                                                   │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Unlike pool-holding repositories, every method here takes a           │
//! │  `&mut SqliteConnection`. That is what lets one lifecycle operation    │
//! │  thread a single transaction through order, inventory, promotion and   │
//! │  payment writes and roll ALL of them back on any failure.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`order::OrderRepository`] - Order and order item CRUD, paged listing
//! - [`product::ProductRepository`] - Catalog lookups and seeding
//! - [`inventory::InventoryRepository`] - Conditional stock decrement, release upsert
//! - [`promotion::PromotionRepository`] - Lookup by id/code, guarded usage increment
//! - [`payment::PaymentRepository`] - Payment inserts and lookups

pub mod inventory;
pub mod order;
pub mod payment;
pub mod product;
pub mod promotion;

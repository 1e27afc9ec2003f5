//! # storely-orders: Order Lifecycle Engine for Storely
//!
//! The transactional core of the Storely order backend: turns a cart of
//! product lines into a priced, inventory-backed, payable order, keeping
//! stock levels, promotion usage counters, money amounts and order state
//! consistent across multi-step operations that succeed or fail as one.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Storely Order Engine                             │
//! │                                                                         │
//! │  API layer (separate service)                                          │
//! │       │  create / mutate / apply promo / cancel / checkout             │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                ★ storely-orders (THIS CRATE) ★                  │   │
//! │  │                                                                 │   │
//! │  │  OrderService (service.rs) ── owns the transaction boundary     │   │
//! │  │       │                                                         │   │
//! │  │       │ UnitOfWork (uow.rs): begin ─► ops ─► commit/rollback    │   │
//! │  │       ▼                                                         │   │
//! │  │  ┌────────────┐ ┌────────────┐ ┌────────────┐ ┌─────────────┐  │   │
//! │  │  │ Inventory  │ │ Promotion  │ │  Pricing   │ │  Payment    │  │   │
//! │  │  │  Ledger    │ │ Validator  │ │  Engine    │ │  Finalizer  │  │   │
//! │  │  │ reserve/   │ │ throwing   │ │ recompute, │ │ validate,   │  │   │
//! │  │  │ release    │ │ rules      │ │ silent drop│ │ pay, count  │  │   │
//! │  │  └────────────┘ └────────────┘ └────────────┘ └─────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                              │                                  │
//! │       ▼                              ▼                                  │
//! │  storely-core (pure rules)      storely-db (SQLite repositories)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`service`] - The orchestrator: one transaction per operation
//! - [`uow`] - Scoped transaction handle
//! - [`inventory`] - Atomic stock reserve / tolerant release
//! - [`promotion`] - Throwing promotion validation
//! - [`pricing`] - Total/discount recomputation with silent promo drop
//! - [`payment`] - Checkout finalization
//! - [`requests`] - Typed operation inputs
//! - [`error`] - Engine error union

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod inventory;
pub mod payment;
pub mod pricing;
pub mod promotion;
pub mod requests;
pub mod service;
pub mod uow;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{EngineError, EngineResult};
pub use requests::{CheckoutRequest, CreateOrderRequest, OrderLineRequest, UpdateOrderRequest};
pub use service::OrderService;
pub use uow::UnitOfWork;

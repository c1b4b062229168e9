//! Storage seam for the order workflow.
//!
//! The workflow talks to an [`OrderStore`] trait object so the same logic
//! runs against `PostgreSQL` in production and the in-memory store in tests
//! and local development. The one concurrency-sensitive contract lives here:
//! [`OrderStore::create_order`] must reserve stock with a conditional
//! decrement inside a single atomic unit, and fail the whole order when any
//! item falls short.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use licorera_core::{AddressId, NotificationKind, OrderId, OrderStatus, ProductId, UserId};
use thiserror::Error;

use crate::models::{Address, NotificationLog, OrderView, Product, User};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Storage-layer errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying database failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A conditional stock decrement matched no row: the product's current
    /// stock is below the requested quantity. The enclosing transaction has
    /// been rolled back.
    #[error("insufficient stock for product {0}")]
    OutOfStock(ProductId),

    /// The targeted row does not exist.
    #[error("not found")]
    NotFound,

    /// A conditional status update matched no row: the order changed status
    /// concurrently (or was deleted).
    #[error("order {0} status changed concurrently")]
    StaleStatus(OrderId),

    /// A stored value violates an invariant (e.g. unknown status token).
    #[error("data corruption: {0}")]
    Corruption(String),
}

/// A new order item with its price snapshot, ready to persist.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub quantity: i32,
    /// Product price captured at checkout.
    pub unit_price: i64,
}

/// A fully validated order ready for the transactional insert.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: UserId,
    pub total: i64,
    pub items: Vec<NewOrderItem>,
}

/// One notification attempt to upsert into the audit log.
#[derive(Debug, Clone)]
pub struct NotificationAttempt {
    pub order_id: OrderId,
    pub kind: NotificationKind,
    pub to: String,
    pub ok: bool,
    pub sid: Option<String>,
    pub error: Option<String>,
}

/// Persistence operations the order workflow depends on.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Fetch an address only if it belongs to `user_id`.
    async fn address_for_user(
        &self,
        address_id: AddressId,
        user_id: UserId,
    ) -> Result<Option<Address>, StoreError>;

    /// Fetch a user by id.
    async fn user_by_id(&self, user_id: UserId) -> Result<Option<User>, StoreError>;

    /// Fetch all products matching the given ids (missing ids are absent
    /// from the result; the caller detects them by count).
    async fn products_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, StoreError>;

    /// Atomically insert the order (status `RECIBIDO`) with its items and
    /// reserve stock via conditional decrement per item.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::OutOfStock`] with the offending product id when
    /// any decrement matches no row; nothing is persisted in that case.
    async fn create_order(&self, order: NewOrder) -> Result<OrderView, StoreError>;

    /// Fetch an order with its items.
    async fn order_by_id(&self, order_id: OrderId) -> Result<Option<OrderView>, StoreError>;

    /// All orders for a user, newest first.
    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<OrderView>, StoreError>;

    /// All orders, newest first.
    async fn all_orders(&self) -> Result<Vec<OrderView>, StoreError>;

    /// Conditionally move an order from `from` to `to`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::StaleStatus`] when the order is no longer in
    /// `from` (lost race with another admin) and [`StoreError::NotFound`]
    /// when the order does not exist at all.
    async fn set_status(
        &self,
        order_id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<OrderView, StoreError>;

    /// Delete an order and its items.
    async fn delete_order(&self, order_id: OrderId) -> Result<(), StoreError>;

    /// Insert-or-overwrite the notification log row keyed
    /// `(order_id, kind)`. Last write wins.
    async fn upsert_notification_log(
        &self,
        attempt: NotificationAttempt,
    ) -> Result<(), StoreError>;

    /// Notification log rows for an order, newest first.
    async fn notification_logs(
        &self,
        order_id: OrderId,
    ) -> Result<Vec<NotificationLog>, StoreError>;
}

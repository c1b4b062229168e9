//! In-memory [`OrderStore`] for tests and local development.
//!
//! One mutex guards all tables, so the validate-then-apply step inside
//! [`MemoryStore::create_order`] is as atomic as the Postgres transaction it
//! stands in for: concurrent creates serialize at the lock, and a failed
//! stock check leaves no partial decrements behind.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use licorera_core::{AddressId, NotificationLogId, OrderId, OrderStatus, ProductId, UserId};

use crate::models::{
    Address, NotificationLog, Order, OrderItem, OrderItemView, OrderView, Product, User,
};

use super::{NewOrder, NotificationAttempt, OrderStore, StoreError};

/// Non-persistent store backed by plain maps.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Tables>,
}

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<UserId, User>,
    addresses: HashMap<AddressId, Address>,
    products: BTreeMap<ProductId, Product>,
    orders: BTreeMap<OrderId, Order>,
    items: HashMap<OrderId, Vec<OrderItem>>,
    logs: BTreeMap<(OrderId, String), NotificationLog>,
    next_order_id: i32,
    next_log_id: i32,
}

impl Tables {
    fn view(&self, order: &Order) -> Result<OrderView, StoreError> {
        let items = self
            .items
            .get(&order.id)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .map(|item| {
                let product = self.products.get(&item.product_id).ok_or_else(|| {
                    StoreError::Corruption(format!(
                        "order {} references missing product {}",
                        order.id, item.product_id
                    ))
                })?;
                Ok(OrderItemView {
                    product_id: item.product_id,
                    product_name: product.name.clone(),
                    image_url: product.image_url.clone(),
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                    line_total: item.line_total(),
                })
            })
            .collect::<Result<Vec<_>, StoreError>>()?;

        Ok(OrderView {
            order: order.clone(),
            items,
        })
    }
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a user (replaces any existing row with the same id).
    pub fn insert_user(&self, user: User) {
        self.lock().users.insert(user.id, user);
    }

    /// Seed an address.
    pub fn insert_address(&self, address: Address) {
        self.lock().addresses.insert(address.id, address);
    }

    /// Seed a product.
    pub fn insert_product(&self, product: Product) {
        self.lock().products.insert(product.id, product);
    }

    /// Current stock for a product, if it exists. Test observability.
    #[must_use]
    pub fn product_stock(&self, id: ProductId) -> Option<i32> {
        self.lock().products.get(&id).map(|p| p.stock)
    }

    /// Number of persisted orders. Test observability.
    #[must_use]
    pub fn order_count(&self) -> usize {
        self.lock().orders.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.inner.lock().expect("memory store mutex poisoned")
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn address_for_user(
        &self,
        address_id: AddressId,
        user_id: UserId,
    ) -> Result<Option<Address>, StoreError> {
        let tables = self.lock();
        Ok(tables
            .addresses
            .get(&address_id)
            .filter(|a| a.user_id == user_id)
            .cloned())
    }

    async fn user_by_id(&self, user_id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.lock().users.get(&user_id).cloned())
    }

    async fn products_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, StoreError> {
        let tables = self.lock();
        Ok(ids
            .iter()
            .filter_map(|id| tables.products.get(id).cloned())
            .collect())
    }

    async fn create_order(&self, order: NewOrder) -> Result<OrderView, StoreError> {
        let mut tables = self.lock();

        // Validate every line before touching stock, so a failure leaves
        // nothing half-reserved. Quantities are summed per product first:
        // two lines for the same product must not each pass against the
        // original stock.
        let mut required: HashMap<ProductId, i32> = HashMap::new();
        for item in &order.items {
            *required.entry(item.product_id).or_default() += item.quantity;
        }
        for item in &order.items {
            let product = tables
                .products
                .get(&item.product_id)
                .ok_or(StoreError::OutOfStock(item.product_id))?;
            if product.stock < required[&item.product_id] {
                return Err(StoreError::OutOfStock(item.product_id));
            }
        }

        for item in &order.items {
            if let Some(product) = tables.products.get_mut(&item.product_id) {
                product.stock -= item.quantity;
            }
        }

        tables.next_order_id += 1;
        let now = Utc::now();
        let stored = Order {
            id: OrderId::new(tables.next_order_id),
            user_id: order.user_id,
            status: OrderStatus::Received,
            total: order.total,
            created_at: now,
            updated_at: now,
        };
        let items = order
            .items
            .into_iter()
            .map(|i| OrderItem {
                product_id: i.product_id,
                quantity: i.quantity,
                unit_price: i.unit_price,
            })
            .collect();
        tables.items.insert(stored.id, items);
        tables.orders.insert(stored.id, stored.clone());

        tables.view(&stored)
    }

    async fn order_by_id(&self, order_id: OrderId) -> Result<Option<OrderView>, StoreError> {
        let tables = self.lock();
        tables
            .orders
            .get(&order_id)
            .map(|order| tables.view(order))
            .transpose()
    }

    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<OrderView>, StoreError> {
        let tables = self.lock();
        tables
            .orders
            .values()
            .rev()
            .filter(|o| o.user_id == user_id)
            .map(|o| tables.view(o))
            .collect()
    }

    async fn all_orders(&self) -> Result<Vec<OrderView>, StoreError> {
        let tables = self.lock();
        tables.orders.values().rev().map(|o| tables.view(o)).collect()
    }

    async fn set_status(
        &self,
        order_id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<OrderView, StoreError> {
        let mut tables = self.lock();
        let Some(order) = tables.orders.get_mut(&order_id) else {
            return Err(StoreError::NotFound);
        };
        if order.status != from {
            return Err(StoreError::StaleStatus(order_id));
        }
        order.status = to;
        order.updated_at = Utc::now();
        let updated = order.clone();
        tables.view(&updated)
    }

    async fn delete_order(&self, order_id: OrderId) -> Result<(), StoreError> {
        let mut tables = self.lock();
        tables.items.remove(&order_id);
        // Mirror the schema's ON DELETE CASCADE on notification_logs.
        tables.logs.retain(|(oid, _), _| *oid != order_id);
        tables
            .orders
            .remove(&order_id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    async fn upsert_notification_log(
        &self,
        attempt: NotificationAttempt,
    ) -> Result<(), StoreError> {
        let mut tables = self.lock();
        let key = (attempt.order_id, attempt.kind.as_token());

        if let Some(existing) = tables.logs.get_mut(&key) {
            existing.to = attempt.to;
            existing.ok = attempt.ok;
            existing.sid = attempt.sid;
            existing.error = attempt.error;
        } else {
            tables.next_log_id += 1;
            let log = NotificationLog {
                id: NotificationLogId::new(tables.next_log_id),
                order_id: attempt.order_id,
                channel: "WHATSAPP".to_owned(),
                kind: key.1.clone(),
                to: attempt.to,
                ok: attempt.ok,
                sid: attempt.sid,
                error: attempt.error,
                created_at: Utc::now(),
            };
            tables.logs.insert(key, log);
        }
        Ok(())
    }

    async fn notification_logs(
        &self,
        order_id: OrderId,
    ) -> Result<Vec<NotificationLog>, StoreError> {
        let tables = self.lock();
        let mut logs: Vec<NotificationLog> = tables
            .logs
            .values()
            .filter(|l| l.order_id == order_id)
            .cloned()
            .collect();
        logs.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(logs)
    }
}

//! `PostgreSQL` implementation of the [`OrderStore`] seam.
//!
//! Queries are runtime-checked (`sqlx::query`/`query_as` with binds) so the
//! crate builds without a live database. The stock reservation is the one
//! place where correctness depends on SQL shape: the conditional decrement
//! (`... WHERE id = $1 AND stock >= $2`) serializes concurrent orders at the
//! row lock and is checked by `rows_affected`.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use licorera_core::{AddressId, OrderId, OrderStatus, ProductId, Role, UserId};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::models::{Address, NotificationLog, Order, OrderItemView, OrderView, Product, User};

use super::{NewOrder, NotificationAttempt, OrderStore, StoreError};

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Production store backed by `PostgreSQL`.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

/// Raw order row; status is parsed out of its text token.
#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: UserId,
    status: String,
    total: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self) -> Result<Order, StoreError> {
        let status = self
            .status
            .parse::<OrderStatus>()
            .map_err(|e| StoreError::Corruption(format!("order {}: {e}", self.id)))?;
        Ok(Order {
            id: self.id,
            user_id: self.user_id,
            status,
            total: self.total,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Raw user row; role is parsed out of its text token.
#[derive(sqlx::FromRow)]
struct UserRow {
    id: UserId,
    name: String,
    email: String,
    phone: Option<String>,
    role: String,
}

impl UserRow {
    fn into_user(self) -> Result<User, StoreError> {
        let role = self
            .role
            .parse::<Role>()
            .map_err(|e| StoreError::Corruption(format!("user {}: {e}", self.id)))?;
        Ok(User {
            id: self.id,
            name: self.name,
            email: self.email,
            phone: self.phone,
            role,
        })
    }
}

const ORDER_COLUMNS: &str = "id, user_id, status, total, created_at, updated_at";

const ITEMS_FOR_ORDER: &str = r"
    SELECT oi.product_id,
           p.name AS product_name,
           p.image_url,
           oi.quantity,
           oi.unit_price,
           oi.unit_price * oi.quantity AS line_total
    FROM order_items oi
    JOIN products p ON p.id = oi.product_id
    WHERE oi.order_id = $1
    ORDER BY oi.id
";

impl PgStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn items_for(&self, order_id: OrderId) -> Result<Vec<OrderItemView>, StoreError> {
        let items = sqlx::query_as::<_, OrderItemView>(ITEMS_FOR_ORDER)
            .bind(order_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }

    async fn with_items(&self, row: OrderRow) -> Result<OrderView, StoreError> {
        let order = row.into_order()?;
        let items = self.items_for(order.id).await?;
        Ok(OrderView { order, items })
    }

    async fn views_for(&self, rows: Vec<OrderRow>) -> Result<Vec<OrderView>, StoreError> {
        let mut views = Vec::with_capacity(rows.len());
        for row in rows {
            views.push(self.with_items(row).await?);
        }
        Ok(views)
    }
}

#[async_trait]
impl OrderStore for PgStore {
    async fn address_for_user(
        &self,
        address_id: AddressId,
        user_id: UserId,
    ) -> Result<Option<Address>, StoreError> {
        let address = sqlx::query_as::<_, Address>(
            r"
            SELECT id, user_id, label, recipient, phone, line1, line2,
                   neighborhood, city, lat, lng, notes, is_default
            FROM addresses
            WHERE id = $1 AND user_id = $2
            ",
        )
        .bind(address_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(address)
    }

    async fn user_by_id(&self, user_id: UserId) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, name, email, phone, role FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(UserRow::into_user).transpose()
    }

    async fn products_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, StoreError> {
        let raw_ids: Vec<i32> = ids.iter().map(|id| id.as_i32()).collect();
        let products = sqlx::query_as::<_, Product>(
            r"
            SELECT id, name, price, stock, category, description, image_url
            FROM products
            WHERE id = ANY($1)
            ",
        )
        .bind(&raw_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(products)
    }

    async fn create_order(&self, order: NewOrder) -> Result<OrderView, StoreError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "INSERT INTO orders (user_id, status, total) VALUES ($1, $2, $3) RETURNING {ORDER_COLUMNS}"
        ))
        .bind(order.user_id)
        .bind(OrderStatus::Received.as_token())
        .bind(order.total)
        .fetch_one(&mut *tx)
        .await?;

        for item in &order.items {
            sqlx::query(
                r"
                INSERT INTO order_items (order_id, product_id, quantity, unit_price)
                VALUES ($1, $2, $3, $4)
                ",
            )
            .bind(row.id)
            .bind(item.product_id)
            .bind(item.quantity)
            .bind(item.unit_price)
            .execute(&mut *tx)
            .await?;

            // Conditional decrement: the authoritative guard against
            // concurrent oversell. Zero rows affected means the stock
            // dropped below the requested quantity since the pre-check.
            let res = sqlx::query("UPDATE products SET stock = stock - $2 WHERE id = $1 AND stock >= $2")
                .bind(item.product_id)
                .bind(item.quantity)
                .execute(&mut *tx)
                .await?;
            if res.rows_affected() != 1 {
                tx.rollback().await?;
                return Err(StoreError::OutOfStock(item.product_id));
            }
        }

        tx.commit().await?;
        self.with_items(row).await
    }

    async fn order_by_id(&self, order_id: OrderId) -> Result<Option<OrderView>, StoreError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;
        match row {
            Some(row) => Ok(Some(self.with_items(row).await?)),
            None => Ok(None),
        }
    }

    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<OrderView>, StoreError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY id DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        self.views_for(rows).await
    }

    async fn all_orders(&self) -> Result<Vec<OrderView>, StoreError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        self.views_for(rows).await
    }

    async fn set_status(
        &self,
        order_id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<OrderView, StoreError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "UPDATE orders SET status = $3, updated_at = now()
             WHERE id = $1 AND status = $2
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(order_id)
        .bind(from.as_token())
        .bind(to.as_token())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => self.with_items(row).await,
            None => {
                // Distinguish a vanished order from a lost status race.
                let exists = sqlx::query_scalar::<_, i32>("SELECT 1 FROM orders WHERE id = $1")
                    .bind(order_id)
                    .fetch_optional(&self.pool)
                    .await?;
                if exists.is_some() {
                    Err(StoreError::StaleStatus(order_id))
                } else {
                    Err(StoreError::NotFound)
                }
            }
        }
    }

    async fn delete_order(&self, order_id: OrderId) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM order_items WHERE order_id = $1")
            .bind(order_id)
            .execute(&mut *tx)
            .await?;
        let res = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(order_id)
            .execute(&mut *tx)
            .await?;
        if res.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(StoreError::NotFound);
        }
        tx.commit().await?;
        Ok(())
    }

    async fn upsert_notification_log(
        &self,
        attempt: NotificationAttempt,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO notification_logs (order_id, channel, "type", recipient, ok, sid, error)
            VALUES ($1, 'WHATSAPP', $2, $3, $4, $5, $6)
            ON CONFLICT (order_id, "type") DO UPDATE
            SET recipient = EXCLUDED.recipient,
                ok = EXCLUDED.ok,
                sid = EXCLUDED.sid,
                error = EXCLUDED.error
            "#,
        )
        .bind(attempt.order_id)
        .bind(attempt.kind.as_token())
        .bind(&attempt.to)
        .bind(attempt.ok)
        .bind(&attempt.sid)
        .bind(&attempt.error)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn notification_logs(
        &self,
        order_id: OrderId,
    ) -> Result<Vec<NotificationLog>, StoreError> {
        let logs = sqlx::query_as::<_, NotificationLog>(
            r#"
            SELECT id, order_id, channel, "type", recipient, ok, sid, error, created_at
            FROM notification_logs
            WHERE order_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(logs)
    }
}

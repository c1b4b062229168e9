//! Order and order item models.

use chrono::{DateTime, Utc};
use licorera_core::{OrderId, OrderStatus, ProductId, UserId};
use serde::Serialize;

/// An order row.
///
/// `total` is subtotal plus shipping, fixed at creation time. Items are
/// immutable snapshots created in the same transaction.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub total: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An order line as stored.
///
/// `unit_price` is the product price captured at checkout; totals are never
/// re-derived from the live product row, so later price edits do not drift
/// historical orders.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: ProductId,
    pub quantity: i32,
    pub unit_price: i64,
}

impl OrderItem {
    /// Line subtotal in pesos.
    #[must_use]
    pub const fn line_total(&self) -> i64 {
        self.unit_price * self.quantity as i64
    }
}

/// An order line joined with display fields from the product.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemView {
    pub product_id: ProductId,
    pub product_name: String,
    pub image_url: Option<String>,
    pub quantity: i32,
    pub unit_price: i64,
    pub line_total: i64,
}

/// An order with its items, as returned to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItemView>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_total_multiplies_snapshot_price() {
        let item = OrderItem {
            product_id: ProductId::new(1),
            quantity: 3,
            unit_price: 4500,
        };
        assert_eq!(item.line_total(), 13_500);
    }
}

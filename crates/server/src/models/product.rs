//! Catalog product model.

use licorera_core::ProductId;
use serde::Serialize;

/// A catalog item.
///
/// `price` is integer pesos; `stock` never goes negative; every mutation
/// goes through the store's conditional decrement.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: i64,
    pub stock: i32,
    pub category: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

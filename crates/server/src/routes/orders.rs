//! Order API endpoints.
//!
//! JSON over REST; the mobile client switches on the `error` codes in 4xx
//! bodies, so those strings are part of the contract.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use licorera_core::{AddressId, OrderId, OrderStatus, ProductId};
use serde::Deserialize;

use crate::error::{AppJson, Result};
use crate::middleware::{CurrentUser, RequireAdmin};
use crate::models::{NotificationLog, OrderView};
use crate::services::workflow::{CartItem, CreateOrderInput, CreatedOrder};
use crate::state::AppState;

/// One cart line in the create request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderItemRequest {
    pub product_id: ProductId,
    pub quantity: i32,
}

/// Body of `POST /orders`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub address_id: AddressId,
    pub items: Vec<CreateOrderItemRequest>,
    pub notes: Option<String>,
    pub payment_method: Option<String>,
}

/// Body of `PATCH /orders/{id}/status`.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

/// `POST /orders` - create an order from the cart. 201 on success.
pub async fn create(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    AppJson(body): AppJson<CreateOrderRequest>,
) -> Result<(StatusCode, Json<CreatedOrder>)> {
    let input = CreateOrderInput {
        address_id: body.address_id,
        items: body
            .items
            .iter()
            .map(|i| CartItem {
                product_id: i.product_id,
                quantity: i.quantity,
            })
            .collect(),
        notes: body.notes,
        payment_method: body.payment_method,
    };
    let created = state.workflow().create(principal.id, input).await?;
    tracing::info!(order_id = %created.view.order.id, user_id = %principal.id, "order created");
    Ok((StatusCode::CREATED, Json(created)))
}

/// `GET /orders/my` - the caller's orders, newest first.
pub async fn list_mine(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
) -> Result<Json<Vec<OrderView>>> {
    let orders = state.workflow().list_mine(principal.id).await?;
    Ok(Json(orders))
}

/// `GET /orders/{id}` - one order, for its owner or an admin.
pub async fn find_one(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderView>> {
    let order = state.workflow().find_for_user(id, &principal).await?;
    Ok(Json(order))
}

/// `GET /orders` - all orders (admin).
pub async fn list_all(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Vec<OrderView>>> {
    let orders = state.workflow().list_all().await?;
    Ok(Json(orders))
}

/// `PATCH /orders/{id}/status` - move an order through its state machine
/// (admin). Side effect: a WhatsApp status message for EN_CAMINO, ENTREGADO
/// and CANCELADO, logged idempotently per (order, status).
pub async fn update_status(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<OrderId>,
    AppJson(body): AppJson<UpdateStatusRequest>,
) -> Result<Json<OrderView>> {
    let order = state.workflow().update_status(id, body.status).await?;
    tracing::info!(order_id = %id, status = %body.status, "order status updated");
    Ok(Json(order))
}

/// `DELETE /orders/{id}` - delete an order and its items (admin).
pub async fn remove(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<OrderId>,
) -> Result<Json<serde_json::Value>> {
    state.workflow().remove(id).await?;
    Ok(Json(serde_json::json!({ "id": id })))
}

/// `GET /orders/{id}/notifications` - notification audit trail (admin).
pub async fn list_notifications(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<OrderId>,
) -> Result<Json<Vec<NotificationLog>>> {
    let logs = state.workflow().notifications(id).await?;
    Ok(Json(logs))
}

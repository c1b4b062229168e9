//! The order workflow: create, read, status transitions, delete.
//!
//! This is the only component with transactional boundaries. Everything it
//! touches goes through the [`OrderStore`] and [`NotificationChannel`] seams,
//! so the same logic runs in production and under test.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use licorera_core::{
    AddressId, NotificationKind, OrderId, OrderStatus, Phone, ProductId, TransitionError, UserId,
};
use serde::Serialize;
use thiserror::Error;

use crate::config::ShippingConfig;
use crate::coverage::{CoverageError, CoverageGuard};
use crate::geo::shipping_for_km;
use crate::middleware::Principal;
use crate::models::{Address, NotificationLog, OrderView};
use crate::services::notify::{
    ItemLine, NotificationChannel, OrderConfirmation, SendOutcome, StatusUpdate,
};
use crate::store::{NewOrder, NewOrderItem, NotificationAttempt, OrderStore, StoreError};

/// Business-rule failures of the order workflow.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("cart is empty")]
    EmptyCart,
    #[error("quantity must be at least 1 for product {0}")]
    InvalidQuantity(ProductId),
    #[error("address not found")]
    AddressNotFound,
    #[error("address has no coordinates")]
    AddressMissingGeo,
    #[error("address is out of the delivery radius")]
    CoverageOutOfRange,
    #[error("product not found")]
    ProductNotFound,
    #[error("insufficient stock for product {0}")]
    OutOfStock(ProductId),
    #[error("order not found")]
    OrderNotFound,
    #[error(transparent)]
    IllegalTransition(#[from] TransitionError),
    #[error("order status changed concurrently")]
    StatusConflict,
    #[error(transparent)]
    Store(StoreError),
}

impl WorkflowError {
    /// Machine-readable code for the HTTP error body.
    #[must_use]
    pub fn code(&self) -> String {
        match self {
            Self::EmptyCart => "EMPTY_CART".to_owned(),
            Self::InvalidQuantity(_) => "INVALID_QUANTITY".to_owned(),
            Self::AddressNotFound => "ADDRESS_NOT_FOUND".to_owned(),
            Self::AddressMissingGeo => "ADDRESS_MISSING_GEO".to_owned(),
            Self::CoverageOutOfRange => "COVERAGE_OUT_OF_RANGE".to_owned(),
            Self::ProductNotFound => "PRODUCT_NOT_FOUND".to_owned(),
            Self::OutOfStock(id) => format!("OUT_OF_STOCK:{id}"),
            Self::OrderNotFound => "ORDER_NOT_FOUND".to_owned(),
            Self::IllegalTransition(_) => "ILLEGAL_TRANSITION".to_owned(),
            Self::StatusConflict => "STATUS_CONFLICT".to_owned(),
            Self::Store(_) => "INTERNAL".to_owned(),
        }
    }
}

impl From<StoreError> for WorkflowError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::OutOfStock(id) => Self::OutOfStock(id),
            StoreError::NotFound => Self::OrderNotFound,
            StoreError::StaleStatus(_) => Self::StatusConflict,
            other => Self::Store(other),
        }
    }
}

/// One cart line in a create request.
#[derive(Debug, Clone, Copy)]
pub struct CartItem {
    pub product_id: ProductId,
    pub quantity: i32,
}

/// Validated input to [`OrderWorkflow::create`].
#[derive(Debug, Clone)]
pub struct CreateOrderInput {
    pub address_id: AddressId,
    pub items: Vec<CartItem>,
    pub notes: Option<String>,
    pub payment_method: Option<String>,
}

/// A freshly created order, enriched for client display.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedOrder {
    #[serde(flatten)]
    pub view: OrderView,
    pub subtotal: i64,
    pub shipping: i64,
    pub address: Address,
}

/// Orchestrates order creation and fulfillment.
#[derive(Clone)]
pub struct OrderWorkflow {
    store: Arc<dyn OrderStore>,
    channel: Arc<dyn NotificationChannel>,
    shipping: ShippingConfig,
    coverage: CoverageGuard,
}

impl OrderWorkflow {
    #[must_use]
    pub fn new(
        store: Arc<dyn OrderStore>,
        channel: Arc<dyn NotificationChannel>,
        shipping: ShippingConfig,
    ) -> Self {
        let coverage = CoverageGuard::new(&shipping);
        Self {
            store,
            channel,
            shipping,
            coverage,
        }
    }

    /// Create an order from a cart.
    ///
    /// Validation happens in a fixed sequence (address, coverage, cart,
    /// products, stock pre-check) so clients get the most specific error.
    /// The stock pre-check fails fast; the conditional decrement inside
    /// [`OrderStore::create_order`] is the authoritative guard against
    /// concurrent oversell.
    ///
    /// # Errors
    ///
    /// See [`WorkflowError`]; every failure before the transactional insert
    /// leaves no trace, and a failure inside it rolls everything back.
    pub async fn create(
        &self,
        user_id: UserId,
        input: CreateOrderInput,
    ) -> Result<CreatedOrder, WorkflowError> {
        let address = self
            .store
            .address_for_user(input.address_id, user_id)
            .await?
            .ok_or(WorkflowError::AddressNotFound)?;

        let km = self
            .coverage
            .check(address.lat, address.lng)
            .map_err(|e| match e {
                CoverageError::MissingGeo => WorkflowError::AddressMissingGeo,
                CoverageError::OutOfRange { .. } => WorkflowError::CoverageOutOfRange,
            })?;

        if input.items.is_empty() {
            return Err(WorkflowError::EmptyCart);
        }
        for item in &input.items {
            if item.quantity < 1 {
                return Err(WorkflowError::InvalidQuantity(item.product_id));
            }
        }

        let unique_ids: HashSet<ProductId> =
            input.items.iter().map(|i| i.product_id).collect();
        let ids: Vec<ProductId> = unique_ids.iter().copied().collect();
        let products = self.store.products_by_ids(&ids).await?;
        if products.len() != unique_ids.len() {
            return Err(WorkflowError::ProductNotFound);
        }
        let by_id: HashMap<ProductId, _> = products.into_iter().map(|p| (p.id, p)).collect();

        let mut subtotal: i64 = 0;
        let mut new_items = Vec::with_capacity(input.items.len());
        for item in &input.items {
            let product = by_id
                .get(&item.product_id)
                .ok_or(WorkflowError::ProductNotFound)?;
            if product.stock < item.quantity {
                return Err(WorkflowError::OutOfStock(product.id));
            }
            subtotal += product.price * i64::from(item.quantity);
            new_items.push(NewOrderItem {
                product_id: item.product_id,
                quantity: item.quantity,
                unit_price: product.price,
            });
        }

        let shipping = shipping_for_km(
            km,
            self.shipping.base,
            self.shipping.per_km,
            self.shipping.min,
        );
        let total = subtotal + shipping;

        let view = self
            .store
            .create_order(NewOrder {
                user_id,
                total,
                items: new_items,
            })
            .await?;

        // Post-commit: confirmation is best-effort and must never undo the
        // order. The attempt lands in the log either way.
        let to = self.recipient_phone(user_id).await;
        let confirmation = OrderConfirmation {
            to: to.clone(),
            order_id: view.order.id,
            subtotal,
            shipping,
            total,
            payment_method: input
                .payment_method
                .unwrap_or_else(|| "COD".to_owned()),
            items: view
                .items
                .iter()
                .map(|i| ItemLine {
                    name: i.product_name.clone(),
                    quantity: i.quantity,
                    price: i.unit_price,
                })
                .collect(),
            address_label: address.label.clone(),
            address_line: address.summary_line(),
            notes: input.notes.or_else(|| address.notes.clone()),
        };
        let outcome = self.channel.send_order_confirmation(&confirmation).await;
        self.log_attempt(view.order.id, NotificationKind::OrderCreated, &to, outcome)
            .await;

        Ok(CreatedOrder {
            view,
            subtotal,
            shipping,
            address,
        })
    }

    /// Move an order to a new status, notifying the customer.
    ///
    /// # Errors
    ///
    /// `OrderNotFound` when the order does not exist, `IllegalTransition`
    /// when the move is not in the transition table, `StatusConflict` when
    /// another update won the race between read and write.
    pub async fn update_status(
        &self,
        order_id: OrderId,
        new_status: OrderStatus,
    ) -> Result<OrderView, WorkflowError> {
        let current = self
            .store
            .order_by_id(order_id)
            .await?
            .ok_or(WorkflowError::OrderNotFound)?;
        current.order.status.transition_to(new_status)?;

        let updated = self
            .store
            .set_status(order_id, current.order.status, new_status)
            .await?;

        if matches!(
            new_status,
            OrderStatus::EnRoute | OrderStatus::Delivered | OrderStatus::Cancelled
        ) {
            let to = self.recipient_phone(updated.order.user_id).await;
            let outcome = self
                .channel
                .send_status_update(&StatusUpdate {
                    to: to.clone(),
                    order_id,
                    new_status,
                })
                .await;
            self.log_attempt(
                order_id,
                NotificationKind::StatusChanged(new_status),
                &to,
                outcome,
            )
            .await;
        }

        Ok(updated)
    }

    /// Fetch one order for the caller.
    ///
    /// Non-owners get `OrderNotFound` rather than `Forbidden`, uniformly, so
    /// order ids of other customers are not probeable.
    ///
    /// # Errors
    ///
    /// `OrderNotFound` when missing or not visible to the caller.
    pub async fn find_for_user(
        &self,
        order_id: OrderId,
        principal: &Principal,
    ) -> Result<OrderView, WorkflowError> {
        let view = self
            .store
            .order_by_id(order_id)
            .await?
            .ok_or(WorkflowError::OrderNotFound)?;
        if !principal.role.is_admin() && view.order.user_id != principal.id {
            return Err(WorkflowError::OrderNotFound);
        }
        Ok(view)
    }

    /// The caller's orders, newest first.
    ///
    /// # Errors
    ///
    /// Storage failures only.
    pub async fn list_mine(&self, user_id: UserId) -> Result<Vec<OrderView>, WorkflowError> {
        Ok(self.store.orders_for_user(user_id).await?)
    }

    /// All orders, newest first (admin).
    ///
    /// # Errors
    ///
    /// Storage failures only.
    pub async fn list_all(&self) -> Result<Vec<OrderView>, WorkflowError> {
        Ok(self.store.all_orders().await?)
    }

    /// Delete an order and its items (admin).
    ///
    /// # Errors
    ///
    /// `OrderNotFound` when the order does not exist.
    pub async fn remove(&self, order_id: OrderId) -> Result<(), WorkflowError> {
        Ok(self.store.delete_order(order_id).await?)
    }

    /// Notification log rows for an order, newest first (admin).
    ///
    /// # Errors
    ///
    /// Storage failures only.
    pub async fn notifications(
        &self,
        order_id: OrderId,
    ) -> Result<Vec<NotificationLog>, WorkflowError> {
        Ok(self.store.notification_logs(order_id).await?)
    }

    /// Resolve the customer's phone for dispatch. Failures degrade to an
    /// empty number (the provider rejects it and the log records that).
    async fn recipient_phone(&self, user_id: UserId) -> Phone {
        let raw = match self.store.user_by_id(user_id).await {
            Ok(Some(user)) => user.phone.unwrap_or_default(),
            Ok(None) => String::new(),
            Err(e) => {
                tracing::warn!(error = %e, %user_id, "could not load user for notification");
                String::new()
            }
        };
        Phone::normalize_co(&raw)
    }

    /// Upsert the notification log row for this attempt. A failed log write
    /// is reported but never propagated: the order operation already
    /// succeeded.
    async fn log_attempt(
        &self,
        order_id: OrderId,
        kind: NotificationKind,
        to: &Phone,
        outcome: SendOutcome,
    ) {
        let error = if outcome.ok {
            None
        } else {
            outcome.error.or_else(|| Some("send failed".to_owned()))
        };
        let attempt = NotificationAttempt {
            order_id,
            kind,
            to: to.as_str().to_owned(),
            ok: outcome.ok,
            sid: outcome.sid,
            error,
        };
        if let Err(e) = self.store.upsert_notification_log(attempt).await {
            tracing::error!(error = %e, %order_id, "failed to record notification attempt");
        }
    }
}

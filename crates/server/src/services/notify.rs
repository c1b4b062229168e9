//! Outbound notification seam.
//!
//! The workflow only contracts this interface; the Twilio-backed
//! implementation lives in [`crate::services::whatsapp`]. Sends are
//! infallible by construction: failures come back as `ok: false` with an
//! error string and end up in the notification log, never in the HTTP
//! response.

use async_trait::async_trait;
use licorera_core::{OrderId, OrderStatus, Phone};

/// Result of one send attempt. Never an `Err`; delivery is best-effort.
#[derive(Debug, Clone, Default)]
pub struct SendOutcome {
    pub ok: bool,
    /// Provider message id, when the provider accepted the message.
    pub sid: Option<String>,
    /// Why the send did not happen (`disabled`, `twilio_not_ready`, or a
    /// provider error).
    pub error: Option<String>,
}

impl SendOutcome {
    #[must_use]
    pub fn sent(sid: String) -> Self {
        Self {
            ok: true,
            sid: Some(sid),
            error: None,
        }
    }

    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            sid: None,
            error: Some(error.into()),
        }
    }
}

/// One cart line as rendered into the confirmation message.
#[derive(Debug, Clone)]
pub struct ItemLine {
    pub name: String,
    pub quantity: i32,
    pub price: i64,
}

/// Payload for the order confirmation sent right after checkout.
#[derive(Debug, Clone)]
pub struct OrderConfirmation {
    pub to: Phone,
    pub order_id: OrderId,
    pub subtotal: i64,
    pub shipping: i64,
    pub total: i64,
    pub payment_method: String,
    pub items: Vec<ItemLine>,
    pub address_label: String,
    pub address_line: String,
    pub notes: Option<String>,
}

/// Payload for the short message sent on a status change.
#[derive(Debug, Clone)]
pub struct StatusUpdate {
    pub to: Phone,
    pub order_id: OrderId,
    pub new_status: OrderStatus,
}

/// A customer-facing messaging channel.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    async fn send_order_confirmation(&self, msg: &OrderConfirmation) -> SendOutcome;

    async fn send_status_update(&self, msg: &StatusUpdate) -> SendOutcome;
}

//! Notification audit log model.

use chrono::{DateTime, Utc};
use licorera_core::{NotificationLogId, OrderId};
use serde::Serialize;

/// One notification attempt per `(order_id, kind)`.
///
/// The unique key makes retried attempts idempotent in the audit trail
/// (last write wins); it does not deduplicate the underlying send.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct NotificationLog {
    pub id: NotificationLogId,
    pub order_id: OrderId,
    pub channel: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: String,
    #[sqlx(rename = "recipient")]
    pub to: String,
    pub ok: bool,
    pub sid: Option<String>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

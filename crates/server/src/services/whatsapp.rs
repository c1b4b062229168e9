//! Twilio WhatsApp implementation of the notification channel.
//!
//! Uses the Messages REST endpoint with a free-text body (the sandbox
//! route). Every failure, including a disabled channel or missing
//! credentials, is folded into the returned [`SendOutcome`] rather than
//! propagated.

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::Deserialize;

use crate::config::WhatsAppConfig;

use super::notify::{NotificationChannel, OrderConfirmation, SendOutcome, StatusUpdate};

/// Twilio REST API base URL.
const BASE_URL: &str = "https://api.twilio.com/2010-04-01";

/// Maximum item lines rendered into a confirmation before truncating.
const MAX_ITEM_LINES: usize = 8;

/// Store name shown in message headers.
const TENANT: &str = "Expolicores Villa de Leyva";

#[derive(Debug, Deserialize)]
struct MessageResponse {
    sid: Option<String>,
}

/// WhatsApp client over the Twilio Messages API.
#[derive(Debug, Clone)]
pub struct WhatsAppClient {
    cfg: WhatsAppConfig,
    http: reqwest::Client,
}

impl WhatsAppClient {
    #[must_use]
    pub fn new(cfg: WhatsAppConfig) -> Self {
        Self {
            cfg,
            http: reqwest::Client::new(),
        }
    }

    async fn dispatch(&self, to: &str, body: String) -> SendOutcome {
        if !self.cfg.is_configured() {
            return SendOutcome::failed("twilio_not_ready");
        }

        let url = format!(
            "{BASE_URL}/Accounts/{}/Messages.json",
            self.cfg.account_sid
        );
        let params = [
            ("From", self.cfg.from.clone()),
            ("To", format!("whatsapp:{to}")),
            ("Body", body),
        ];

        let response = self
            .http
            .post(&url)
            .basic_auth(&self.cfg.account_sid, Some(self.cfg.auth_token.expose_secret()))
            .form(&params)
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => match resp.json::<MessageResponse>().await {
                Ok(msg) => SendOutcome {
                    ok: true,
                    sid: msg.sid,
                    error: None,
                },
                Err(e) => SendOutcome::failed(format!("bad provider response: {e}")),
            },
            Ok(resp) => {
                let status = resp.status();
                let text = resp.text().await.unwrap_or_default();
                tracing::warn!(%status, "twilio rejected message");
                SendOutcome::failed(format!("http {status}: {text}"))
            }
            Err(e) => {
                tracing::warn!(error = %e, "twilio request failed");
                SendOutcome::failed(e.to_string())
            }
        }
    }
}

#[async_trait]
impl NotificationChannel for WhatsAppClient {
    async fn send_order_confirmation(&self, msg: &OrderConfirmation) -> SendOutcome {
        if !self.cfg.enabled {
            return SendOutcome::failed("disabled");
        }
        self.dispatch(msg.to.as_str(), render_confirmation(msg)).await
    }

    async fn send_status_update(&self, msg: &StatusUpdate) -> SendOutcome {
        if !self.cfg.enabled || !self.cfg.send_status_updates {
            return SendOutcome::failed("disabled");
        }
        self.dispatch(msg.to.as_str(), render_status(msg)).await
    }
}

/// Format integer pesos the way the es-CO locale does: `$12.500`.
#[must_use]
pub fn format_cop(amount: i64) -> String {
    let negative = amount < 0;
    let digits = amount.unsigned_abs().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 2);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }

    if negative {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

fn render_confirmation(msg: &OrderConfirmation) -> String {
    let head = format!("*{TENANT}* \u{2705}\nConfirmación de pedido #{}", msg.order_id);
    let lines: Vec<String> = msg
        .items
        .iter()
        .take(MAX_ITEM_LINES)
        .map(|i| format!("• {}× {}", i.quantity, i.name))
        .collect();
    let more = if msg.items.len() > MAX_ITEM_LINES {
        format!("…(+{} ítems)", msg.items.len() - MAX_ITEM_LINES)
    } else {
        String::new()
    };
    let payment = if msg.payment_method == "COD" {
        "Contraentrega"
    } else {
        msg.payment_method.as_str()
    };
    let address = format!("{} — {}", msg.address_label, msg.address_line);
    let notes = msg
        .notes
        .as_deref()
        .map(|n| format!("\n\u{1f4dd} Notas: {n}"))
        .unwrap_or_default();

    format!(
        "{head}\n{} {more}\n————————————\nSubtotal: {}\nEnvío:    {}\nTotal:    {}\nPago: {payment}\nEntrega a: {address}{notes}\n\n¡Gracias por tu compra! \u{1f942}\nConsulta tus pedidos en la app: *Perfil → Mis pedidos*",
        lines.join("\n"),
        format_cop(msg.subtotal),
        format_cop(msg.shipping),
        format_cop(msg.total),
    )
}

fn render_status(msg: &StatusUpdate) -> String {
    use licorera_core::OrderStatus;

    let status_text = match msg.new_status {
        OrderStatus::EnRoute => "\u{1f69a} Tu pedido va en camino.",
        OrderStatus::Delivered => "\u{2705} Tu pedido fue entregado.",
        OrderStatus::Cancelled => "\u{274c} Tu pedido fue cancelado.",
        OrderStatus::Received => "Tu pedido fue recibido.",
    };
    format!(
        "*{TENANT}* – Pedido #{}\n{status_text}\nGracias por comprar con nosotros.",
        msg.order_id
    )
}

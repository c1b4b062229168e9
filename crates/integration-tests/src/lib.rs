//! Integration tests for the Licorera backend.
//!
//! Everything here runs in-process: the workflow and the HTTP router are
//! exercised against [`MemoryStore`] and a recording notification channel,
//! so no database, network, or Twilio account is needed.
//!
//! ```bash
//! cargo test -p licorera-integration-tests
//! ```
//!
//! The test files under `tests/` split by surface:
//!
//! - `workflow_orders` - order creation rules (coverage, stock, totals)
//! - `workflow_status` - the status state machine and its notifications
//! - `concurrency` - racing creates and status updates
//! - `http_orders` - the REST surface through the real router

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use licorera_core::{AddressId, OrderStatus, ProductId, Role, UserId};
use licorera_server::config::ShippingConfig;
use licorera_server::middleware::dev_header_auth;
use licorera_server::models::{Address, Product, User};
use licorera_server::services::notify::{
    NotificationChannel, OrderConfirmation, SendOutcome, StatusUpdate,
};
use licorera_server::services::OrderWorkflow;
use licorera_server::state::AppState;
use licorera_server::store::{MemoryStore, OrderStore};
use licorera_server::{geo, routes};

/// Well-known ids seeded by [`TestContext::new`].
pub const CLIENTE_ID: i32 = 1;
pub const ADMIN_ID: i32 = 2;
pub const OTHER_CLIENTE_ID: i32 = 3;
pub const HOME_ADDRESS_ID: i32 = 1;

/// One send observed by [`RecordingChannel`].
#[derive(Debug, Clone)]
pub enum Sent {
    Confirmation {
        to: String,
        order_id: i32,
        subtotal: i64,
        shipping: i64,
        total: i64,
    },
    Status {
        to: String,
        order_id: i32,
        new_status: OrderStatus,
    },
}

/// Notification channel that records every payload instead of talking to a
/// provider. The next outcome can be forced to a failure per test.
#[derive(Debug, Default)]
pub struct RecordingChannel {
    sent: Mutex<Vec<Sent>>,
    fail_with: Mutex<Option<String>>,
}

impl RecordingChannel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following send report a failure with this error string.
    pub fn fail_with(&self, error: &str) {
        *self.fail_with.lock().expect("channel mutex") = Some(error.to_owned());
    }

    #[must_use]
    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().expect("channel mutex").clone()
    }

    fn outcome(&self) -> SendOutcome {
        match self.fail_with.lock().expect("channel mutex").clone() {
            Some(error) => SendOutcome::failed(error),
            None => SendOutcome::sent(format!(
                "SM{:04}",
                self.sent.lock().expect("channel mutex").len()
            )),
        }
    }
}

#[async_trait]
impl NotificationChannel for RecordingChannel {
    async fn send_order_confirmation(&self, msg: &OrderConfirmation) -> SendOutcome {
        let outcome = self.outcome();
        self.sent.lock().expect("channel mutex").push(Sent::Confirmation {
            to: msg.to.as_str().to_owned(),
            order_id: msg.order_id.as_i32(),
            subtotal: msg.subtotal,
            shipping: msg.shipping,
            total: msg.total,
        });
        outcome
    }

    async fn send_status_update(&self, msg: &StatusUpdate) -> SendOutcome {
        let outcome = self.outcome();
        self.sent.lock().expect("channel mutex").push(Sent::Status {
            to: msg.to.as_str().to_owned(),
            order_id: msg.order_id.as_i32(),
            new_status: msg.new_status,
        });
        outcome
    }
}

/// Shipping config with the store at the origin. Keeping the store at
/// (0, 0) makes [`lat_for_km`] exact enough for boundary tests.
#[must_use]
pub fn shipping_at_origin(radius_km: f64) -> ShippingConfig {
    ShippingConfig {
        store_lat: 0.0,
        store_lng: 0.0,
        radius_km,
        base: 2000,
        per_km: 400,
        min: 5000,
    }
}

/// Latitude (at longitude 0) that sits `km` kilometers due north of the
/// origin.
#[must_use]
pub fn lat_for_km(km: f64) -> f64 {
    km / (6371.0 * std::f64::consts::PI / 180.0)
}

/// Measured surface distance from the origin to [`lat_for_km`]`(km)`.
#[must_use]
pub fn measured_km(km: f64) -> f64 {
    geo::haversine_km(
        geo::GeoPoint::new(0.0, 0.0),
        geo::GeoPoint::new(lat_for_km(km), 0.0),
    )
}

/// Fully wired workflow over seeded in-memory data.
pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub channel: Arc<RecordingChannel>,
    pub workflow: OrderWorkflow,
}

impl TestContext {
    /// Store at the origin with a 12 km radius, two customers, one admin,
    /// and a small catalog. The home address sits about 8 km out.
    #[must_use]
    pub fn new() -> Self {
        Self::with_shipping(shipping_at_origin(12.0))
    }

    #[must_use]
    pub fn with_shipping(shipping: ShippingConfig) -> Self {
        let store = Arc::new(MemoryStore::new());

        store.insert_user(User {
            id: UserId::new(CLIENTE_ID),
            name: "Cliente Uno".to_owned(),
            email: "cliente1@example.com".to_owned(),
            phone: Some("3001234567".to_owned()),
            role: Role::Cliente,
        });
        store.insert_user(User {
            id: UserId::new(ADMIN_ID),
            name: "Admin".to_owned(),
            email: "admin@expolicores.com".to_owned(),
            phone: Some("3009999999".to_owned()),
            role: Role::Admin,
        });
        store.insert_user(User {
            id: UserId::new(OTHER_CLIENTE_ID),
            name: "Cliente Dos".to_owned(),
            email: "cliente2@example.com".to_owned(),
            phone: None,
            role: Role::Cliente,
        });

        store.insert_address(address(HOME_ADDRESS_ID, CLIENTE_ID, Some(lat_for_km(8.0)), Some(0.0)));

        store.insert_product(product(1, "Club Colombia Dorada 330ml", 4500, 100));
        store.insert_product(product(2, "Poker Lata 330ml", 3500, 120));
        store.insert_product(product(3, "Old Parr 12 750ml", 135_000, 3));

        let channel = Arc::new(RecordingChannel::new());
        let workflow = OrderWorkflow::new(
            Arc::clone(&store) as Arc<dyn OrderStore>,
            Arc::clone(&channel) as Arc<dyn NotificationChannel>,
            shipping,
        );
        Self {
            store,
            channel,
            workflow,
        }
    }

    /// The full application router with the dev header auth layer, as wired
    /// in `main`. Tests authenticate with `x-user-id` / `x-user-role`.
    #[must_use]
    pub fn router(&self) -> Router {
        routes::router(AppState::new(self.workflow.clone()))
            .layer(axum::middleware::from_fn(dev_header_auth))
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// An address for `user_id` at the given coordinates.
#[must_use]
pub fn address(id: i32, user_id: i32, lat: Option<f64>, lng: Option<f64>) -> Address {
    Address {
        id: AddressId::new(id),
        user_id: UserId::new(user_id),
        label: "Casa".to_owned(),
        recipient: "Cliente Uno".to_owned(),
        phone: "3001234567".to_owned(),
        line1: "Cra 9 #12-34".to_owned(),
        line2: None,
        neighborhood: Some("Centro".to_owned()),
        city: Some("Villa de Leyva".to_owned()),
        lat,
        lng,
        notes: None,
        is_default: true,
    }
}

#[must_use]
pub fn product(id: i32, name: &str, price: i64, stock: i32) -> Product {
    Product {
        id: ProductId::new(id),
        name: name.to_owned(),
        price,
        stock,
        category: Some("Cerveza".to_owned()),
        description: None,
        image_url: None,
    }
}

//! Licorera order backend - liquor delivery order API.
//!
//! # Architecture
//!
//! - Axum JSON API consumed by the mobile client
//! - `PostgreSQL` via sqlx for orders, items, stock, and the notification log
//!   (or the in-memory store with `STORE_BACKEND=memory` for local runs)
//! - Twilio WhatsApp for customer notifications, best-effort with an
//!   idempotent audit log
//!
//! Authentication is handled upstream; see `middleware::auth`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use licorera_server::config::{ServerConfig, StoreBackend};
use licorera_server::middleware;
use licorera_server::routes;
use licorera_server::services::{OrderWorkflow, WhatsAppClient};
use licorera_server::state::AppState;
use licorera_server::store::{self, MemoryStore, OrderStore, PgStore};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ServerConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    // Load configuration from environment (needed for Sentry init).
    // Fails fast on missing or non-numeric store coordinates.
    let config = ServerConfig::from_env().expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "licorera_server=info,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let order_store: Arc<dyn OrderStore> = match config.store_backend {
        StoreBackend::Postgres => {
            let database_url = config
                .database_url
                .as_ref()
                .expect("DATABASE_URL required for the postgres backend");
            let pool = store::postgres::create_pool(database_url)
                .await
                .expect("Failed to create database pool");
            tracing::info!("Database pool created");
            Arc::new(PgStore::new(pool))
        }
        StoreBackend::Memory => {
            tracing::warn!("Running with the in-memory store; nothing will persist");
            Arc::new(MemoryStore::new())
        }
    };

    let channel = Arc::new(WhatsAppClient::new(config.whatsapp.clone()));
    let workflow = OrderWorkflow::new(order_store, channel, config.shipping);
    let state = AppState::new(workflow);

    let mut app = routes::router(state)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());
    if config.dev_header_auth {
        tracing::warn!("DEV_HEADER_AUTH is on; trusting x-user-id/x-user-role headers");
        app = app.layer(axum::middleware::from_fn(middleware::dev_header_auth));
    }

    let addr = config.socket_addr();
    tracing::info!(%addr, "Listening");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");
    axum::serve(listener, app).await.expect("Server error");
}

//! HTTP routes.

pub mod health;
pub mod orders;

use axum::{
    Router,
    routing::{get, patch},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the application router.
#[must_use]
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/orders", get(orders::list_all).post(orders::create))
        .route("/orders/my", get(orders::list_mine))
        .route("/orders/{id}", get(orders::find_one).delete(orders::remove))
        .route("/orders/{id}/status", patch(orders::update_status))
        .route(
            "/orders/{id}/notifications",
            get(orders::list_notifications),
        )
        .layer(TraceLayer::new_for_http())
        // The mobile client is served from a different origin in development.
        .layer(CorsLayer::permissive())
        .with_state(state)
}

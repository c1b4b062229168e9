//! Application state shared across handlers.

use std::sync::Arc;

use crate::services::OrderWorkflow;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Holds the order workflow (which owns the
/// store and notification seams behind trait objects), so the same router
/// runs against Postgres in production and the in-memory store in tests.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    workflow: OrderWorkflow,
}

impl AppState {
    #[must_use]
    pub fn new(workflow: OrderWorkflow) -> Self {
        Self {
            inner: Arc::new(AppStateInner { workflow }),
        }
    }

    /// Get a reference to the order workflow.
    #[must_use]
    pub fn workflow(&self) -> &OrderWorkflow {
        &self.inner.workflow
    }
}

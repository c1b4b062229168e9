//! Unified error handling with Sentry integration.
//!
//! Route handlers return `Result<T, AppError>`. Business failures map to 4xx
//! with the machine-readable codes the mobile client switches on; storage and
//! internal failures are captured to Sentry and collapse to an opaque 500.

use axum::{
    Json,
    extract::FromRequest,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::services::WorkflowError;
use crate::store::StoreError;

/// Application-level error type for the order API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Order workflow business failure.
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    /// Malformed or unparseable JSON request body.
    #[error("Invalid request body: {0}")]
    BadBody(#[from] JsonRejection),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON body extractor whose rejection keeps the `{"error": CODE}` shape the
/// mobile client switches on instead of axum's default 422 text.
#[derive(FromRequest)]
#[from_request(via(Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        Self::Workflow(WorkflowError::from(e))
    }
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Workflow(err) => match err {
                WorkflowError::EmptyCart
                | WorkflowError::InvalidQuantity(_)
                | WorkflowError::AddressMissingGeo
                | WorkflowError::CoverageOutOfRange => StatusCode::BAD_REQUEST,
                WorkflowError::AddressNotFound
                | WorkflowError::ProductNotFound
                | WorkflowError::OrderNotFound => StatusCode::NOT_FOUND,
                WorkflowError::OutOfStock(_)
                | WorkflowError::IllegalTransition(_)
                | WorkflowError::StatusConflict => StatusCode::CONFLICT,
                WorkflowError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::BadBody(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> String {
        match self {
            Self::Workflow(err) => err.code(),
            Self::BadBody(_) => "VALIDATION".to_owned(),
            Self::Internal(_) => "INTERNAL".to_owned(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry; business failures are expected
        // traffic and stay out of it.
        if matches!(
            self,
            Self::Internal(_) | Self::Workflow(WorkflowError::Store(_))
        ) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();
        let body = Json(serde_json::json!({ "error": self.code() }));
        (status, body).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use licorera_core::{OrderStatus, ProductId};

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn business_errors_map_to_client_statuses() {
        assert_eq!(
            status_of(WorkflowError::EmptyCart.into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(WorkflowError::AddressMissingGeo.into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(WorkflowError::AddressNotFound.into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(WorkflowError::OutOfStock(ProductId::new(3)).into()),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn out_of_stock_code_carries_the_product_id() {
        let err: AppError = WorkflowError::OutOfStock(ProductId::new(42)).into();
        assert_eq!(err.code(), "OUT_OF_STOCK:42");
    }

    #[test]
    fn illegal_transition_is_a_conflict() {
        let transition_err = OrderStatus::Delivered
            .transition_to(OrderStatus::Received)
            .expect_err("illegal");
        let err: AppError = WorkflowError::IllegalTransition(transition_err).into();
        assert_eq!(err.code(), "ILLEGAL_TRANSITION");
        assert_eq!(status_of(err), StatusCode::CONFLICT);
    }
}

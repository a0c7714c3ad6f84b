//! HTTP surface: catalog reads, server-side quotes, the payment-intent gate
//! and order confirmation emails.

mod checkout;
mod orders;
mod products;

use axum::{http::StatusCode, response::IntoResponse, routing::{get, post}, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::domain::ports::{Catalog, EmailSender, PaymentGateway, StoreError};
use crate::domain::services::DiscountGate;
use crate::ConfiguratorError;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn Catalog>,
    pub discounts: DiscountGate,
    pub payments: Arc<dyn PaymentGateway>,
    pub email: Arc<dyn EmailSender>,
    /// Lowercase ISO currency used for quotes and payment intents.
    pub currency: String,
    pub email_from: String,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "bouquet-configurator"})) }))
        .route("/api/v1/products/:id", get(products::get_product))
        .route("/api/v1/products/:id/reviews", get(products::list_reviews))
        .route("/api/v1/products/:id/quote", post(products::quote))
        .route("/api/v1/payment-intents", post(checkout::create_payment_intent))
        .route("/api/v1/orders/confirmation", post(orders::send_confirmation))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

/// Error response rendered as `{"error": {"code", "message", "details"?}}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
    details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self { status, code, message: message.into(), details: None }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn not_found(message: impl Into<String>) -> Self { Self::new(StatusCode::NOT_FOUND, "not_found", message) }
    pub fn validation(message: impl Into<String>) -> Self { Self::new(StatusCode::BAD_REQUEST, "validation_error", message) }
    pub fn internal(message: impl Into<String>) -> Self { Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message) }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let body = ErrorEnvelope { error: ErrorBody { code: self.code, message: self.message, details: self.details } };
        (self.status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        tracing::error!(error = %error, "data service lookup failed");
        Self::internal("data service unavailable")
    }
}

impl From<ConfiguratorError> for ApiError {
    fn from(error: ConfiguratorError) -> Self {
        match error {
            ConfiguratorError::ProductNotFound(id) => Self::not_found(format!("product {id} not found")),
            ConfiguratorError::Storage(e) => e.into(),
            ConfiguratorError::Selection(notice) => {
                Self::new(StatusCode::UNPROCESSABLE_ENTITY, "selection_rejected", notice.message(Default::default()))
            }
            ConfiguratorError::NotReady(blockers) => {
                let error = Self::new(StatusCode::UNPROCESSABLE_ENTITY, "checkout_blocked", "selection is not ready for checkout");
                match serde_json::to_value(&blockers) {
                    Ok(details) => error.with_details(serde_json::json!({ "blockers": details })),
                    Err(_) => error,
                }
            }
            ConfiguratorError::Serialization(e) => {
                tracing::error!(error = %e, "serialization failed");
                Self::internal("internal error")
            }
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self { Self::validation(errors.to_string()) }
}

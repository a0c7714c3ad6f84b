use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use validator::Validate;

use super::{ApiError, AppState};
use crate::domain::aggregates::order::OrderConfirmation;
use crate::domain::ports::PaymentError;

/// Same answer for every unverified request.
const UNVERIFIED: &str = "order payment could not be verified";

#[derive(Debug, Deserialize, Validate)]
pub struct ConfirmationRequest {
    /// The settled payment intent this order was paid with.
    #[validate(length(min = 1, max = 255))]
    pub payment_intent_id: String,
    #[validate]
    pub order: OrderConfirmation,
}

/// Sends the confirmation email once the payment processor reports success.
pub async fn send_confirmation(
    State(s): State<AppState>,
    Json(r): Json<ConfirmationRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    r.validate()?;
    let intent_id = r.payment_intent_id.as_str();
    let payment = s.payments.retrieve_intent(intent_id).await.map_err(|e| match e {
        PaymentError::Http(_) => {
            tracing::error!(error = %e, intent_id, "payment lookup failed");
            ApiError::internal("confirmation email could not be sent")
        }
        _ => {
            tracing::warn!(error = %e, intent_id, "confirmation for unknown payment");
            ApiError::new(StatusCode::FORBIDDEN, "payment_unverified", UNVERIFIED)
        }
    })?;

    let confirmation = r.order;
    if let Err(mismatch) = confirmation.verify_payment(&payment) {
        tracing::warn!(intent_id, reason = %mismatch, "confirmation does not match payment");
        return Err(ApiError::new(StatusCode::FORBIDDEN, "payment_unverified", UNVERIFIED));
    }

    let email = confirmation.to_email(&s.email_from);
    s.email.send(email).await.map_err(|e| {
        tracing::error!(error = %e, lines = confirmation.lines.len(), "order confirmation email failed");
        ApiError::internal("confirmation email could not be sent")
    })?;
    tracing::info!(intent_id, lines = confirmation.lines.len(), total = %confirmation.total, "order confirmation sent");
    Ok(Json(serde_json::json!({ "status": "sent" })))
}

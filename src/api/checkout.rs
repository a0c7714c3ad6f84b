use axum::{extract::State, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use validator::Validate;

use super::{ApiError, AppState};
use crate::domain::ports::PaymentIntentRequest;
use crate::domain::services::GateError;

/// Shown for every failure on this route so rejected codes cannot be told apart.
const PAYMENT_FAILED: &str = "payment could not be created";

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePaymentIntentRequest {
    /// Client-computed total in minor units; forwarded as-is.
    #[validate(range(min = 1))]
    pub amount: i64,
    #[validate(length(equal = 3))]
    pub currency: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub discount_code: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct PaymentIntentResponse {
    pub id: String,
    pub client_secret: String,
}

pub async fn create_payment_intent(
    State(s): State<AppState>,
    Json(r): Json<CreatePaymentIntentRequest>,
) -> Result<Json<PaymentIntentResponse>, ApiError> {
    r.validate()?;
    let code = r.discount_code.as_deref().map(str::trim).filter(|c| !c.is_empty()).map(str::to_string);

    if let Some(code) = &code {
        match s.discounts.reserve(code, Utc::now()).await {
            Ok(_) => {}
            // the gate already logged the reason
            Err(GateError::Rejected(_)) => return Err(ApiError::internal(PAYMENT_FAILED)),
            Err(GateError::Store(e)) => {
                tracing::error!(error = %e, "discount lookup failed");
                return Err(ApiError::internal(PAYMENT_FAILED));
            }
        }
    }

    let request = PaymentIntentRequest {
        amount_minor: r.amount,
        currency: r.currency.unwrap_or_else(|| s.currency.clone()).to_lowercase(),
        metadata: r.metadata,
        discount_code: code.clone(),
    };

    match s.payments.create_intent(request).await {
        Ok(intent) => Ok(Json(PaymentIntentResponse { id: intent.id, client_secret: intent.client_secret })),
        Err(e) => {
            tracing::error!(error = %e, "payment intent creation failed");
            if let Some(code) = &code {
                if let Err(release) = s.discounts.release(code).await {
                    tracing::error!(error = %release, code = %code, "releasing discount reservation failed");
                }
            }
            Err(ApiError::internal(PAYMENT_FAILED))
        }
    }
}

//! HTTP client for the payment processor's payment-intent endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::domain::ports::{PaymentError, PaymentGateway, PaymentIntent, PaymentIntentRequest, PaymentRecord};

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Posts form-encoded payment intents with a bearer secret key.
///
/// Use [`HttpPaymentGateway::new`] with the processor's base URL; tests point
/// it at a mock server.
#[derive(Clone)]
pub struct HttpPaymentGateway {
    client: Client,
    base_url: String,
    secret_key: String,
}

impl HttpPaymentGateway {
    /// # Errors
    ///
    /// Returns [`PaymentError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(base_url: &str, secret_key: &str, timeout_secs: u64) -> Result<Self, PaymentError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            secret_key: secret_key.to_owned(),
        })
    }
}

/// Intent ids are interpolated into the request path.
fn is_intent_id(id: &str) -> bool {
    !id.is_empty() && id.len() <= 255 && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

async fn rejection(response: reqwest::Response) -> PaymentError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorEnvelope>(&body).map(|e| e.error.message).unwrap_or(body);
    PaymentError::Rejected { status, message }
}

fn form_fields(request: &PaymentIntentRequest) -> Vec<(String, String)> {
    let mut fields = vec![
        ("amount".to_string(), request.amount_minor.to_string()),
        ("currency".to_string(), request.currency.to_lowercase()),
        ("automatic_payment_methods[enabled]".to_string(), "true".to_string()),
    ];
    fields.extend(request.metadata.iter().map(|(k, v)| (format!("metadata[{k}]"), v.clone())));
    if let Some(code) = &request.discount_code {
        fields.push(("metadata[discount_code]".to_string(), code.clone()));
    }
    fields
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn create_intent(&self, request: PaymentIntentRequest) -> Result<PaymentIntent, PaymentError> {
        if request.amount_minor <= 0 {
            return Err(PaymentError::InvalidAmount(request.amount_minor));
        }

        let response = self
            .client
            .post(format!("{}/v1/payment_intents", self.base_url))
            .bearer_auth(&self.secret_key)
            .form(&form_fields(&request))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }

        let intent = response.json::<PaymentIntent>().await?;
        tracing::info!(intent_id = %intent.id, amount = request.amount_minor, "payment intent created");
        Ok(intent)
    }

    async fn retrieve_intent(&self, id: &str) -> Result<PaymentRecord, PaymentError> {
        if !is_intent_id(id) {
            return Err(PaymentError::InvalidIntentId(id.to_string()));
        }

        let response = self
            .client
            .get(format!("{}/v1/payment_intents/{id}", self.base_url))
            .bearer_auth(&self.secret_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }
        Ok(response.json::<PaymentRecord>().await?)
    }
}

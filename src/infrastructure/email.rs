//! HTTP client for the transactional email provider.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::domain::ports::{EmailError, EmailSender, TemplatedEmail};

#[derive(Clone)]
pub struct HttpEmailSender {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpEmailSender {
    pub fn new(base_url: &str, api_key: &str, timeout_secs: u64) -> Result<Self, EmailError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { client, base_url: base_url.trim_end_matches('/').to_owned(), api_key: api_key.to_owned() })
    }
}

#[async_trait]
impl EmailSender for HttpEmailSender {
    async fn send(&self, email: TemplatedEmail) -> Result<(), EmailError> {
        let response = self
            .client
            .post(format!("{}/emails", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&email)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(EmailError::Rejected { status: status.as_u16(), message });
        }
        tracing::info!(template = %email.template, "email sent");
        Ok(())
    }
}

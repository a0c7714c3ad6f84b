//! Ports to the collaborators the core talks to: the catalog data service,
//! the discount code store, the payment processor and the email sender.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::domain::aggregates::discount::DiscountCode;
use crate::domain::aggregates::product::{Product, Review};
use crate::domain::aggregates::settings::StoreSettings;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A stored document could not be decoded into the domain type.
    #[error("corrupt record {id}: {source}")]
    Corrupt {
        id: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("payment processor rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("amount {0} cannot be charged")]
    InvalidAmount(i64),

    #[error("malformed payment intent id {0:?}")]
    InvalidIntentId(String),
}

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("email provider rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
}

/// Read side of the hosted backend.
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn product(&self, id: &str) -> Result<Option<Product>, StoreError>;
    /// The storewide settings singleton; defaults when none is stored.
    async fn settings(&self) -> Result<StoreSettings, StoreError>;
    async fn approved_reviews(&self, product_id: &str) -> Result<Vec<Review>, StoreError>;
}

#[async_trait]
pub trait DiscountCodeStore: Send + Sync {
    async fn find(&self, code: &str) -> Result<Option<DiscountCode>, StoreError>;

    /// Validates and counts one redemption in a single step. Returns the
    /// updated record, or `None` when the code did not pass validation.
    async fn try_reserve(&self, code: &str, now: DateTime<Utc>) -> Result<Option<DiscountCode>, StoreError>;

    /// Gives back a redemption taken by [`DiscountCodeStore::try_reserve`].
    async fn release(&self, code: &str) -> Result<(), StoreError>;
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntentRequest {
    /// Amount in minor units (cents).
    pub amount_minor: i64,
    pub currency: String,
    pub metadata: BTreeMap<String, String>,
    pub discount_code: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
}

/// An existing payment intent as the processor reports it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: String,
    pub status: String,
    /// Amount in minor units (cents).
    pub amount: i64,
    pub currency: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl PaymentRecord {
    pub fn succeeded(&self) -> bool { self.status == "succeeded" }
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_intent(&self, request: PaymentIntentRequest) -> Result<PaymentIntent, PaymentError>;
    async fn retrieve_intent(&self, id: &str) -> Result<PaymentRecord, PaymentError>;
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TemplatedEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub template: String,
    pub data: serde_json::Value,
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, email: TemplatedEmail) -> Result<(), EmailError>;
}

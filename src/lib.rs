//! Bouquet Configurator
//!
//! Product configuration, pricing and checkout gate for made-to-order bouquets.
//!
//! ## Features
//! - Variant selection against a per-combination stock matrix
//! - Unit and total pricing under storewide and product sales
//! - Extras with per-size caps, quantities and sub-variants
//! - Personalization fields and the consent gate
//! - Canonical cart line identity
//! - Server-side discount code reservation before payment

pub mod api;
pub mod config;
pub mod domain;
pub mod infrastructure;

use thiserror::Error;

use crate::domain::aggregates::selection::SelectionNotice;
use crate::domain::ports::StoreError;
use crate::domain::services::CheckoutBlocker;

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum ConfiguratorError {
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("Selection rejected: {0}")]
    Selection(#[from] SelectionNotice),

    #[error("Checkout not ready: {0:?}")]
    NotReady(Vec<CheckoutBlocker>),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, ConfiguratorError>;

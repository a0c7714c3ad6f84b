//! In-process adapter for the catalog and discount code ports.
//!
//! Backs the router in integration tests and local runs without a database.
//! Reservation is a check-and-increment under one lock, mirroring the
//! conditional UPDATE of the Postgres adapter.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::domain::aggregates::discount::DiscountCode;
use crate::domain::aggregates::product::{Product, Review};
use crate::domain::aggregates::settings::StoreSettings;
use crate::domain::ports::{Catalog, DiscountCodeStore, StoreError};

#[derive(Debug, Default)]
pub struct InMemoryStore {
    products: Mutex<HashMap<String, Product>>,
    settings: Mutex<StoreSettings>,
    reviews: Mutex<Vec<(Review, bool)>>,
    codes: Mutex<HashMap<String, DiscountCode>>,
}

impl InMemoryStore {
    pub fn new() -> Self { Self::default() }

    pub fn insert_product(&self, product: Product) {
        seed(&self.products).insert(product.id.clone(), product);
    }

    pub fn set_settings(&self, settings: StoreSettings) {
        *seed(&self.settings) = settings;
    }

    pub fn insert_review(&self, review: Review, approved: bool) {
        seed(&self.reviews).push((review, approved));
    }

    pub fn insert_code(&self, code: DiscountCode) {
        seed(&self.codes).insert(code.code.clone(), code);
    }
}

// Seeding never leaves partial state behind, so a poisoned lock is still usable.
fn seed<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn guard<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StoreError> {
    mutex.lock().map_err(|_| StoreError::Unavailable("in-memory store lock poisoned".into()))
}

#[async_trait]
impl Catalog for InMemoryStore {
    async fn product(&self, id: &str) -> Result<Option<Product>, StoreError> {
        Ok(guard(&self.products)?.get(id).cloned())
    }

    async fn settings(&self) -> Result<StoreSettings, StoreError> {
        Ok(guard(&self.settings)?.clone())
    }

    async fn approved_reviews(&self, product_id: &str) -> Result<Vec<Review>, StoreError> {
        let mut reviews: Vec<Review> = guard(&self.reviews)?
            .iter()
            .filter(|(review, approved)| *approved && review.product_id == product_id)
            .map(|(review, _)| review.clone())
            .collect();
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reviews)
    }
}

#[async_trait]
impl DiscountCodeStore for InMemoryStore {
    async fn find(&self, code: &str) -> Result<Option<DiscountCode>, StoreError> {
        Ok(guard(&self.codes)?.get(code).cloned())
    }

    async fn try_reserve(&self, code: &str, now: DateTime<Utc>) -> Result<Option<DiscountCode>, StoreError> {
        let mut codes = guard(&self.codes)?;
        match codes.get_mut(code) {
            Some(record) if record.check(now).is_ok() => {
                record.current_uses += 1;
                Ok(Some(record.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn release(&self, code: &str) -> Result<(), StoreError> {
        if let Some(record) = guard(&self.codes)?.get_mut(code) {
            record.current_uses = (record.current_uses - 1).max(0);
        }
        Ok(())
    }
}

//! Postgres adapter for the catalog and discount code ports.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::aggregates::discount::DiscountCode;
use crate::domain::aggregates::product::{Product, Review};
use crate::domain::aggregates::settings::{StockFallback, StoreSettings};
use crate::domain::ports::{Catalog, DiscountCodeStore, StoreError};

#[derive(Debug, Clone, sqlx::FromRow)]
struct SettingsRow {
    storewide_sale_active: bool,
    storewide_discount_percent: Decimal,
    stock_fallback: String,
}

impl From<SettingsRow> for StoreSettings {
    fn from(row: SettingsRow) -> Self {
        let stock_fallback = match row.stock_fallback.as_str() {
            "strict" => StockFallback::Strict,
            _ => StockFallback::Permissive,
        };
        Self {
            storewide_sale_active: row.storewide_sale_active,
            storewide_discount_percent: row.storewide_discount_percent,
            stock_fallback,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct ReviewRow {
    id: Uuid,
    product_id: String,
    author: String,
    rating: i16,
    body: String,
    created_at: DateTime<Utc>,
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        Self { id: row.id, product_id: row.product_id, author: row.author, rating: row.rating, body: row.body, created_at: row.created_at }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct DiscountCodeRow {
    code: String,
    is_active: bool,
    expires_at: Option<DateTime<Utc>>,
    max_uses: Option<i64>,
    current_uses: i64,
}

impl From<DiscountCodeRow> for DiscountCode {
    fn from(row: DiscountCodeRow) -> Self {
        Self { code: row.code, is_active: row.is_active, expires_at: row.expires_at, max_uses: row.max_uses, current_uses: row.current_uses }
    }
}

const DISCOUNT_COLUMNS: &str = "code, is_active, expires_at, max_uses, current_uses";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self { Self { pool } }
}

#[async_trait]
impl Catalog for PgStore {
    async fn product(&self, id: &str) -> Result<Option<Product>, StoreError> {
        let document = sqlx::query_scalar::<_, serde_json::Value>("SELECT document FROM products WHERE id = $1 AND active")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        document
            .map(|doc| serde_json::from_value(doc).map_err(|source| StoreError::Corrupt { id: id.to_string(), source }))
            .transpose()
    }

    async fn settings(&self) -> Result<StoreSettings, StoreError> {
        let row = sqlx::query_as::<_, SettingsRow>(
            "SELECT storewide_sale_active, storewide_discount_percent, stock_fallback FROM store_settings WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(StoreSettings::from).unwrap_or_default())
    }

    async fn approved_reviews(&self, product_id: &str) -> Result<Vec<Review>, StoreError> {
        let rows = sqlx::query_as::<_, ReviewRow>(
            "SELECT id, product_id, author, rating, body, created_at FROM reviews \
             WHERE product_id = $1 AND approved ORDER BY created_at DESC",
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Review::from).collect())
    }
}

#[async_trait]
impl DiscountCodeStore for PgStore {
    async fn find(&self, code: &str) -> Result<Option<DiscountCode>, StoreError> {
        let row = sqlx::query_as::<_, DiscountCodeRow>(&format!("SELECT {DISCOUNT_COLUMNS} FROM discount_codes WHERE code = $1"))
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(DiscountCode::from))
    }

    // One conditional UPDATE: concurrent checkouts cannot both take the last use.
    async fn try_reserve(&self, code: &str, now: DateTime<Utc>) -> Result<Option<DiscountCode>, StoreError> {
        let row = sqlx::query_as::<_, DiscountCodeRow>(&format!(
            "UPDATE discount_codes SET current_uses = current_uses + 1 \
             WHERE code = $1 AND is_active \
               AND (expires_at IS NULL OR expires_at >= $2) \
               AND (max_uses IS NULL OR current_uses < max_uses) \
             RETURNING {DISCOUNT_COLUMNS}"
        ))
        .bind(code)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(DiscountCode::from))
    }

    async fn release(&self, code: &str) -> Result<(), StoreError> {
        sqlx::query("UPDATE discount_codes SET current_uses = GREATEST(current_uses - 1, 0) WHERE code = $1")
            .bind(code)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

//! Discount Code Aggregate
//!
//! Server-held promotional codes. Administration happens elsewhere; this
//! side only decides whether a code may be redeemed right now.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountCode {
    pub code: String,
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    /// Maximum number of redemptions (None = unlimited).
    pub max_uses: Option<i64>,
    pub current_uses: i64,
}

impl DiscountCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self { code: code.into(), is_active: true, expires_at: None, max_uses: None, current_uses: 0 }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expiry| expiry < now)
    }

    pub fn is_exhausted(&self) -> bool {
        self.max_uses.is_some_and(|max| self.current_uses >= max)
    }

    /// Rules in order: active, not expired, below the usage limit.
    pub fn check(&self, now: DateTime<Utc>) -> Result<(), DiscountRejection> {
        if !self.is_active { return Err(DiscountRejection::Invalid); }
        if self.is_expired(now) { return Err(DiscountRejection::Expired); }
        if self.is_exhausted() { return Err(DiscountRejection::LimitReached); }
        Ok(())
    }
}

/// Validates a looked-up record; `None` means the code does not exist.
pub fn validate_code(record: Option<&DiscountCode>, now: DateTime<Utc>) -> Result<(), DiscountRejection> {
    record.ok_or(DiscountRejection::Invalid)?.check(now)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountRejection { Invalid, Expired, LimitReached }

impl std::error::Error for DiscountRejection {}
impl fmt::Display for DiscountRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid => write!(f, "invalid or inactive"),
            Self::Expired => write!(f, "expired"),
            Self::LimitReached => write!(f, "limit reached"),
        }
    }
}

//! Server-side re-validation of promotional codes before payment.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

use crate::domain::aggregates::discount::{validate_code, DiscountCode, DiscountRejection};
use crate::domain::ports::{DiscountCodeStore, StoreError};

#[derive(Debug, Error)]
pub enum GateError {
    #[error("discount code rejected: {0}")]
    Rejected(DiscountRejection),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Clone)]
pub struct DiscountGate {
    store: Arc<dyn DiscountCodeStore>,
}

impl DiscountGate {
    pub fn new(store: Arc<dyn DiscountCodeStore>) -> Self { Self { store } }

    /// Re-validates `code` and takes one redemption of it atomically.
    ///
    /// On rejection the stored record is read again only to log the reason;
    /// callers get [`GateError::Rejected`] and must not show it verbatim.
    pub async fn reserve(&self, code: &str, now: DateTime<Utc>) -> Result<DiscountCode, GateError> {
        let code = code.trim();
        if let Some(reserved) = self.store.try_reserve(code, now).await? {
            tracing::info!(code = %reserved.code, current_uses = reserved.current_uses, "discount code reserved");
            return Ok(reserved);
        }

        let record = self.store.find(code).await?;
        // A record that passes on re-read lost a race for its last use.
        let reason = validate_code(record.as_ref(), now).err().unwrap_or(DiscountRejection::LimitReached);
        tracing::warn!(code = %code, %reason, "discount code rejected");
        Err(GateError::Rejected(reason))
    }

    /// Returns a reservation after payment authorization failed.
    pub async fn release(&self, code: &str) -> Result<(), GateError> {
        self.store.release(code.trim()).await?;
        tracing::info!(code = %code.trim(), "discount code reservation released");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::memory::InMemoryStore;
    use chrono::Duration;

    fn gate_with(codes: Vec<DiscountCode>) -> (DiscountGate, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        for code in codes {
            store.insert_code(code);
        }
        (DiscountGate::new(store.clone()), store)
    }

    #[tokio::test]
    async fn test_reserve_counts_a_use() {
        let (gate, store) = gate_with(vec![DiscountCode { max_uses: Some(2), ..DiscountCode::new("SPRING10") }]);
        let reserved = gate.reserve("SPRING10", Utc::now()).await.unwrap();
        assert_eq!(reserved.current_uses, 1);
        assert_eq!(store.find("SPRING10").await.unwrap().unwrap().current_uses, 1);
    }

    #[tokio::test]
    async fn test_last_use_can_only_be_taken_once() {
        let (gate, _) = gate_with(vec![DiscountCode { max_uses: Some(1), ..DiscountCode::new("LAST") }]);
        let now = Utc::now();
        let (first, second) = tokio::join!(gate.reserve("LAST", now), gate.reserve("LAST", now));
        assert_eq!([first.is_ok(), second.is_ok()].iter().filter(|ok| **ok).count(), 1);
    }

    #[tokio::test]
    async fn test_rejections_carry_reason() {
        let now = Utc::now();
        let (gate, _) = gate_with(vec![
            DiscountCode { expires_at: Some(now - Duration::hours(1)), ..DiscountCode::new("OLD") },
            DiscountCode { max_uses: Some(3), current_uses: 3, ..DiscountCode::new("FULL") },
        ]);
        assert!(matches!(gate.reserve("NOPE", now).await, Err(GateError::Rejected(DiscountRejection::Invalid))));
        assert!(matches!(gate.reserve("OLD", now).await, Err(GateError::Rejected(DiscountRejection::Expired))));
        assert!(matches!(gate.reserve("FULL", now).await, Err(GateError::Rejected(DiscountRejection::LimitReached))));
    }

    #[tokio::test]
    async fn test_release_gives_back_the_use() {
        let (gate, store) = gate_with(vec![DiscountCode { max_uses: Some(1), ..DiscountCode::new("ONCE") }]);
        gate.reserve(" ONCE ", Utc::now()).await.unwrap();
        gate.release("ONCE").await.unwrap();
        assert_eq!(store.find("ONCE").await.unwrap().unwrap().current_uses, 0);
        assert!(gate.reserve("ONCE", Utc::now()).await.is_ok());
    }
}

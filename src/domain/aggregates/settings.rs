//! Storewide settings singleton

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// What the stock resolver reports when no matrix entry matches a selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockFallback {
    /// Unlimited whenever anything else in the matrix is in stock.
    #[default]
    Permissive,
    /// Zero; every sellable combination needs its own entry.
    Strict,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSettings {
    #[serde(default)]
    pub storewide_sale_active: bool,
    /// Percentage taken off every product while the storewide sale runs.
    #[serde(default)]
    pub storewide_discount_percent: Decimal,
    #[serde(default)]
    pub stock_fallback: StockFallback,
}

impl StoreSettings {
    /// Storewide percentage in effect, clamped to `[0, 100]`; `None` when no sale runs.
    pub fn active_storewide_percent(&self) -> Option<Decimal> {
        self.storewide_sale_active
            .then(|| self.storewide_discount_percent.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED))
    }
}

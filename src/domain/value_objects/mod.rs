//! Value Objects for the bouquet configurator

use regex::Regex;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// Money value object
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money { amount: Decimal, currency: String }

impl Money {
    pub fn new(amount: Decimal, currency: &str) -> Self { Self { amount, currency: currency.to_uppercase() } }
    pub fn eur(amount: Decimal) -> Self { Self::new(amount, "EUR") }
    pub fn zero(currency: &str) -> Self { Self::new(Decimal::ZERO, currency) }
    pub fn amount(&self) -> Decimal { self.amount }
    pub fn currency(&self) -> &str { &self.currency }
    pub fn add(&self, other: &Money) -> Result<Money, MoneyError> {
        if self.currency != other.currency { return Err(MoneyError::CurrencyMismatch); }
        Ok(Money::new(self.amount + other.amount, &self.currency))
    }
    pub fn multiply(&self, qty: u32) -> Money { Money::new(self.amount * Decimal::from(qty), &self.currency) }

    /// Amount in the currency's minor unit (cents), rounded half away from zero.
    pub fn minor_units(&self) -> Option<i64> {
        (self.amount * Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
    }
}

impl Default for Money { fn default() -> Self { Self::zero("EUR") } }

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{} {}", round_cents(self.amount), self.currency) }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum MoneyError { CurrencyMismatch }
impl std::error::Error for MoneyError {}
impl fmt::Display for MoneyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "Currency mismatch") }
}

/// Rounds to two decimal places the way the storefront displays prices.
pub fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Quantity value object, always at least 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Quantity(u32);

impl Quantity {
    pub fn new(value: u32) -> Self { Self(value.max(1)) }
    pub fn value(&self) -> u32 { self.0 }
    /// Applies `delta` and clamps the result into `[min, max]`.
    pub fn adjust(&self, delta: i32, min: u32, max: u32) -> Self {
        let next = (i64::from(self.0) + i64::from(delta)).clamp(i64::from(min), i64::from(max));
        Self(u32::try_from(next).unwrap_or(min))
    }
}

impl Default for Quantity { fn default() -> Self { Self(1) } }

/// Raw stock value meaning "do not constrain quantity".
pub const UNLIMITED_STOCK: i64 = -1;

/// Available quantity for a product or a variant combination.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum Stock {
    Limited(u32),
    Unlimited,
}

impl Stock {
    pub fn is_available(&self) -> bool { !matches!(self, Stock::Limited(0)) }

    /// Upper bound for a requested quantity, never above `ceiling`.
    pub fn cap(&self, ceiling: u32) -> u32 {
        match self {
            Stock::Limited(n) => (*n).min(ceiling),
            Stock::Unlimited => ceiling,
        }
    }
}

impl From<i64> for Stock {
    fn from(raw: i64) -> Self {
        if raw == UNLIMITED_STOCK {
            Stock::Unlimited
        } else {
            Stock::Limited(u32::try_from(raw.max(0)).unwrap_or(u32::MAX))
        }
    }
}

impl From<Stock> for i64 {
    fn from(stock: Stock) -> Self {
        match stock {
            Stock::Limited(n) => i64::from(n),
            Stock::Unlimited => UNLIMITED_STOCK,
        }
    }
}

impl Default for Stock { fn default() -> Self { Stock::Unlimited } }

/// Display language. Catalog records are authored in German; English labels are optional.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    De,
    En,
}

/// A text in the catalog language with an optional English translation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedText {
    pub de: String,
    #[serde(default)]
    pub en: Option<String>,
}

impl LocalizedText {
    pub fn new(de: impl Into<String>) -> Self { Self { de: de.into(), en: None } }
    pub fn with_en(mut self, en: impl Into<String>) -> Self { self.en = Some(en.into()); self }
    pub fn get(&self, locale: Locale) -> &str { localized(&self.de, self.en.as_deref(), locale) }
}

/// Picks the English label when asked for and present, the catalog label otherwise.
pub fn localized<'a>(native: &'a str, en: Option<&'a str>, locale: Locale) -> &'a str {
    match (locale, en) {
        (Locale::En, Some(en)) if !en.trim().is_empty() => en,
        _ => native,
    }
}

// A trailing "(€59.90)" / "(EUR 59,90)" / "($59.90)" on a variant label.
static PRICE_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s*\(\s*(?:€|EUR|\$)\s*(\d+(?:[.,]\d{1,2})?)\s*\)\s*$").expect("valid price token regex")
});

/// Price embedded in a variant label, if any.
pub fn price_override(label: &str) -> Option<Decimal> {
    let caps = PRICE_TOKEN_RE.captures(label)?;
    caps.get(1)?.as_str().replace(',', ".").parse().ok()
}

/// Variant label with any trailing price annotation removed.
pub fn canonical_value(label: &str) -> &str {
    match PRICE_TOKEN_RE.find(label) {
        Some(m) => label[..m.start()].trim(),
        None => label.trim(),
    }
}

/// Leading integer of a label ("20 Rosen" -> 20).
pub fn leading_integer(label: &str) -> Option<u32> {
    let trimmed = label.trim_start();
    let end = trimmed.find(|c: char| !c.is_ascii_digit()).unwrap_or(trimmed.len());
    trimmed[..end].parse().ok()
}

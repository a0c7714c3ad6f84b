//! Product Aggregate
//!
//! Read-only catalog record the configurator works against. Products are
//! fetched once per page view and never mutated here.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::domain::value_objects::{canonical_value, localized, Locale, LocalizedText, Stock};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: LocalizedText,
    #[serde(default)]
    pub description: LocalizedText,
    #[serde(default)]
    pub safety_text: Option<LocalizedText>,
    pub price: Decimal,
    #[serde(default)]
    pub sale_price: Option<Decimal>,
    #[serde(default)]
    pub on_sale: bool,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub videos: Vec<String>,
    #[serde(default)]
    pub variants: Vec<VariantDimension>,
    #[serde(default)]
    pub extras: Vec<Extra>,
    #[serde(default)]
    pub stock_matrix: Vec<StockEntry>,
    /// Product-level stock, used when there is no matrix to consult.
    #[serde(default)]
    pub stock: Stock,
    #[serde(default)]
    pub needs_ribbon: bool,
}

impl Product {
    pub fn dimension(&self, name: &str) -> Option<&VariantDimension> { self.variants.iter().find(|d| d.name == name) }
    pub fn extra(&self, name: &str) -> Option<&Extra> { self.extras.iter().find(|e| e.name == name) }
    pub fn display_name(&self, locale: Locale) -> &str { self.name.get(locale) }

    /// The dimension that describes bouquet size, if the product has one.
    pub fn size_dimension(&self) -> Option<&VariantDimension> { self.variants.iter().find(|d| d.is_size()) }

    /// Sale price when the product-level sale actually lowers the list price.
    pub fn effective_sale_price(&self) -> Option<Decimal> {
        match self.sale_price {
            Some(sale) if self.on_sale && sale < self.price && self.price > Decimal::ZERO => Some(sale),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DimensionKind { Size, Other }

/// A named axis of choice with a fixed list of values.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VariantDimension {
    pub name: String,
    #[serde(default)]
    pub name_en: Option<String>,
    pub values: Vec<String>,
    /// English labels, parallel to `values`.
    #[serde(default)]
    pub values_en: Vec<String>,
    #[serde(default)]
    pub kind: Option<DimensionKind>,
}

impl VariantDimension {
    pub fn label(&self, locale: Locale) -> &str { localized(&self.name, self.name_en.as_deref(), locale) }

    /// Position of `raw` among the declared values, ignoring price annotations.
    pub fn position(&self, raw: &str) -> Option<usize> {
        let wanted = canonical_value(raw);
        self.values.iter().position(|v| canonical_value(v) == wanted)
    }

    pub fn has_value(&self, raw: &str) -> bool { self.position(raw).is_some() }

    /// Display label of a selected raw value in `locale`, without price annotation.
    pub fn value_label<'a>(&'a self, raw: &'a str, locale: Locale) -> &'a str {
        let en = self.position(raw).and_then(|i| self.values_en.get(i)).map(String::as_str);
        canonical_value(localized(raw, en, locale))
    }

    pub fn is_size(&self) -> bool {
        match self.kind {
            Some(kind) => kind == DimensionKind::Size,
            None => legacy_is_size(&self.name),
        }
    }
}

// Untagged legacy records name their size axis instead of tagging it.
fn legacy_is_size(name: &str) -> bool {
    let name = name.to_lowercase();
    ["size", "größe", "groesse", "grösse"].iter().any(|k| name.contains(k))
}

/// Free-text fields an extra can unlock.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonalizationField { Ribbon, Letter, ShortNote }

/// An optional paid add-on. A negative price is a discount.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Extra {
    pub name: String,
    #[serde(default)]
    pub name_en: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub allow_quantity: bool,
    #[serde(default)]
    pub allow_multiple: bool,
    #[serde(default)]
    pub variants: Vec<String>,
    #[serde(default)]
    pub input_type: Option<PersonalizationField>,
}

impl Extra {
    pub fn label(&self, locale: Locale) -> &str { localized(&self.name, self.name_en.as_deref(), locale) }
    pub fn has_variant(&self, value: &str) -> bool { self.variants.iter().any(|v| v == value) }

    /// Whether activating this extra makes `field` visible.
    pub fn unlocks(&self, field: PersonalizationField) -> bool {
        match self.input_type {
            Some(tagged) => tagged == field,
            None => legacy_unlocks(self, field),
        }
    }
}

/// Keyword matching for records created before extras carried an input type.
fn legacy_unlocks(extra: &Extra, field: PersonalizationField) -> bool {
    let names: Vec<String> = std::iter::once(extra.name.as_str())
        .chain(extra.name_en.as_deref())
        .map(str::to_lowercase)
        .collect();
    let name_has = |keywords: &[&str]| names.iter().any(|n| keywords.iter().any(|k| n.contains(k)));

    match field {
        PersonalizationField::Ribbon => {
            const RIBBON: &[&str] = &["ribbon", "band", "personalize", "personal"];
            let category = extra.category.as_deref().map(str::to_lowercase).unwrap_or_default();
            !name_has(&["mini"]) && (name_has(RIBBON) || RIBBON.iter().any(|k| category.contains(k)))
        }
        PersonalizationField::Letter => name_has(&["letter", "brief"]),
        PersonalizationField::ShortNote => name_has(&["note", "notiz", "karte", "card"]),
    }
}

/// One row of the stock matrix: a partial or full variant combination and its quantity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockEntry {
    #[serde(flatten)]
    pub options: BTreeMap<String, String>,
    pub stock: i64,
}

impl StockEntry {
    pub fn new(options: &[(&str, &str)], stock: i64) -> Self {
        Self { options: options.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(), stock }
    }

    pub fn matches(&self, dimension: &str, value: &str) -> bool {
        self.options.get(dimension).is_some_and(|v| canonical_value(v) == canonical_value(value))
    }

    pub fn quantity(&self) -> Stock { Stock::from(self.stock) }
    pub fn has_stock(&self) -> bool { self.quantity() != Stock::Limited(0) }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub product_id: String,
    pub author: String,
    pub rating: i16,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

//! Unit and total price of a configured bouquet.
//!
//! Pure functions of the product, the selection and the storewide settings;
//! calling them twice with the same inputs gives the same quote.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::aggregates::product::Product;
use crate::domain::aggregates::selection::SelectionSession;
use crate::domain::aggregates::settings::StoreSettings;
use crate::domain::value_objects::{price_override, round_cents};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct UnitPrice {
    pub discounted: Decimal,
    pub original: Decimal,
}

impl UnitPrice {
    pub fn is_on_sale(&self) -> bool { self.discounted < self.original }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PriceQuote {
    pub unit: UnitPrice,
    pub quantity: u32,
    pub total: Decimal,
    pub total_original: Decimal,
    pub on_sale: bool,
}

/// Base price after variant overrides. Dimensions are walked in declaration
/// order and the last override found wins.
pub fn base_price(product: &Product, selection: &SelectionSession) -> Decimal {
    product
        .variants
        .iter()
        .filter_map(|dim| selection.selected(&dim.name))
        .filter_map(price_override)
        .last()
        .unwrap_or(product.price)
}

/// Base price after the storewide sale or, failing that, the product's own sale.
///
/// A product sale is applied as the ratio of sale to list price so that it
/// carries over to variant-overridden bases.
pub fn discounted_base(product: &Product, base: Decimal, settings: &StoreSettings) -> Decimal {
    if let Some(percent) = settings.active_storewide_percent() {
        return round_cents(base * (Decimal::ONE_HUNDRED - percent) / Decimal::ONE_HUNDRED);
    }
    match product.effective_sale_price() {
        Some(sale) => round_cents(base * sale / product.price),
        None => base,
    }
}

/// Cost of all active extras. Extras are never discounted.
pub fn extras_cost(product: &Product, selection: &SelectionSession) -> Decimal {
    product
        .extras
        .iter()
        .filter(|extra| selection.is_extra_active(&extra.name))
        .map(|extra| {
            let quantity = if extra.allow_quantity { selection.extra_quantity(&extra.name) } else { 1 };
            let variants = if extra.allow_multiple { selection.selected_sub_variants(&extra.name).len().max(1) } else { 1 };
            extra.price * Decimal::from(quantity) * Decimal::from(variants)
        })
        .sum()
}

pub fn unit_price(product: &Product, selection: &SelectionSession, settings: &StoreSettings) -> UnitPrice {
    let base = base_price(product, selection);
    let extras = extras_cost(product, selection);
    let discounted = discounted_base(product, base, settings) + extras;
    let original = base + extras;
    UnitPrice { discounted: discounted.max(Decimal::ZERO), original: original.max(Decimal::ZERO) }
}

pub fn quote(product: &Product, selection: &SelectionSession, settings: &StoreSettings) -> PriceQuote {
    let unit = unit_price(product, selection, settings);
    let quantity = selection.quantity();
    PriceQuote {
        unit,
        quantity,
        total: unit.discounted * Decimal::from(quantity),
        total_original: unit.original * Decimal::from(quantity),
        on_sale: unit.is_on_sale(),
    }
}

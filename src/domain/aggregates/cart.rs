//! Cart Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::domain::aggregates::selection::MAX_LINE_QUANTITY;
use crate::domain::events::{CartEvent, DomainEvent};
use crate::domain::value_objects::{Money, MoneyError};

/// A fully configured bouquet ready for the cart.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Merge key: equal identities are the same configured item.
    pub identity: String,
    pub product_id: String,
    pub name: String,
    /// Dimension label -> value label, in the shopper's locale.
    pub options: BTreeMap<String, String>,
    /// Dimension name -> raw catalog value, for bookkeeping.
    pub db_options: BTreeMap<String, String>,
    pub extras: Vec<String>,
    pub personalization: String,
    pub summary: String,
    pub unit_price: Money,
    pub quantity: u32,
}

impl LineItem {
    pub fn line_total(&self) -> Money { self.unit_price.multiply(self.quantity) }
}

#[derive(Clone, Debug)]
pub struct Cart {
    id: String,
    lines: Vec<LineItem>,
    currency: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    events: Vec<DomainEvent>,
}

impl Cart {
    pub fn new(currency: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(), lines: vec![], currency: currency.to_uppercase(),
            created_at: now, updated_at: now, events: vec![],
        }
    }

    pub fn id(&self) -> &str { &self.id }
    pub fn lines(&self) -> &[LineItem] { &self.lines }
    pub fn currency(&self) -> &str { &self.currency }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn line_count(&self) -> usize { self.lines.len() }
    pub fn is_empty(&self) -> bool { self.lines.is_empty() }

    /// Adds a line, merging it into an existing one with the same identity.
    pub fn add_line(&mut self, line: LineItem) -> Result<(), CartError> {
        if line.unit_price.currency() != self.currency { return Err(CartError::CurrencyMismatch); }
        if let Some(existing) = self.lines.iter_mut().find(|l| l.identity == line.identity) {
            existing.quantity = existing.quantity.saturating_add(line.quantity).min(MAX_LINE_QUANTITY);
            let event = CartEvent::LineMerged { cart_id: self.id.clone(), identity: line.identity, quantity: existing.quantity };
            self.raise_event(DomainEvent::Cart(event));
        } else {
            let event = CartEvent::LineAdded { cart_id: self.id.clone(), identity: line.identity.clone() };
            self.lines.push(line);
            self.raise_event(DomainEvent::Cart(event));
        }
        self.touch();
        Ok(())
    }

    pub fn update_quantity(&mut self, identity: &str, quantity: u32) -> Result<(), CartError> {
        let line = self.lines.iter_mut().find(|l| l.identity == identity).ok_or(CartError::LineNotFound)?;
        if quantity == 0 { return self.remove_line(identity); }
        line.quantity = quantity.min(MAX_LINE_QUANTITY);
        self.touch();
        Ok(())
    }

    pub fn remove_line(&mut self, identity: &str) -> Result<(), CartError> {
        let before = self.lines.len();
        self.lines.retain(|l| l.identity != identity);
        if self.lines.len() == before { return Err(CartError::LineNotFound); }
        self.raise_event(DomainEvent::Cart(CartEvent::LineRemoved { cart_id: self.id.clone(), identity: identity.to_string() }));
        self.touch();
        Ok(())
    }

    pub fn clear(&mut self) { self.lines.clear(); self.touch(); }

    pub fn subtotal(&self) -> Result<Money, CartError> {
        self.lines.iter().try_fold(Money::zero(&self.currency), |acc, l| acc.add(&l.line_total())).map_err(CartError::from)
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: DomainEvent) { self.events.push(e); }
    fn touch(&mut self) { self.updated_at = Utc::now(); }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum CartError { LineNotFound, CurrencyMismatch }
impl std::error::Error for CartError {}
impl std::fmt::Display for CartError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self { Self::LineNotFound => write!(f, "Line not found"), Self::CurrencyMismatch => write!(f, "Currency mismatch") }
    }
}
impl From<MoneyError> for CartError { fn from(_: MoneyError) -> Self { Self::CurrencyMismatch } }

//! Configurator controller: one per product view.
//!
//! Owns the current [`SelectionSession`] snapshot plus the snapshots before
//! it. Every interaction produces a new snapshot; price, stock and
//! eligibility are recomputed from it on demand.

use crate::domain::aggregates::cart::LineItem;
use crate::domain::aggregates::product::Product;
use crate::domain::aggregates::selection::{LetterFont, RibbonPlacement, SelectionNotice, SelectionSession};
use crate::domain::aggregates::settings::StoreSettings;
use crate::domain::events::{ConfiguratorEvent, DomainEvent};
use crate::domain::ports::Catalog;
use crate::domain::services::line_identity::build_line_item;
use crate::domain::services::personalization::{checkout_eligibility, visible_fields, Eligibility, FieldVisibility};
use crate::domain::services::pricing::{self, PriceQuote};
use crate::domain::services::stock::{option_stock, resolve_stock};
use crate::domain::value_objects::{Locale, Money, Stock};
use crate::{ConfiguratorError, Result};

const MAX_HISTORY: usize = 50;

#[derive(Clone, Debug)]
pub struct Configurator {
    product: Product,
    settings: StoreSettings,
    locale: Locale,
    session: SelectionSession,
    history: Vec<SelectionSession>,
    notice: Option<SelectionNotice>,
    events: Vec<DomainEvent>,
}

impl Configurator {
    pub fn new(product: Product, settings: StoreSettings, locale: Locale) -> Self {
        Self::resume(product, settings, locale, SelectionSession::new())
    }

    /// Fetches the product and the storewide settings for a new product view.
    pub async fn load(catalog: &dyn Catalog, product_id: &str, locale: Locale) -> Result<Self> {
        let product = catalog
            .product(product_id)
            .await?
            .ok_or_else(|| ConfiguratorError::ProductNotFound(product_id.to_string()))?;
        let settings = catalog.settings().await?;
        Ok(Self::new(product, settings, locale))
    }

    /// Starts from an existing snapshot. The requested quantity is re-clamped to stock.
    pub fn resume(product: Product, settings: StoreSettings, locale: Locale, session: SelectionSession) -> Self {
        let mut configurator = Self { product, settings, locale, session, history: vec![], notice: None, events: vec![] };
        configurator.session = configurator.clamp_quantity(configurator.session.clone());
        configurator
    }

    pub fn product(&self) -> &Product { &self.product }
    pub fn session(&self) -> &SelectionSession { &self.session }
    pub fn locale(&self) -> Locale { self.locale }

    /// The notice raised by the last rejected interaction, cleared by the next accepted one.
    pub fn notice(&self) -> Option<&SelectionNotice> { self.notice.as_ref() }
    pub fn notice_message(&self) -> Option<String> { self.notice.as_ref().map(|n| n.message(self.locale)) }

    pub fn select_variant(&mut self, dimension: &str, value: &str) -> std::result::Result<(), SelectionNotice> {
        let next = self.session.select_variant(&self.product, dimension, value);
        self.apply(next)
    }

    pub fn toggle_extra(&mut self, name: &str) -> std::result::Result<(), SelectionNotice> {
        let next = self.session.toggle_extra(&self.product, name);
        self.apply(next)
    }

    pub fn adjust_extra_quantity(&mut self, name: &str, delta: i32) -> std::result::Result<(), SelectionNotice> {
        let next = self.session.adjust_extra_quantity(&self.product, name, delta);
        self.apply(next)
    }

    pub fn set_sub_variant(&mut self, name: &str, value: &str) -> std::result::Result<(), SelectionNotice> {
        let next = self.session.set_sub_variant(&self.product, name, value);
        self.apply(next)
    }

    pub fn set_ribbon_text(&mut self, text: &str) -> std::result::Result<(), SelectionNotice> {
        let next = self.session.set_ribbon_text(&self.product, text);
        self.apply(next)
    }

    pub fn set_ribbon_placement(&mut self, placement: RibbonPlacement) {
        let next = self.session.set_ribbon_placement(placement);
        self.commit(next);
    }

    pub fn set_letter_text(&mut self, text: &str) -> std::result::Result<(), SelectionNotice> {
        let next = self.session.set_letter_text(&self.product, text);
        self.apply(next)
    }

    pub fn set_letter_font(&mut self, font: LetterFont) {
        let next = self.session.set_letter_font(font);
        self.commit(next);
    }

    pub fn set_short_note(&mut self, text: &str) -> std::result::Result<(), SelectionNotice> {
        let next = self.session.set_short_note(&self.product, text);
        self.apply(next)
    }

    pub fn set_consent(&mut self, consent: bool) {
        let next = self.session.set_consent(consent);
        self.commit(next);
    }

    pub fn set_quantity(&mut self, requested: u32) {
        let next = self.session.set_quantity(requested, self.stock());
        self.commit(next);
    }

    /// Restores the previous snapshot. Returns false when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        match self.history.pop() {
            Some(previous) => {
                self.session = previous;
                self.notice = None;
                self.events.push(DomainEvent::Configurator(ConfiguratorEvent::Undone { product_id: self.product.id.clone() }));
                true
            }
            None => false,
        }
    }

    pub fn stock(&self) -> Stock { resolve_stock(&self.product, &self.session, self.settings.stock_fallback) }
    pub fn option_stock(&self, dimension: &str, value: &str) -> Stock { option_stock(&self.product, dimension, value) }
    pub fn quote(&self) -> PriceQuote { pricing::quote(&self.product, &self.session, &self.settings) }
    pub fn visibility(&self) -> FieldVisibility { visible_fields(&self.product, &self.session) }
    pub fn eligibility(&self) -> Eligibility { checkout_eligibility(&self.product, &self.session, self.stock()) }

    /// The cart line for the current selection, once checkout is allowed.
    pub fn line_item(&self, currency: &str) -> Result<LineItem> {
        let eligibility = self.eligibility();
        if !eligibility.is_ready() {
            return Err(ConfiguratorError::NotReady(eligibility.blockers));
        }
        let unit = Money::new(self.quote().unit.discounted, currency);
        Ok(build_line_item(&self.product, &self.session, self.locale, unit)?)
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }

    fn apply(&mut self, next: std::result::Result<SelectionSession, SelectionNotice>) -> std::result::Result<(), SelectionNotice> {
        match next {
            Ok(session) => {
                self.commit(session);
                Ok(())
            }
            Err(notice) => {
                tracing::debug!(product_id = %self.product.id, %notice, "selection rejected");
                self.events.push(DomainEvent::Configurator(ConfiguratorEvent::NoticeRaised {
                    product_id: self.product.id.clone(),
                    notice: notice.to_string(),
                }));
                self.notice = Some(notice.clone());
                Err(notice)
            }
        }
    }

    fn commit(&mut self, next: SelectionSession) {
        self.notice = None;
        let next = self.clamp_quantity(next);
        if next == self.session {
            return;
        }
        let previous = std::mem::replace(&mut self.session, next);
        self.history.push(previous);
        if self.history.len() > MAX_HISTORY {
            self.history.remove(0);
        }
    }

    // The requested quantity follows stock whenever the selection changes.
    fn clamp_quantity(&self, session: SelectionSession) -> SelectionSession {
        let stock = resolve_stock(&self.product, &session, self.settings.stock_fallback);
        session.set_quantity(session.quantity(), stock)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::product::PersonalizationField;
    use crate::domain::aggregates::settings::StockFallback;
    use crate::domain::fixtures::rose_bouquet;
    use crate::domain::services::personalization::CheckoutBlocker;
    use rust_decimal::Decimal;

    fn configurator() -> Configurator {
        Configurator::new(rose_bouquet(), StoreSettings::default(), Locale::De)
    }

    #[test]
    fn test_rejected_interaction_keeps_state_and_raises_notice() {
        let mut c = configurator();
        c.select_variant("Größe", "20 Rosen").unwrap();
        for name in ["Vase", "Satinband", "Brief", "Grußkarte"] {
            c.toggle_extra(name).unwrap();
        }
        let before = c.session().clone();
        assert!(c.toggle_extra("Schokolade").is_err());
        assert_eq!(c.session(), &before);
        assert_eq!(c.notice(), Some(&SelectionNotice::ExtrasLimitReached { limit: 4 }));
        assert!(c.notice_message().unwrap().contains("höchstens 4"));
        assert!(c.take_events().iter().any(|e| matches!(e, DomainEvent::Configurator(ConfiguratorEvent::NoticeRaised { .. }))));

        c.toggle_extra("Vase").unwrap();
        assert!(c.notice().is_none());
    }

    #[test]
    fn test_undo_walks_back_snapshots() {
        let mut c = configurator();
        c.select_variant("Farbe", "Rot").unwrap();
        c.toggle_extra("Vase").unwrap();
        assert!(c.undo());
        assert!(!c.session().is_extra_active("Vase"));
        assert!(c.undo());
        assert_eq!(c.session(), &SelectionSession::new());
        assert!(!c.undo());
    }

    #[test]
    fn test_quantity_follows_stock_on_variant_change() {
        let mut c = configurator();
        // nothing selected yet, so the first matrix row bounds the quantity
        c.set_quantity(10);
        assert_eq!(c.session().quantity(), 5);
        c.select_variant("Größe", "200 Rosen").unwrap();
        c.select_variant("Farbe", "Rot").unwrap();
        assert_eq!(c.stock(), Stock::Limited(3));
        assert_eq!(c.session().quantity(), 3);
        assert_eq!(c.quote().total, Decimal::new(119700, 2));
    }

    #[test]
    fn test_strict_fallback_blocks_unlisted_combination() {
        let settings = StoreSettings { stock_fallback: StockFallback::Strict, ..Default::default() };
        let mut c = Configurator::new(rose_bouquet(), settings, Locale::De);
        c.select_variant("Größe", "20 Rosen").unwrap();
        c.select_variant("Farbe", "Rosa").unwrap();
        assert_eq!(c.eligibility().blockers, vec![CheckoutBlocker::OutOfStock]);
    }

    #[test]
    fn test_line_item_requires_eligibility() {
        let mut c = configurator();
        assert!(matches!(c.line_item("EUR"), Err(ConfiguratorError::NotReady(_))));

        c.select_variant("Größe", "30 Rosen").unwrap();
        c.select_variant("Farbe", "Weiß").unwrap();
        c.toggle_extra("Grußkarte").unwrap();
        c.set_short_note("Alles Liebe").unwrap();
        assert!(matches!(c.line_item("EUR"), Err(ConfiguratorError::NotReady(ref b)) if b == &vec![CheckoutBlocker::ConsentRequired]));

        c.set_consent(true);
        let line = c.line_item("EUR").unwrap();
        assert_eq!(line.unit_price, Money::eur(Decimal::new(7240, 2)));
        assert_eq!(line.personalization, "Alles Liebe");
    }

    #[test]
    fn test_hidden_letter_raises_notice() {
        let mut c = configurator();
        let before = c.session().clone();
        assert_eq!(c.set_letter_text("Ein ganzer Brief"), Err(SelectionNotice::FieldHidden(PersonalizationField::Letter)));
        assert_eq!(c.session(), &before);
        assert!(c.notice().is_some());

        c.toggle_extra("Brief").unwrap();
        c.set_letter_text("Ein ganzer Brief").unwrap();
        assert_eq!(c.session().personalization().letter_text, "Ein ganzer Brief");
    }

    #[tokio::test]
    async fn test_load_reports_missing_product() {
        let store = crate::infrastructure::memory::InMemoryStore::new();
        store.insert_product(rose_bouquet());
        assert!(Configurator::load(&store, "rosen-classic", Locale::De).await.is_ok());
        assert!(matches!(
            Configurator::load(&store, "tulpen", Locale::De).await,
            Err(ConfiguratorError::ProductNotFound(ref id)) if id == "tulpen"
        ));
    }

    #[test]
    fn test_notices_propagate_as_errors() {
        fn configure(c: &mut Configurator) -> Result<()> {
            c.select_variant("Größe", "20 Rosen")?;
            c.select_variant("Farbe", "Lila")?;
            Ok(())
        }
        let mut c = configurator();
        assert!(matches!(configure(&mut c), Err(ConfiguratorError::Selection(SelectionNotice::UnknownOption { .. }))));
        assert_eq!(c.session().selected("Größe"), Some("20 Rosen"));
    }

    #[test]
    fn test_resume_clamps_submitted_quantity() {
        let product = rose_bouquet();
        let session = SelectionSession::new()
            .select_variant(&product, "Größe", "30 Rosen").unwrap()
            .select_variant(&product, "Farbe", "Weiß").unwrap()
            .set_quantity(40, Stock::Unlimited);
        let c = Configurator::resume(product, StoreSettings::default(), Locale::En, session);
        assert_eq!(c.session().quantity(), 2);
    }
}

//! Selection Session
//!
//! Ephemeral state of one product view. Every transition takes `&self` and
//! returns the next snapshot; a rejected interaction returns a
//! [`SelectionNotice`] and the caller keeps the snapshot it already has.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::domain::aggregates::product::{Extra, PersonalizationField, Product};
use crate::domain::services::{personalization, stock};
use crate::domain::value_objects::{leading_integer, Locale, Quantity, Stock};

pub const DEFAULT_EXTRAS_CAP: usize = 100;
/// Bouquets of exactly this many stems only take a handful of extras.
pub const SMALL_BOUQUET_STEMS: u32 = 20;
pub const SMALL_BOUQUET_EXTRAS_CAP: usize = 4;
pub const MIN_EXTRA_QUANTITY: u32 = 1;
pub const MAX_EXTRA_QUANTITY: u32 = 50;
pub const MAX_LINE_QUANTITY: u32 = 99;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RibbonPlacement {
    #[default]
    Left,
    Right,
    Both,
}

impl RibbonPlacement {
    pub fn label(self, locale: Locale) -> &'static str {
        match (self, locale) {
            (Self::Left, Locale::De) => "Schleife links",
            (Self::Right, Locale::De) => "Schleife rechts",
            (Self::Both, Locale::De) => "Schleife beidseitig",
            (Self::Left, Locale::En) => "Ribbon left",
            (Self::Right, Locale::En) => "Ribbon right",
            (Self::Both, Locale::En) => "Ribbon both sides",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LetterFont {
    #[default]
    Classic,
    Script,
    Modern,
}

impl LetterFont {
    pub fn label(self, locale: Locale) -> &'static str {
        match (self, locale) {
            (Self::Classic, Locale::De) => "Brief (klassisch)",
            (Self::Script, Locale::De) => "Brief (Schreibschrift)",
            (Self::Modern, Locale::De) => "Brief (modern)",
            (Self::Classic, Locale::En) => "Letter (classic)",
            (Self::Script, Locale::En) => "Letter (script)",
            (Self::Modern, Locale::En) => "Letter (modern)",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Personalization {
    pub ribbon_text: String,
    pub ribbon_placement: RibbonPlacement,
    pub letter_text: String,
    pub letter_font: LetterFont,
    pub short_note: String,
}

impl Personalization {
    pub fn has_text(&self) -> bool {
        [&self.ribbon_text, &self.letter_text, &self.short_note].iter().any(|t| !t.trim().is_empty())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionSession {
    variants: BTreeMap<String, String>,
    active_extras: BTreeSet<String>,
    extra_quantities: BTreeMap<String, Quantity>,
    sub_variant: BTreeMap<String, String>,
    sub_variants: BTreeMap<String, BTreeSet<String>>,
    personalization: Personalization,
    consent: bool,
    quantity: u32,
}

impl Default for SelectionSession {
    fn default() -> Self {
        Self {
            variants: BTreeMap::new(),
            active_extras: BTreeSet::new(),
            extra_quantities: BTreeMap::new(),
            sub_variant: BTreeMap::new(),
            sub_variants: BTreeMap::new(),
            personalization: Personalization::default(),
            consent: false,
            quantity: 1,
        }
    }
}

impl SelectionSession {
    pub fn new() -> Self { Self::default() }

    pub fn variants(&self) -> &BTreeMap<String, String> { &self.variants }
    pub fn selected(&self, dimension: &str) -> Option<&str> { self.variants.get(dimension).map(String::as_str) }
    pub fn is_extra_active(&self, name: &str) -> bool { self.active_extras.contains(name) }
    pub fn active_extras(&self) -> impl Iterator<Item = &str> { self.active_extras.iter().map(String::as_str) }
    pub fn active_extra_count(&self) -> usize { self.active_extras.len() }
    pub fn personalization(&self) -> &Personalization { &self.personalization }
    pub fn consent(&self) -> bool { self.consent }
    pub fn quantity(&self) -> u32 { self.quantity.max(1) }

    pub fn extra_quantity(&self, name: &str) -> u32 {
        self.extra_quantities.get(name).copied().unwrap_or_default().value()
    }

    /// Selected sub-variants of an extra, sorted in multi-select mode.
    pub fn selected_sub_variants(&self, name: &str) -> Vec<&str> {
        match (self.sub_variant.get(name), self.sub_variants.get(name)) {
            (Some(single), _) => vec![single.as_str()],
            (None, Some(set)) => set.iter().map(String::as_str).collect(),
            (None, None) => Vec::new(),
        }
    }

    /// Dimensions of `product` that have no value selected yet.
    pub fn missing_dimensions<'a>(&self, product: &'a Product) -> Vec<&'a str> {
        product.variants.iter().filter(|d| !self.variants.contains_key(&d.name)).map(|d| d.name.as_str()).collect()
    }

    /// How many extras may be active at once for the current size.
    pub fn extras_cap(&self, product: &Product) -> usize {
        let stems = product
            .size_dimension()
            .and_then(|d| self.selected(&d.name))
            .and_then(leading_integer);
        match stems {
            Some(SMALL_BOUQUET_STEMS) => SMALL_BOUQUET_EXTRAS_CAP,
            _ => DEFAULT_EXTRAS_CAP,
        }
    }

    pub fn select_variant(&self, product: &Product, dimension: &str, value: &str) -> Result<Self, SelectionNotice> {
        let dim = product.dimension(dimension).ok_or_else(|| SelectionNotice::UnknownDimension(dimension.to_string()))?;
        let index = dim.position(value).ok_or_else(|| SelectionNotice::UnknownOption {
            dimension: dimension.to_string(),
            value: value.to_string(),
        })?;
        let declared = &dim.values[index];
        if !stock::option_stock(product, dimension, declared).is_available() {
            return Err(SelectionNotice::OptionSoldOut { dimension: dimension.to_string(), value: declared.clone() });
        }
        let mut next = self.clone();
        next.variants.insert(dim.name.clone(), declared.clone());
        Ok(next)
    }

    pub fn toggle_extra(&self, product: &Product, name: &str) -> Result<Self, SelectionNotice> {
        let extra = find_extra(product, name)?;
        if self.is_extra_active(&extra.name) {
            return Ok(self.deactivate(product, extra));
        }
        let limit = self.extras_cap(product);
        if self.active_extras.len() >= limit {
            return Err(SelectionNotice::ExtrasLimitReached { limit });
        }
        let mut next = self.clone();
        next.active_extras.insert(extra.name.clone());
        next.extra_quantities.insert(extra.name.clone(), Quantity::default());
        Ok(next)
    }

    // Drops everything tied to the extra, including text whose field only it kept visible.
    fn deactivate(&self, product: &Product, extra: &Extra) -> Self {
        let before = personalization::visible_fields(product, self);
        let mut next = self.clone();
        next.active_extras.remove(&extra.name);
        next.extra_quantities.remove(&extra.name);
        next.sub_variant.remove(&extra.name);
        next.sub_variants.remove(&extra.name);

        let after = personalization::visible_fields(product, &next);
        if before.ribbon && !after.ribbon { next.personalization.ribbon_text.clear(); }
        if before.letter && !after.letter { next.personalization.letter_text.clear(); }
        if before.short_note && !after.short_note { next.personalization.short_note.clear(); }
        next
    }

    pub fn adjust_extra_quantity(&self, product: &Product, name: &str, delta: i32) -> Result<Self, SelectionNotice> {
        let extra = find_extra(product, name)?;
        if !extra.allow_quantity {
            return Err(SelectionNotice::QuantityNotAdjustable(extra.name.clone()));
        }
        if !self.is_extra_active(&extra.name) {
            return Err(SelectionNotice::ExtraInactive(extra.name.clone()));
        }
        let mut next = self.clone();
        let quantity = next.extra_quantities.entry(extra.name.clone()).or_default();
        *quantity = quantity.adjust(delta, MIN_EXTRA_QUANTITY, MAX_EXTRA_QUANTITY);
        Ok(next)
    }

    /// Single mode replaces the stored value; multi mode toggles membership.
    pub fn set_sub_variant(&self, product: &Product, name: &str, value: &str) -> Result<Self, SelectionNotice> {
        let extra = find_extra(product, name)?;
        if !self.is_extra_active(&extra.name) {
            return Err(SelectionNotice::ExtraInactive(extra.name.clone()));
        }
        if !extra.has_variant(value) {
            return Err(SelectionNotice::UnknownSubVariant { extra: extra.name.clone(), value: value.to_string() });
        }
        let mut next = self.clone();
        if extra.allow_multiple {
            let set = next.sub_variants.entry(extra.name.clone()).or_default();
            if !set.remove(value) {
                set.insert(value.to_string());
            }
            if set.is_empty() {
                next.sub_variants.remove(&extra.name);
            }
        } else {
            next.sub_variant.insert(extra.name.clone(), value.to_string());
        }
        Ok(next)
    }

    /// Rejects non-empty text for a field the current selection does not show.
    fn ensure_visible(&self, product: &Product, field: PersonalizationField, text: &str) -> Result<(), SelectionNotice> {
        if text.trim().is_empty() || personalization::visible_fields(product, self).shows(field) {
            Ok(())
        } else {
            Err(SelectionNotice::FieldHidden(field))
        }
    }

    pub fn set_ribbon_text(&self, product: &Product, text: &str) -> Result<Self, SelectionNotice> {
        self.ensure_visible(product, PersonalizationField::Ribbon, text)?;
        let mut next = self.clone();
        next.personalization.ribbon_text = text.to_string();
        Ok(next)
    }

    pub fn set_ribbon_placement(&self, placement: RibbonPlacement) -> Self {
        let mut next = self.clone();
        next.personalization.ribbon_placement = placement;
        next
    }

    pub fn set_letter_text(&self, product: &Product, text: &str) -> Result<Self, SelectionNotice> {
        self.ensure_visible(product, PersonalizationField::Letter, text)?;
        let mut next = self.clone();
        next.personalization.letter_text = text.to_string();
        Ok(next)
    }

    pub fn set_letter_font(&self, font: LetterFont) -> Self {
        let mut next = self.clone();
        next.personalization.letter_font = font;
        next
    }

    pub fn set_short_note(&self, product: &Product, text: &str) -> Result<Self, SelectionNotice> {
        self.ensure_visible(product, PersonalizationField::ShortNote, text)?;
        if !personalization::accepts_short_note(text) {
            return Err(SelectionNotice::ShortNoteTooLong { max_words: personalization::SHORT_NOTE_MAX_WORDS });
        }
        let mut next = self.clone();
        next.personalization.short_note = text.to_string();
        Ok(next)
    }

    pub fn set_consent(&self, consent: bool) -> Self {
        let mut next = self.clone();
        next.consent = consent;
        next
    }

    /// Requested line quantity, clamped to `[1, stock]` and the per-line ceiling.
    pub fn set_quantity(&self, requested: u32, stock: Stock) -> Self {
        let mut next = self.clone();
        next.quantity = requested.clamp(1, stock.cap(MAX_LINE_QUANTITY).max(1));
        next
    }
}

fn find_extra<'a>(product: &'a Product, name: &str) -> Result<&'a Extra, SelectionNotice> {
    product.extra(name).ok_or_else(|| SelectionNotice::UnknownExtra(name.to_string()))
}

/// A rejected interaction. The session is unchanged and the shopper sees [`SelectionNotice::message`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SelectionNotice {
    ExtrasLimitReached { limit: usize },
    ShortNoteTooLong { max_words: usize },
    OptionSoldOut { dimension: String, value: String },
    UnknownDimension(String),
    UnknownOption { dimension: String, value: String },
    UnknownExtra(String),
    UnknownSubVariant { extra: String, value: String },
    ExtraInactive(String),
    QuantityNotAdjustable(String),
    FieldHidden(PersonalizationField),
}

impl SelectionNotice {
    pub fn message(&self, locale: Locale) -> String {
        match (self, locale) {
            (Self::ExtrasLimitReached { limit }, Locale::De) => format!("Für diese Straußgröße sind höchstens {limit} Extras möglich."),
            (Self::ExtrasLimitReached { limit }, Locale::En) => format!("This bouquet size allows at most {limit} extras."),
            (Self::ShortNoteTooLong { max_words }, Locale::De) => format!("Die Notiz darf höchstens {max_words} Wörter haben."),
            (Self::ShortNoteTooLong { max_words }, Locale::En) => format!("The note may have at most {max_words} words."),
            (Self::OptionSoldOut { value, .. }, Locale::De) => format!("{value} ist leider ausverkauft."),
            (Self::OptionSoldOut { value, .. }, Locale::En) => format!("{value} is sold out."),
            (Self::FieldHidden(_), Locale::De) => "Dieses Textfeld gehört zu keinem gewählten Extra.".to_string(),
            (Self::FieldHidden(_), Locale::En) => "This text field is not part of your selection.".to_string(),
            (_, Locale::De) => "Diese Auswahl ist nicht verfügbar.".to_string(),
            (_, Locale::En) => "This option is not available.".to_string(),
        }
    }
}

impl std::error::Error for SelectionNotice {}
impl fmt::Display for SelectionNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExtrasLimitReached { limit } => write!(f, "extras limit of {limit} reached"),
            Self::ShortNoteTooLong { max_words } => write!(f, "short note exceeds {max_words} words"),
            Self::OptionSoldOut { dimension, value } => write!(f, "{dimension}={value} is sold out"),
            Self::UnknownDimension(d) => write!(f, "unknown dimension {d}"),
            Self::UnknownOption { dimension, value } => write!(f, "unknown option {dimension}={value}"),
            Self::UnknownExtra(e) => write!(f, "unknown extra {e}"),
            Self::UnknownSubVariant { extra, value } => write!(f, "unknown variant {value} of extra {extra}"),
            Self::ExtraInactive(e) => write!(f, "extra {e} is not selected"),
            Self::QuantityNotAdjustable(e) => write!(f, "extra {e} has a fixed quantity"),
            Self::FieldHidden(field) => write!(f, "{field:?} text is not available for this selection"),
        }
    }
}

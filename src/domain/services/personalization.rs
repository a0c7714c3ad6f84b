//! Personalization fields and the checkout gate.

use serde::Serialize;

use crate::domain::aggregates::product::{PersonalizationField, Product};
use crate::domain::aggregates::selection::SelectionSession;
use crate::domain::value_objects::Stock;

pub const SHORT_NOTE_MAX_WORDS: usize = 5;

/// Which free-text inputs are shown for the current selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FieldVisibility {
    pub ribbon: bool,
    pub letter: bool,
    pub short_note: bool,
}

impl FieldVisibility {
    pub fn shows(&self, field: PersonalizationField) -> bool {
        match field {
            PersonalizationField::Ribbon => self.ribbon,
            PersonalizationField::Letter => self.letter,
            PersonalizationField::ShortNote => self.short_note,
        }
    }
}

pub fn visible_fields(product: &Product, selection: &SelectionSession) -> FieldVisibility {
    let unlocked = |field: PersonalizationField| {
        product
            .extras
            .iter()
            .any(|extra| selection.is_extra_active(&extra.name) && extra.unlocks(field))
    };
    FieldVisibility {
        ribbon: product.needs_ribbon || unlocked(PersonalizationField::Ribbon),
        letter: unlocked(PersonalizationField::Letter),
        short_note: unlocked(PersonalizationField::ShortNote),
    }
}

/// Whether `input` fits the short-note word limit. Trailing whitespace does not
/// start a new word, so the space typed after the last allowed word is accepted.
pub fn accepts_short_note(input: &str) -> bool {
    input.split_whitespace().count() <= SHORT_NOTE_MAX_WORDS
}

/// Anything that makes the bouquet custom-made and so needs the withdrawal waiver.
pub fn has_personalization(selection: &SelectionSession) -> bool {
    selection.personalization().has_text() || selection.active_extra_count() > 0
}

pub fn ribbon_satisfied(product: &Product, selection: &SelectionSession) -> bool {
    !visible_fields(product, selection).ribbon || !selection.personalization().ribbon_text.trim().is_empty()
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum CheckoutBlocker {
    MissingVariant(String),
    RibbonTextRequired,
    OutOfStock,
    ConsentRequired,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Eligibility {
    pub blockers: Vec<CheckoutBlocker>,
}

impl Eligibility {
    pub fn is_ready(&self) -> bool { self.blockers.is_empty() }
}

pub fn checkout_eligibility(product: &Product, selection: &SelectionSession, stock: Stock) -> Eligibility {
    let mut blockers: Vec<CheckoutBlocker> = selection
        .missing_dimensions(product)
        .into_iter()
        .map(|d| CheckoutBlocker::MissingVariant(d.to_string()))
        .collect();
    if !ribbon_satisfied(product, selection) {
        blockers.push(CheckoutBlocker::RibbonTextRequired);
    }
    if !stock.is_available() {
        blockers.push(CheckoutBlocker::OutOfStock);
    }
    if has_personalization(selection) && !selection.consent() {
        blockers.push(CheckoutBlocker::ConsentRequired);
    }
    Eligibility { blockers }
}

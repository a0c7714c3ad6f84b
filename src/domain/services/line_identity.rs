//! Cart line identity and the human-readable options summary.
//!
//! This is the presentation boundary: option values are translated here and
//! nowhere else, so two selections that read the same to the shopper merge
//! into one cart line.

use std::collections::BTreeMap;

use crate::domain::aggregates::cart::LineItem;
use crate::domain::aggregates::product::{Extra, Product};
use crate::domain::aggregates::selection::SelectionSession;
use crate::domain::services::personalization::visible_fields;
use crate::domain::value_objects::{Locale, Money};

/// Label of an active extra as shown on the order: `name (a, b) (x2)`.
pub fn extra_descriptor(extra: &Extra, selection: &SelectionSession, locale: Locale) -> String {
    let mut descriptor = extra.label(locale).to_string();
    let sub_variants = selection.selected_sub_variants(&extra.name);
    if !sub_variants.is_empty() {
        descriptor.push_str(&format!(" ({})", sub_variants.join(", ")));
    }
    let quantity = selection.extra_quantity(&extra.name);
    if extra.allow_quantity && quantity > 1 {
        descriptor.push_str(&format!(" (x{quantity})"));
    }
    descriptor
}

/// Ribbon, letter and short note, each only when its field is shown and its
/// text is non-empty, joined by ` | `.
pub fn personalization_text(product: &Product, selection: &SelectionSession, locale: Locale) -> String {
    let p = selection.personalization();
    let visible = visible_fields(product, selection);
    let mut segments = Vec::with_capacity(3);
    if visible.ribbon && !p.ribbon_text.trim().is_empty() {
        segments.push(format!("{}: {}", p.ribbon_placement.label(locale), p.ribbon_text.trim()));
    }
    if visible.letter && !p.letter_text.trim().is_empty() {
        segments.push(format!("{}: {}", p.letter_font.label(locale), p.letter_text.trim()));
    }
    if visible.short_note && !p.short_note.trim().is_empty() {
        segments.push(p.short_note.trim().to_string());
    }
    segments.join(" | ")
}

pub fn build_line_item(
    product: &Product,
    selection: &SelectionSession,
    locale: Locale,
    unit_price: Money,
) -> Result<LineItem, serde_json::Error> {
    let mut options = BTreeMap::new();
    let mut db_options = BTreeMap::new();
    for dim in &product.variants {
        if let Some(raw) = selection.selected(&dim.name) {
            options.insert(dim.label(locale).to_string(), dim.value_label(raw, locale).to_string());
            db_options.insert(dim.name.clone(), raw.to_string());
        }
    }

    let mut extras: Vec<String> = product
        .extras
        .iter()
        .filter(|e| selection.is_extra_active(&e.name))
        .map(|e| extra_descriptor(e, selection, locale))
        .collect();
    extras.sort();

    let personalization = personalization_text(product, selection, locale);
    let identity = format!(
        "{}-{}-{}-{}",
        product.id,
        serde_json::to_string(&options)?,
        serde_json::to_string(&extras)?,
        personalization
    );
    let summary = summarize(&options, &extras, &personalization, locale);

    Ok(LineItem {
        identity,
        product_id: product.id.clone(),
        name: product.display_name(locale).to_string(),
        options,
        db_options,
        extras,
        personalization,
        summary,
        unit_price,
        quantity: selection.quantity(),
    })
}

fn summarize(options: &BTreeMap<String, String>, extras: &[String], personalization: &str, locale: Locale) -> String {
    let mut parts = Vec::new();
    if !options.is_empty() {
        parts.push(options.iter().map(|(k, v)| format!("{k}: {v}")).collect::<Vec<_>>().join(", "));
    }
    if !extras.is_empty() {
        let label = match locale { Locale::De => "Extras", Locale::En => "Add-ons" };
        parts.push(format!("{label}: {}", extras.join(", ")));
    }
    if !personalization.is_empty() {
        parts.push(personalization.to_string());
    }
    parts.join("; ")
}

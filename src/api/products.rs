use axum::{extract::{Path, State}, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use validator::Validate;

use super::{ApiError, AppState};
use crate::domain::aggregates::cart::LineItem;
use crate::domain::aggregates::product::{Product, Review};
use crate::domain::aggregates::selection::{LetterFont, RibbonPlacement, SelectionNotice, MAX_LINE_QUANTITY};
use crate::domain::aggregates::settings::StoreSettings;
use crate::domain::services::{Configurator, Eligibility, FieldVisibility, PriceQuote};
use crate::domain::value_objects::{Locale, Stock};
use crate::ConfiguratorError;

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub product: Product,
    pub settings: StoreSettings,
}

pub async fn get_product(State(s): State<AppState>, Path(id): Path<String>) -> Result<Json<ProductResponse>, ApiError> {
    let product = s.catalog.product(&id).await?.ok_or_else(|| ApiError::not_found(format!("product {id} not found")))?;
    let settings = s.catalog.settings().await?;
    Ok(Json(ProductResponse { product, settings }))
}

pub async fn list_reviews(State(s): State<AppState>, Path(id): Path<String>) -> Result<Json<Vec<Review>>, ApiError> {
    Ok(Json(s.catalog.approved_reviews(&id).await?))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ExtraChoice {
    pub name: String,
    #[validate(range(min = 1, max = 50))]
    pub quantity: Option<u32>,
    #[serde(default)]
    pub sub_variants: Vec<String>,
}

/// The shopper's interactions, replayed server-side through the same transitions the UI uses.
#[derive(Debug, Deserialize, Validate)]
pub struct QuoteRequest {
    #[serde(default)]
    pub locale: Locale,
    #[serde(default)]
    pub variants: BTreeMap<String, String>,
    #[serde(default)]
    #[validate]
    pub extras: Vec<ExtraChoice>,
    #[validate(length(max = 200))]
    pub ribbon_text: Option<String>,
    pub ribbon_placement: Option<RibbonPlacement>,
    #[validate(length(max = 2000))]
    pub letter_text: Option<String>,
    pub letter_font: Option<LetterFont>,
    pub short_note: Option<String>,
    #[serde(default)]
    pub consent: bool,
    #[validate(range(min = 1, max = 99))]
    pub quantity: Option<u32>,
}

impl QuoteRequest {
    /// Each extra is toggled once per entry, so a repeated name would switch it off again.
    fn duplicate_extra(&self) -> Option<&str> {
        let mut seen = BTreeSet::new();
        self.extras.iter().map(|e| e.name.as_str()).find(|name| !seen.insert(*name))
    }
}

#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub quote: PriceQuote,
    pub stock: Stock,
    pub visibility: FieldVisibility,
    pub eligibility: Eligibility,
    pub line_item: Option<LineItem>,
}

pub async fn quote(
    State(s): State<AppState>,
    Path(id): Path<String>,
    Json(r): Json<QuoteRequest>,
) -> Result<Json<QuoteResponse>, ApiError> {
    r.validate()?;
    if let Some(name) = r.duplicate_extra() {
        return Err(ApiError::validation(format!("extras: {name} is listed more than once")));
    }
    let mut configurator = Configurator::load(s.catalog.as_ref(), &id, r.locale).await?;
    replay(&mut configurator, &r).map_err(|notice| {
        ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, "selection_rejected", notice.message(r.locale))
    })?;

    let line_item = match configurator.line_item(&s.currency) {
        Ok(line) => Some(line),
        Err(ConfiguratorError::NotReady(_)) => None,
        Err(e) => {
            tracing::error!(product_id = %id, error = %e, "building line item failed");
            return Err(ApiError::internal("quote could not be built"));
        }
    };

    Ok(Json(QuoteResponse {
        quote: configurator.quote(),
        stock: configurator.stock(),
        visibility: configurator.visibility(),
        eligibility: configurator.eligibility(),
        line_item,
    }))
}

fn replay(c: &mut Configurator, r: &QuoteRequest) -> Result<(), SelectionNotice> {
    for (dimension, value) in &r.variants {
        c.select_variant(dimension, value)?;
    }
    for extra in &r.extras {
        c.toggle_extra(&extra.name)?;
        if let Some(quantity) = extra.quantity.filter(|q| *q > 1) {
            c.adjust_extra_quantity(&extra.name, i32::try_from(quantity - 1).unwrap_or(i32::MAX))?;
        }
        for value in &extra.sub_variants {
            c.set_sub_variant(&extra.name, value)?;
        }
    }
    if let Some(text) = &r.ribbon_text { c.set_ribbon_text(text)?; }
    if let Some(placement) = r.ribbon_placement { c.set_ribbon_placement(placement); }
    if let Some(text) = &r.letter_text { c.set_letter_text(text)?; }
    if let Some(font) = r.letter_font { c.set_letter_font(font); }
    if let Some(note) = &r.short_note { c.set_short_note(note)?; }
    c.set_consent(r.consent);
    c.set_quantity(r.quantity.unwrap_or(1).min(MAX_LINE_QUANTITY));
    Ok(())
}

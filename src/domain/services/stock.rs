//! Stock resolution against a product's stock matrix.

use crate::domain::aggregates::product::Product;
use crate::domain::aggregates::selection::SelectionSession;
use crate::domain::aggregates::settings::StockFallback;
use crate::domain::value_objects::Stock;

/// Available quantity for the selected combination.
///
/// The first matrix entry agreeing with every selected dimension wins. When
/// nothing matches, [`StockFallback::Permissive`] reports [`Stock::Unlimited`]
/// as long as anything in the matrix is still in stock.
pub fn resolve_stock(product: &Product, selection: &SelectionSession, fallback: StockFallback) -> Stock {
    if product.variants.is_empty() || product.stock_matrix.is_empty() {
        return product.stock;
    }

    let matched = product
        .stock_matrix
        .iter()
        .find(|entry| selection.variants().iter().all(|(dim, value)| entry.matches(dim, value)));
    if let Some(entry) = matched {
        return entry.quantity();
    }

    match fallback {
        StockFallback::Permissive if product.stock_matrix.iter().any(|e| e.has_stock()) => {
            tracing::debug!(product_id = %product.id, "no stock entry for selection, treating as unlimited");
            Stock::Unlimited
        }
        _ => Stock::Limited(0),
    }
}

/// Stock of a single option, looking only at `dimension` and ignoring the rest.
///
/// Used to disable option buttons before the selection is complete, so an
/// option without any matrix entry is optimistically unlimited.
pub fn option_stock(product: &Product, dimension: &str, value: &str) -> Stock {
    product
        .stock_matrix
        .iter()
        .find(|entry| entry.matches(dimension, value))
        .map_or(Stock::Unlimited, |entry| entry.quantity())
}

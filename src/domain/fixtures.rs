//! Shared catalog records for unit tests.

use rust_decimal::Decimal;

use crate::domain::aggregates::product::{DimensionKind, Extra, PersonalizationField, Product, StockEntry, VariantDimension};
use crate::domain::value_objects::{LocalizedText, Stock};

pub(crate) fn extra(name: &str, cents: i64) -> Extra {
    Extra {
        name: name.into(),
        name_en: None,
        category: None,
        price: Decimal::new(cents, 2),
        allow_quantity: false,
        allow_multiple: false,
        variants: vec![],
        input_type: None,
    }
}

/// A rose bouquet with a size and a colour axis, a stock matrix and seven extras.
pub(crate) fn rose_bouquet() -> Product {
    Product {
        id: "rosen-classic".into(),
        name: LocalizedText::new("Rosenstrauß Classic").with_en("Classic rose bouquet"),
        description: LocalizedText::default(),
        safety_text: None,
        price: Decimal::new(4990, 2),
        sale_price: None,
        on_sale: false,
        images: vec!["rosen-1.jpg".into()],
        videos: vec![],
        variants: vec![
            VariantDimension {
                name: "Größe".into(),
                name_en: Some("Size".into()),
                values: vec!["20 Rosen".into(), "30 Rosen (€69.90)".into(), "200 Rosen (€399.00)".into()],
                values_en: vec!["20 Roses".into(), "30 Roses (€69.90)".into(), "200 Roses (€399.00)".into()],
                kind: Some(DimensionKind::Size),
            },
            VariantDimension {
                name: "Farbe".into(),
                name_en: Some("Colour".into()),
                values: vec!["Rot".into(), "Weiß".into(), "Rosa".into()],
                values_en: vec!["Red".into(), "White".into(), "Pink".into()],
                kind: None,
            },
        ],
        extras: vec![
            extra("Vase", 990),
            extra("Satinband", 490),
            Extra { input_type: Some(PersonalizationField::Letter), name_en: Some("Letter".into()), ..extra("Brief", 350) },
            Extra { allow_quantity: true, name_en: Some("Greeting card".into()), ..extra("Grußkarte", 250) },
            Extra {
                allow_quantity: true,
                allow_multiple: true,
                variants: vec!["Vollmilch".into(), "Zartbitter".into(), "Weiß".into()],
                ..extra("Schokolade", 500)
            },
            Extra { variants: vec!["Gold".into(), "Silber".into()], ..extra("Glitzer", 150) },
            extra("Treuerabatt", -500),
        ],
        stock_matrix: vec![
            StockEntry::new(&[("Größe", "20 Rosen"), ("Farbe", "Rot")], 5),
            StockEntry::new(&[("Größe", "30 Rosen"), ("Farbe", "Weiß")], 2),
            StockEntry::new(&[("Größe", "20 Rosen"), ("Farbe", "Weiß")], 0),
            StockEntry::new(&[("Größe", "30 Rosen"), ("Farbe", "Rot")], -1),
            StockEntry::new(&[("Größe", "200 Rosen"), ("Farbe", "Rot")], 3),
        ],
        stock: Stock::Unlimited,
        needs_ribbon: false,
    }
}

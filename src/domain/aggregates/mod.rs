//! Aggregates module
pub mod cart;
pub mod discount;
pub mod order;
pub mod product;
pub mod selection;
pub mod settings;

pub use cart::{Cart, CartError, LineItem};
pub use discount::{validate_code, DiscountCode, DiscountRejection};
pub use order::{Address, OrderConfirmation, OrderLine, PaymentMismatch, CUSTOMER_EMAIL_KEY};
pub use product::{DimensionKind, Extra, PersonalizationField, Product, Review, StockEntry, VariantDimension};
pub use selection::{LetterFont, Personalization, RibbonPlacement, SelectionNotice, SelectionSession};
pub use settings::{StockFallback, StoreSettings};

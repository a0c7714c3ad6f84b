//! Domain services: pure functions over aggregates, plus the two stateful
//! coordinators (configurator controller and discount gate).
pub mod configurator;
pub mod discount_gate;
pub mod line_identity;
pub mod personalization;
pub mod pricing;
pub mod stock;

pub use configurator::Configurator;
pub use discount_gate::{DiscountGate, GateError};
pub use line_identity::build_line_item;
pub use personalization::{checkout_eligibility, CheckoutBlocker, Eligibility, FieldVisibility};
pub use pricing::{quote, unit_price, PriceQuote, UnitPrice};
pub use stock::{option_stock, resolve_stock};

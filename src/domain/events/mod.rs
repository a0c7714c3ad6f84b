//! Domain events
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum DomainEvent {
    Cart(CartEvent),
    Configurator(ConfiguratorEvent),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum CartEvent {
    LineAdded { cart_id: String, identity: String },
    LineMerged { cart_id: String, identity: String, quantity: u32 },
    LineRemoved { cart_id: String, identity: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum ConfiguratorEvent {
    /// An interaction was rejected and the shopper was shown a notice.
    NoticeRaised { product_id: String, notice: String },
    Undone { product_id: String },
}

//! Domain layer
pub mod aggregates;
pub mod events;
pub mod ports;
pub mod services;
pub mod value_objects;

#[cfg(test)]
pub(crate) mod fixtures;

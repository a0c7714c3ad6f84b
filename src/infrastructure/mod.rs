//! Adapters for the domain ports.
pub mod email;
pub mod memory;
pub mod payments;
pub mod postgres;

pub use email::HttpEmailSender;
pub use memory::InMemoryStore;
pub use payments::HttpPaymentGateway;
pub use postgres::PgStore;

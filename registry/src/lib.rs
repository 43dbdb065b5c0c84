//! # Vendstack Registry
//!
//! The composition root of the vending-machine-commerce backend.
//!
//! [`CentralRegistry`] owns one
//! [`RecordStore`](vendstack_store::RecordStore) per logical table, wires
//! foreign-key declarations between them, validates references at the
//! application layer before any insert, and composes the domain operations
//! (record a purchase, restock a product, log a user in) out of the store,
//! the immutability guard and the event bus.
//!
//! The purchase flow is the event-driven part: after a purchase-transaction
//! row is committed, the registry publishes a `PurchaseProductEvent` on its
//! bus, and the [`StockDecrementStrategy`] subscriber decrements the matching
//! product's stock — a compensating, eventually-applied side effect with no
//! transactional coupling to the purchase row (see the strategy docs for the
//! documented consistency gap).

pub mod central;
pub mod config;
pub mod credential;
pub mod stock;
pub mod tables;
pub mod validate;

pub use central::{CentralRegistry, ProductRef, PurchaseRequest};
pub use config::RegistryConfig;
pub use credential::Sha256Hasher;
pub use stock::StockDecrementStrategy;
pub use validate::{BannedWordsValidator, SqlInjectionValidator, Validator};

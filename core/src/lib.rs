//! # Vendstack Core
//!
//! Core types and traits for the Vendstack vending-machine-commerce backend.
//!
//! This crate provides the pieces shared by every other crate in the
//! workspace:
//!
//! - **Values and records**: the dynamic cell type ([`Value`]) and row shape
//!   ([`Record`]) produced and consumed by the generic record store
//! - **Schemas**: per-table configuration ([`TableSchema`]) — columns,
//!   identifier column, immutable columns, foreign-key declarations
//! - **Errors**: the single error taxonomy ([`CoreError`]) used across the
//!   store and registry layers
//! - **Events**: the in-process [`EventBus`] and the [`Subscriber`]
//!   capability trait used to keep derived data (product stock) consistent
//!   with recorded facts (purchases)
//! - **Environment**: injected dependency traits ([`Clock`],
//!   [`CredentialHasher`]) so time and credential hashing stay explicit and
//!   testable instead of hiding behind process-wide singletons
//!
//! # Architecture Principles
//!
//! - Explicit composition over implicit magic: cross-cutting concerns
//!   (immutability checks, event publication) are ordinary values wired at a
//!   single composition root
//! - Dependency injection via traits, not global state
//! - Typed errors, never swallowed below the boundary that logs them

pub mod environment;
pub mod error;
pub mod event;
pub mod event_bus;
pub mod record;
pub mod schema;
pub mod value;

pub use environment::{Clock, CredentialHasher, SystemClock};
pub use error::{CoreError, Result};
pub use event::{EventData, Subscriber, PURCHASE_PRODUCT_EVENT};
pub use event_bus::EventBus;
pub use record::{FieldValues, Record};
pub use schema::TableSchema;
pub use value::Value;

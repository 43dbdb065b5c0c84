//! # Vendstack Store
//!
//! The generic CRUD engine of the Vendstack backend.
//!
//! A [`RecordStore`] is bound to exactly one table, described by a
//! [`TableSchema`](vendstack_core::TableSchema). It performs schema-aware
//! inserts, updates, searches and deletions against SQLite, plus explicit
//! schema-migration operations that keep the in-memory column list in step
//! with the physical table.
//!
//! Every operation opens a fresh connection, executes, and releases it in the
//! same call stack — the system assumes no pooled connection and no internal
//! concurrency; concurrent access comes only from multiple external callers
//! sharing the same database file.
//!
//! Updates are protected by the [`ImmutabilityGuard`], an explicit wrapper
//! that rejects any attempt to change a configured immutable field before the
//! write statement is issued.
//!
//! # SQL Safety
//!
//! Table and column identifiers come from trusted configuration and are
//! interpolated quoted; every data value is a bound parameter, never
//! interpolated into SQL text.

pub mod guard;
pub mod record_store;
pub mod sql;

pub use guard::ImmutabilityGuard;
pub use record_store::RecordStore;

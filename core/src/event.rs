//! Domain events and the subscriber capability.
//!
//! Events here are in-process notifications, not a durable log: the
//! purchase-transaction path publishes a [`PURCHASE_PRODUCT_EVENT`] after the
//! transaction row is committed, and the stock-decrement subscriber reacts to
//! it. Nothing is persisted or replayed; delivery is scoped to the lifetime
//! of the registry that owns the bus.

use crate::error::Result;
use crate::record::FieldValues;
use std::future::Future;
use std::pin::Pin;

/// Payload carried by a published event: the same field→value mapping shape
/// records use, so subscribers can read it like a row.
pub type EventData = FieldValues;

/// Event type published after a purchase transaction is recorded.
///
/// Payload fields: `name`, `vending_machine_id`, `quantity`, plus the rest of
/// the inserted transaction row.
pub const PURCHASE_PRODUCT_EVENT: &str = "PurchaseProductEvent";

/// Boxed future returned by [`Subscriber::update`].
pub type SubscriberFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

/// Capability interface for event consumers.
///
/// The bus dispatches by interface, never by probing for methods; a
/// subscriber that does not care about a given event type simply returns
/// `Ok(())`.
///
/// # Dyn Compatibility
///
/// `update` returns an explicit `Pin<Box<dyn Future>>` instead of using
/// `async fn` so the bus can hold `Arc<dyn Subscriber>` trait objects.
///
/// # Error Handling
///
/// A returned error is caught and logged by the bus; it never aborts
/// delivery to the remaining subscribers and never propagates to the
/// publisher.
pub trait Subscriber: Send + Sync {
    /// React to a published event.
    fn update<'a>(&'a self, event_type: &'a str, data: &'a EventData) -> SubscriberFuture<'a>;
}

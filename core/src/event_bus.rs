//! In-process publish/subscribe registry.
//!
//! The bus maps an event type to the list of subscribers registered for it.
//! Publishing is synchronous within the publishing call and ordered by
//! subscription order. Fan-out is best-effort: a failure in one subscriber's
//! handler is logged and does not prevent delivery to the remaining
//! subscribers. There is no retry, no queueing and no persistence — this is
//! an observer pattern scoped to the process, not a message broker.

use crate::error::{CoreError, Result};
use crate::event::{EventData, Subscriber};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::sync::Arc;
use tracing::{debug, error};

/// Registry of subscribers keyed by event type.
///
/// One bus instance is shared by the registry and its stores; subscribers are
/// held as `Arc<dyn Subscriber>` — the bus does not own their lifecycle.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use vendstack_core::{EventBus, EventData, Subscriber};
/// use vendstack_core::event::SubscriberFuture;
///
/// struct Noop;
///
/// impl Subscriber for Noop {
///     fn update<'a>(&'a self, _event_type: &'a str, _data: &'a EventData) -> SubscriberFuture<'a> {
///         Box::pin(async { Ok(()) })
///     }
/// }
///
/// let bus = EventBus::new();
/// bus.subscribe("PurchaseProductEvent", Arc::new(Noop));
/// ```
#[derive(Default)]
pub struct EventBus {
    subscribers: Mutex<HashMap<String, Vec<Arc<dyn Subscriber>>>>,
}

impl EventBus {
    /// Create an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn registry(&self) -> MutexGuard<'_, HashMap<String, Vec<Arc<dyn Subscriber>>>> {
        // A poisoned lock only means a panic elsewhere; the map itself is
        // still usable for registration.
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Register `subscriber` for `event_type`.
    ///
    /// Idempotent: subscribing the same `Arc` twice does not duplicate the
    /// entry, so a double subscription never causes a double delivery.
    pub fn subscribe(&self, event_type: &str, subscriber: Arc<dyn Subscriber>) {
        let mut registry = self.registry();
        let entries = registry.entry(event_type.to_string()).or_default();
        if entries
            .iter()
            .any(|existing| std::ptr::addr_eq(Arc::as_ptr(existing), Arc::as_ptr(&subscriber)))
        {
            debug!(event_type, "subscriber already registered");
            return;
        }
        entries.push(subscriber);
    }

    /// Remove `subscriber` from `event_type`. A no-op if it was never
    /// registered.
    pub fn unsubscribe(&self, event_type: &str, subscriber: &Arc<dyn Subscriber>) {
        let mut registry = self.registry();
        if let Some(entries) = registry.get_mut(event_type) {
            entries.retain(|existing| {
                !std::ptr::addr_eq(Arc::as_ptr(existing), Arc::as_ptr(subscriber))
            });
        }
    }

    /// Number of subscribers currently registered for `event_type`.
    #[must_use]
    pub fn subscriber_count(&self, event_type: &str) -> usize {
        self.registry().get(event_type).map_or(0, Vec::len)
    }

    /// Deliver `data` to every subscriber registered for `event_type`, in
    /// subscription order.
    ///
    /// A failing subscriber is logged and skipped; the remaining subscribers
    /// still run. Failed deliveries are not retried and missed events are not
    /// replayed.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::PublishFailed`] only when the bus itself is
    /// unusable (its registry lock has been poisoned by a panicking
    /// subscriber thread), never for subscriber-level failures.
    pub async fn notify(&self, event_type: &str, data: &EventData) -> Result<()> {
        let targets: Vec<Arc<dyn Subscriber>> = {
            let registry = self
                .subscribers
                .lock()
                .map_err(|_| CoreError::PublishFailed("event bus registry poisoned".into()))?;
            registry.get(event_type).cloned().unwrap_or_default()
        };

        debug!(event_type, subscribers = targets.len(), "publishing event");
        for subscriber in &targets {
            if let Err(e) = subscriber.update(event_type, data).await {
                error!(event_type, error = %e, "subscriber failed; continuing fan-out");
            }
        }
        Ok(())
    }
}

//! Purchase → stock-decrement consistency strategy.

use tracing::{debug, warn};
use vendstack_core::event::SubscriberFuture;
use vendstack_core::{EventData, Result, Subscriber, Value, PURCHASE_PRODUCT_EVENT};
use vendstack_store::ImmutabilityGuard;

/// The subscriber side of the purchase flow: reacts to a
/// `PurchaseProductEvent` by decrementing the matching product's quantity.
///
/// # Consistency model
///
/// This is a compensating, eventually-applied side effect. By the time it
/// runs, the purchase-transaction row is already committed, so failures here
/// must not pretend to undo it:
///
/// - no matching product → warn and return, no stock change
/// - requested quantity exceeds available → warn and return, no stock change
///
/// Only infrastructure failures propagate (and the bus logs them). The
/// purchase row and the decrement are two independent writes with no shared
/// transaction: a crash between them leaves the transaction recorded and the
/// stock un-decremented, and concurrent purchases of the same product race
/// at the read-then-write — both are known gaps of the current design, kept
/// visible rather than hidden.
pub struct StockDecrementStrategy {
    products: ImmutabilityGuard,
}

impl StockDecrementStrategy {
    /// Build the strategy over the products store's guarded update path.
    #[must_use]
    pub const fn new(products: ImmutabilityGuard) -> Self {
        Self { products }
    }

    async fn handle(&self, event_type: &str, data: &EventData) -> Result<()> {
        if event_type != PURCHASE_PRODUCT_EVENT {
            debug!(event_type, "ignoring unrelated event");
            return Ok(());
        }

        let (Some(name), Some(machine)) = (
            data.get("name").and_then(Value::as_str),
            data.get("vending_machine_id").and_then(Value::as_str),
        ) else {
            warn!("purchase event missing product name or machine id; stock not adjusted");
            return Ok(());
        };
        let requested = data.get("quantity").and_then(Value::as_i64).unwrap_or(0);

        let mut filter = EventData::new();
        filter.insert("name".to_string(), Value::from(name));
        filter.insert("vending_machine_id".to_string(), Value::from(machine));
        let matches = self.products.store().search(&filter).await?;

        let Some(product) = matches.first() else {
            warn!(
                name,
                machine, "purchase recorded for unknown product; stock not adjusted"
            );
            return Ok(());
        };

        let available = product.get_i64("quantity").unwrap_or(0);
        if requested > available {
            warn!(
                name,
                machine, requested, available, "insufficient stock; stock not adjusted"
            );
            return Ok(());
        }

        let mut change = EventData::new();
        change.insert("quantity".to_string(), Value::from(available - requested));
        self.products.update(&product.id, &change).await?;
        debug!(
            name,
            machine,
            new_quantity = available - requested,
            "stock decremented"
        );
        Ok(())
    }
}

impl Subscriber for StockDecrementStrategy {
    fn update<'a>(&'a self, event_type: &'a str, data: &'a EventData) -> SubscriberFuture<'a> {
        Box::pin(self.handle(event_type, data))
    }
}

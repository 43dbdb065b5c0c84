//! Explicit immutability enforcement around the update path.

use crate::record_store::RecordStore;
use std::sync::Arc;
use vendstack_core::{CoreError, FieldValues, Result};

/// Wraps a [`RecordStore`]'s update operation and rejects any attempt to
/// *change* a configured immutable field.
///
/// The check is an ordinary wrapper type rather than anything patched onto
/// the store, so the call chain is explicit and testable: guard first, write
/// second. The check loads the current record and compares
/// values, so it runs entirely before the write statement — supplying an
/// immutable field with its *current* value passes through (a no-op change),
/// supplying a different value fails.
///
/// # Examples
///
/// ```ignore
/// let guard = ImmutabilityGuard::new(Arc::clone(&products));
/// // fails with CoreError::ImmutableField("id") and leaves the row unchanged
/// guard.update(&id, &fields_changing_id).await?;
/// ```
#[derive(Clone)]
pub struct ImmutabilityGuard {
    store: Arc<RecordStore>,
}

impl ImmutabilityGuard {
    /// Wrap a store's update path.
    #[must_use]
    pub fn new(store: Arc<RecordStore>) -> Self {
        Self { store }
    }

    /// The wrapped store.
    #[must_use]
    pub fn store(&self) -> &Arc<RecordStore> {
        &self.store
    }

    /// Update a record, enforcing field-level immutability first.
    ///
    /// # Errors
    ///
    /// [`CoreError::NotFound`] when the record does not exist;
    /// [`CoreError::ImmutableField`] naming the offending field when an
    /// immutable field would change; otherwise whatever the underlying
    /// update surfaces.
    pub async fn update(&self, id: &str, fields: &FieldValues) -> Result<()> {
        let current = self
            .store
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::NotFound(id.to_string()))?;
        let schema = self.store.schema();

        for (column, new_value) in fields {
            if schema.is_immutable(column) && current.get(column) != Some(new_value) {
                return Err(CoreError::ImmutableField(column.clone()));
            }
        }

        self.store.update_unchecked(id, fields).await
    }
}

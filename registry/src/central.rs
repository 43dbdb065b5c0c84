//! The composition root: per-table stores, foreign-key gating and domain
//! operations.

use crate::config::RegistryConfig;
use crate::stock::StockDecrementStrategy;
use crate::tables;
use sqlx::sqlite::SqliteConnectOptions;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info};
use vendstack_core::{
    Clock, CoreError, CredentialHasher, EventBus, EventData, FieldValues, Record, Result, Value,
    PURCHASE_PRODUCT_EVENT,
};
use vendstack_store::{ImmutabilityGuard, RecordStore};

/// A purchase to record.
#[derive(Clone, Debug)]
pub struct PurchaseRequest {
    /// Buying user (must exist).
    pub user_id: String,
    /// Purchased product (must exist).
    pub product_id: String,
    /// Machine the purchase happened at (must exist).
    pub vending_machine_id: String,
    /// Units bought; must be positive and within available stock.
    pub quantity: i64,
    /// Unit price paid.
    pub price: f64,
}

/// How to resolve a product for a restock.
#[derive(Clone, Debug)]
pub enum ProductRef {
    /// By record identifier.
    Id(String),
    /// By product name within one machine.
    NameInMachine {
        /// Product name.
        name: String,
        /// Machine the product belongs to.
        vending_machine_id: String,
    },
}

/// Owns one [`RecordStore`] per logical table, validates cross-table foreign
/// keys before every insert, and composes the domain operations.
///
/// This is the only component allowed to coordinate across stores, and it
/// never assumes a multi-table transaction: each store's write commits
/// independently. All dependencies (clock, credential hasher) are passed in
/// explicitly — one registry instance per process is a convention, not a
/// hidden global.
pub struct CentralRegistry {
    stores: HashMap<String, Arc<RecordStore>>,
    guards: HashMap<String, ImmutabilityGuard>,
    startup_ddl: Vec<(String, &'static str)>,
    bus: Arc<EventBus>,
    hasher: Arc<dyn CredentialHasher>,
}

impl CentralRegistry {
    /// Wire up stores, guards and the event bus for every table in the
    /// catalog, and subscribe the stock-decrement strategy to purchase
    /// events.
    #[must_use]
    pub fn new(
        config: &RegistryConfig,
        clock: Arc<dyn Clock>,
        hasher: Arc<dyn CredentialHasher>,
    ) -> Self {
        let options = SqliteConnectOptions::new()
            .filename(&config.database_path)
            .create_if_missing(true);

        let mut stores = HashMap::new();
        let mut guards = HashMap::new();
        let mut startup_ddl = Vec::new();
        for definition in tables::definitions() {
            let name = definition.schema.name().to_string();
            let store = Arc::new(RecordStore::new(
                options.clone(),
                definition.schema,
                Arc::clone(&clock),
            ));
            guards.insert(name.clone(), ImmutabilityGuard::new(Arc::clone(&store)));
            stores.insert(name.clone(), store);
            startup_ddl.push((name, definition.ddl));
        }

        let bus = Arc::new(EventBus::new());
        if let Some(products) = guards.get(tables::PRODUCTS) {
            bus.subscribe(
                PURCHASE_PRODUCT_EVENT,
                Arc::new(StockDecrementStrategy::new(products.clone())),
            );
        }

        Self {
            stores,
            guards,
            startup_ddl,
            bus,
            hasher,
        }
    }

    /// Create any table that does not exist yet. Idempotent across restarts.
    ///
    /// # Errors
    ///
    /// Infrastructure failures; an already-existing table is not an error
    /// here.
    pub async fn init(&self) -> Result<()> {
        for (table, ddl) in &self.startup_ddl {
            let store = self.store(table)?;
            match store.create_table(ddl).await {
                Ok(()) => info!(table = %table, "created table"),
                Err(CoreError::AlreadyExists(_)) => {}
                Err(e) => {
                    error!(table = %table, error = %e, "failed to create table");
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    /// The shared event bus.
    #[must_use]
    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    /// The store bound to `table`.
    ///
    /// # Errors
    ///
    /// [`CoreError::Validation`] for a table name outside the catalog.
    pub fn store(&self, table: &str) -> Result<&Arc<RecordStore>> {
        self.stores
            .get(table)
            .ok_or_else(|| CoreError::validation(format!("unknown table '{table}'")))
    }

    fn guard(&self, table: &str) -> Result<&ImmutabilityGuard> {
        self.guards
            .get(table)
            .ok_or_else(|| CoreError::validation(format!("unknown table '{table}'")))
    }

    /// Insert a record after validating every declared foreign key.
    ///
    /// For each foreign-key column declared on the table's schema, the value
    /// must be present in `data` and must match an existing record in the
    /// referenced table — checked here, at the application layer, before any
    /// row is written. Failures are logged and propagated, never swallowed.
    ///
    /// # Errors
    ///
    /// [`CoreError::Validation`] for a missing foreign-key column or a
    /// reference to a nonexistent record; otherwise whatever the insert
    /// surfaces.
    pub async fn insert_record(&self, table: &str, data: &FieldValues) -> Result<String> {
        self.insert_record_inner(table, data)
            .await
            .inspect_err(|e| error!(table, error = %e, "insert rejected"))
    }

    async fn insert_record_inner(&self, table: &str, data: &FieldValues) -> Result<String> {
        let store = self.store(table)?;
        let schema = store.schema();

        for (column, referenced_table) in schema.foreign_keys() {
            let Some(value) = data.get(column) else {
                return Err(CoreError::validation(format!(
                    "missing foreign key column '{column}' for table '{table}'"
                )));
            };
            let referenced = self.store(referenced_table)?;
            let mut filter = FieldValues::new();
            filter.insert(
                referenced.schema().id_column().to_string(),
                value.clone(),
            );
            if referenced.search(&filter).await?.is_empty() {
                return Err(CoreError::validation(format!(
                    "foreign key value '{value}' does not exist in table '{referenced_table}'"
                )));
            }
        }

        store.insert(data).await
    }

    /// Update a record through the table's immutability guard.
    ///
    /// # Errors
    ///
    /// [`CoreError::ImmutableField`] when a protected field would change;
    /// [`CoreError::NotFound`] for an unknown identifier.
    pub async fn update_record(&self, table: &str, id: &str, fields: &FieldValues) -> Result<()> {
        self.guard(table)?
            .update(id, fields)
            .await
            .inspect_err(|e| error!(table, id, error = %e, "update rejected"))
    }

    /// Delete all rows of `table` where `column == value`; returns the count.
    ///
    /// # Errors
    ///
    /// [`CoreError::Validation`] for an unknown table or column.
    pub async fn delete_record(&self, table: &str, column: &str, value: &Value) -> Result<u64> {
        self.store(table)?.delete_where(column, value).await
    }

    /// Fetch one record by identifier.
    ///
    /// # Errors
    ///
    /// [`CoreError::Validation`] for an unknown table; a missing identifier
    /// is `Ok(None)`.
    pub async fn get_record(&self, table: &str, id: &str) -> Result<Option<Record>> {
        self.store(table)?.get_by_id(id).await
    }

    /// Equality search over `table`.
    ///
    /// # Errors
    ///
    /// [`CoreError::Validation`] for an unknown table or an empty filter.
    pub async fn search_records(&self, table: &str, filter: &FieldValues) -> Result<Vec<Record>> {
        self.store(table)?.search(filter).await
    }

    // ───────────────────────────────────────────────────────────────────
    // Domain operations
    // ───────────────────────────────────────────────────────────────────

    /// Register a machine owner. The password is stored as its digest.
    ///
    /// # Errors
    ///
    /// Validation and infrastructure failures from the insert.
    pub async fn add_owner(
        &self,
        username: &str,
        password: &str,
        email: Option<&str>,
    ) -> Result<String> {
        self.insert_account(tables::OWNERS, username, password, email)
            .await
    }

    /// Register a customer. The password is stored as its digest.
    ///
    /// # Errors
    ///
    /// Validation and infrastructure failures from the insert.
    pub async fn add_user(
        &self,
        username: &str,
        password: &str,
        email: Option<&str>,
    ) -> Result<String> {
        self.insert_account(tables::USERS, username, password, email)
            .await
    }

    async fn insert_account(
        &self,
        table: &str,
        username: &str,
        password: &str,
        email: Option<&str>,
    ) -> Result<String> {
        let mut data = FieldValues::new();
        data.insert("username".to_string(), Value::from(username));
        data.insert("password".to_string(), Value::from(self.hasher.hash(password)));
        data.insert("email".to_string(), Value::from(email));
        self.insert_record(table, &data).await
    }

    /// Register a vending machine owned by `owner_id`.
    ///
    /// # Errors
    ///
    /// [`CoreError::Validation`] when the owner does not exist.
    pub async fn add_vending_machine(
        &self,
        name: &str,
        location: &str,
        owner_id: &str,
    ) -> Result<String> {
        let mut data = FieldValues::new();
        data.insert("name".to_string(), Value::from(name));
        data.insert("location".to_string(), Value::from(location));
        data.insert("owner_id".to_string(), Value::from(owner_id));
        self.insert_record(tables::VENDING_MACHINES, &data).await
    }

    /// Stock a product in a machine.
    ///
    /// # Errors
    ///
    /// [`CoreError::Validation`] when the machine does not exist.
    pub async fn add_product(
        &self,
        name: &str,
        price: f64,
        quantity: i64,
        vending_machine_id: &str,
    ) -> Result<String> {
        let mut data = FieldValues::new();
        data.insert("name".to_string(), Value::from(name));
        data.insert("price".to_string(), Value::from(price));
        data.insert("quantity".to_string(), Value::from(quantity));
        data.insert(
            "vending_machine_id".to_string(),
            Value::from(vending_machine_id),
        );
        self.insert_record(tables::PRODUCTS, &data).await
    }

    /// Attach a comment to a machine.
    ///
    /// # Errors
    ///
    /// [`CoreError::Validation`] when the user or machine does not exist.
    pub async fn add_comment(
        &self,
        user_id: &str,
        vending_machine_id: &str,
        content: &str,
    ) -> Result<String> {
        self.insert_feedback(tables::COMMENTS, user_id, vending_machine_id, content)
            .await
    }

    /// File a complaint about a machine.
    ///
    /// # Errors
    ///
    /// [`CoreError::Validation`] when the user or machine does not exist.
    pub async fn add_complaint(
        &self,
        user_id: &str,
        vending_machine_id: &str,
        content: &str,
    ) -> Result<String> {
        self.insert_feedback(tables::COMPLAINTS, user_id, vending_machine_id, content)
            .await
    }

    async fn insert_feedback(
        &self,
        table: &str,
        user_id: &str,
        vending_machine_id: &str,
        content: &str,
    ) -> Result<String> {
        let mut data = FieldValues::new();
        data.insert("user_id".to_string(), Value::from(user_id));
        data.insert(
            "vending_machine_id".to_string(),
            Value::from(vending_machine_id),
        );
        data.insert("content".to_string(), Value::from(content));
        self.insert_record(table, &data).await
    }

    /// Mark a product as one of the user's favorites.
    ///
    /// # Errors
    ///
    /// [`CoreError::Validation`] when the user or product does not exist.
    pub async fn add_favorite(&self, user_id: &str, product_id: &str) -> Result<String> {
        let mut data = FieldValues::new();
        data.insert("user_id".to_string(), Value::from(user_id));
        data.insert("product_id".to_string(), Value::from(product_id));
        self.insert_record(tables::FAVORITES, &data).await
    }

    /// Remove a favorite; returns the number of rows removed (0 when it was
    /// never a favorite).
    ///
    /// # Errors
    ///
    /// Infrastructure failures only.
    pub async fn remove_favorite(&self, user_id: &str, product_id: &str) -> Result<u64> {
        let statement =
            "DELETE FROM \"favorites\" WHERE \"user_id\" = ? AND \"product_id\" = ?";
        self.store(tables::FAVORITES)?
            .execute_raw(
                statement,
                &[Value::from(user_id), Value::from(product_id)],
            )
            .await
    }

    /// Record a purchase and publish the matching `PurchaseProductEvent`.
    ///
    /// The availability check, the transaction insert and the stock
    /// decrement (performed by the subscribed strategy) are **three separate
    /// steps with no shared transaction**. A crash after the insert leaves
    /// the purchase recorded and the stock untouched, and concurrent
    /// purchases of the same product race between check and decrement — both
    /// gaps are accepted and documented rather than hidden. A failure to publish surfaces as
    /// [`CoreError::PublishFailed`]; the already-inserted transaction is not
    /// rolled back.
    ///
    /// # Errors
    ///
    /// [`CoreError::Validation`] for a nonexistent product, a non-positive
    /// quantity or a quantity exceeding available stock;
    /// [`CoreError::PublishFailed`] when the event could not be delivered to
    /// the bus.
    pub async fn add_purchase_transaction(&self, request: &PurchaseRequest) -> Result<String> {
        if request.quantity <= 0 {
            return Err(CoreError::validation("quantity must be positive"));
        }
        let products = self.store(tables::PRODUCTS)?;
        let product = products
            .get_by_id(&request.product_id)
            .await?
            .ok_or_else(|| {
                CoreError::validation(format!(
                    "product '{}' does not exist",
                    request.product_id
                ))
            })?;
        let available = product.get_i64("quantity").unwrap_or(0);
        if request.quantity > available {
            return Err(CoreError::validation(format!(
                "requested quantity {} exceeds available stock {available}",
                request.quantity
            )));
        }

        let mut data = FieldValues::new();
        data.insert("user_id".to_string(), Value::from(request.user_id.as_str()));
        data.insert(
            "product_id".to_string(),
            Value::from(request.product_id.as_str()),
        );
        data.insert(
            "vending_machine_id".to_string(),
            Value::from(request.vending_machine_id.as_str()),
        );
        data.insert(
            "name".to_string(),
            Value::from(product.get_str("name").unwrap_or_default()),
        );
        data.insert("quantity".to_string(), Value::from(request.quantity));
        data.insert("price".to_string(), Value::from(request.price));

        let id = self.insert_record(tables::PURCHASE_TRANSACTIONS, &data).await?;

        let mut payload: EventData = data;
        payload.insert("id".to_string(), Value::from(id.as_str()));
        self.bus
            .notify(PURCHASE_PRODUCT_EVENT, &payload)
            .await
            .map_err(|e| {
                error!(transaction = %id, error = %e, "transaction persisted but event publish failed");
                CoreError::PublishFailed("failed to publish event".to_string())
            })?;

        Ok(id)
    }

    /// Restock a product; returns the new quantity.
    ///
    /// # Errors
    ///
    /// [`CoreError::Validation`] for a non-positive amount or an
    /// unresolvable product.
    pub async fn add_product_quantity(
        &self,
        product: &ProductRef,
        amount: i64,
    ) -> Result<i64> {
        if amount <= 0 {
            return Err(CoreError::validation("quantity to add must be positive"));
        }
        let products = self.store(tables::PRODUCTS)?;
        let record = match product {
            ProductRef::Id(id) => products.get_by_id(id).await?,
            ProductRef::NameInMachine {
                name,
                vending_machine_id,
            } => {
                let mut filter = FieldValues::new();
                filter.insert("name".to_string(), Value::from(name.as_str()));
                filter.insert(
                    "vending_machine_id".to_string(),
                    Value::from(vending_machine_id.as_str()),
                );
                products.search(&filter).await?.into_iter().next()
            }
        };
        let record = record
            .ok_or_else(|| CoreError::validation("product could not be resolved"))?;

        let new_quantity = record.get_i64("quantity").unwrap_or(0) + amount;
        let mut change = FieldValues::new();
        change.insert("quantity".to_string(), Value::from(new_quantity));
        self.guard(tables::PRODUCTS)?.update(&record.id, &change).await?;
        Ok(new_quantity)
    }

    /// Verify credentials against `table` (users or owners).
    ///
    /// Bad credentials are `Ok(None)` — never an error; errors are reserved
    /// for unknown tables and infrastructure failures.
    ///
    /// # Errors
    ///
    /// [`CoreError::Validation`] for an unknown table.
    pub async fn login_user(
        &self,
        table: &str,
        username: &str,
        password: &str,
    ) -> Result<Option<Record>> {
        let store = self.store(table)?;
        let mut filter = FieldValues::new();
        filter.insert("username".to_string(), Value::from(username));
        filter.insert(
            "password".to_string(),
            Value::from(self.hasher.hash(password)),
        );
        let mut matches = store.search(&filter).await?;
        Ok(if matches.is_empty() {
            None
        } else {
            Some(matches.remove(0))
        })
    }

    // ───────────────────────────────────────────────────────────────────
    // Read surface consumed by the (out-of-scope) report/HTTP layer
    // ───────────────────────────────────────────────────────────────────

    /// All products stocked in one machine.
    ///
    /// # Errors
    ///
    /// Infrastructure failures only.
    pub async fn products_in_machine(&self, vending_machine_id: &str) -> Result<Vec<Record>> {
        self.search_one_column(tables::PRODUCTS, "vending_machine_id", vending_machine_id)
            .await
    }

    /// All machines registered by one owner.
    ///
    /// # Errors
    ///
    /// Infrastructure failures only.
    pub async fn machines_for_owner(&self, owner_id: &str) -> Result<Vec<Record>> {
        self.search_one_column(tables::VENDING_MACHINES, "owner_id", owner_id)
            .await
    }

    /// A user's purchase history.
    ///
    /// # Errors
    ///
    /// Infrastructure failures only.
    pub async fn purchase_history_for_user(&self, user_id: &str) -> Result<Vec<Record>> {
        self.search_one_column(tables::PURCHASE_TRANSACTIONS, "user_id", user_id)
            .await
    }

    /// All purchases recorded at one machine.
    ///
    /// # Errors
    ///
    /// Infrastructure failures only.
    pub async fn purchase_history_for_machine(
        &self,
        vending_machine_id: &str,
    ) -> Result<Vec<Record>> {
        self.search_one_column(
            tables::PURCHASE_TRANSACTIONS,
            "vending_machine_id",
            vending_machine_id,
        )
        .await
    }

    /// Comments left on one machine.
    ///
    /// # Errors
    ///
    /// Infrastructure failures only.
    pub async fn comments_for_machine(&self, vending_machine_id: &str) -> Result<Vec<Record>> {
        self.search_one_column(tables::COMMENTS, "vending_machine_id", vending_machine_id)
            .await
    }

    /// Complaints filed about one machine.
    ///
    /// # Errors
    ///
    /// Infrastructure failures only.
    pub async fn complaints_for_machine(&self, vending_machine_id: &str) -> Result<Vec<Record>> {
        self.search_one_column(tables::COMPLAINTS, "vending_machine_id", vending_machine_id)
            .await
    }

    /// A user's favorite products.
    ///
    /// # Errors
    ///
    /// Infrastructure failures only.
    pub async fn favorites_for_user(&self, user_id: &str) -> Result<Vec<Record>> {
        self.search_one_column(tables::FAVORITES, "user_id", user_id)
            .await
    }

    async fn search_one_column(
        &self,
        table: &str,
        column: &str,
        value: &str,
    ) -> Result<Vec<Record>> {
        let mut filter = FieldValues::new();
        filter.insert(column.to_string(), Value::from(value));
        self.store(table)?.search(&filter).await
    }
}

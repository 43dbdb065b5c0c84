//! End-to-end registry tests covering the full purchase flow.

#![allow(clippy::expect_used)]

use std::sync::Arc;
use vendstack_registry::{
    tables, CentralRegistry, ProductRef, PurchaseRequest, RegistryConfig, Sha256Hasher,
};
use vendstack_core::{CoreError, FieldValues, Value, PURCHASE_PRODUCT_EVENT};
use vendstack_testing::{test_clock, TempDatabase};

async fn registry(db: &TempDatabase) -> CentralRegistry {
    let config = RegistryConfig::new(db.path());
    let registry = CentralRegistry::new(&config, Arc::new(test_clock()), Arc::new(Sha256Hasher));
    registry.init().await.expect("init should succeed");
    registry
}

struct Seed {
    owner_id: String,
    user_id: String,
    machine_id: String,
    product_id: String,
}

async fn seed(registry: &CentralRegistry) -> Seed {
    let owner_id = registry
        .add_owner("olga", "owner-pass", Some("olga@example.com"))
        .await
        .expect("owner should be created");
    let user_id = registry
        .add_user("alice", "hunter2", None)
        .await
        .expect("user should be created");
    let machine_id = registry
        .add_vending_machine("Lobby machine", "Building 4 lobby", &owner_id)
        .await
        .expect("machine should be created");
    let product_id = registry
        .add_product("Cola", 1.5, 10, &machine_id)
        .await
        .expect("product should be created");
    Seed {
        owner_id,
        user_id,
        machine_id,
        product_id,
    }
}

#[tokio::test]
async fn init_is_idempotent() {
    let db = TempDatabase::new();
    let registry = registry(&db).await;
    registry.init().await.expect("second init should succeed");
}

#[tokio::test]
async fn foreign_key_violations_are_rejected_before_any_write() {
    let db = TempDatabase::new();
    let registry = registry(&db).await;

    let err = registry
        .add_vending_machine("Orphan machine", "nowhere", "no-such-owner")
        .await
        .expect_err("insert should fail");
    assert!(matches!(err, CoreError::Validation(message) if message.contains("does not exist")));

    let mut data = FieldValues::new();
    data.insert("name".to_string(), Value::from("Orphan machine"));
    data.insert("location".to_string(), Value::from("nowhere"));
    let err = registry
        .insert_record(tables::VENDING_MACHINES, &data)
        .await
        .expect_err("insert should fail");
    assert!(matches!(err, CoreError::Validation(message)
        if message.contains("missing foreign key column 'owner_id'")));
}

#[tokio::test]
async fn purchase_flow_records_the_transaction_and_decrements_stock() {
    let db = TempDatabase::new();
    let registry = registry(&db).await;
    let seed = seed(&registry).await;

    let transaction_id = registry
        .add_purchase_transaction(&PurchaseRequest {
            user_id: seed.user_id.clone(),
            product_id: seed.product_id.clone(),
            vending_machine_id: seed.machine_id.clone(),
            quantity: 3,
            price: 1.5,
        })
        .await
        .expect("purchase should succeed");

    let product = registry
        .get_record(tables::PRODUCTS, &seed.product_id)
        .await
        .expect("fetch should succeed")
        .expect("product should exist");
    assert_eq!(product.get_i64("quantity"), Some(7));

    let history = registry
        .purchase_history_for_user(&seed.user_id)
        .await
        .expect("history should succeed");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, transaction_id);
    assert_eq!(history[0].get_str("name"), Some("Cola"));
    assert_eq!(history[0].get_i64("quantity"), Some(3));

    let by_machine = registry
        .purchase_history_for_machine(&seed.machine_id)
        .await
        .expect("history should succeed");
    assert_eq!(by_machine.len(), 1);
}

#[tokio::test]
async fn purchase_beyond_available_stock_is_rejected() {
    let db = TempDatabase::new();
    let registry = registry(&db).await;
    let seed = seed(&registry).await;

    let err = registry
        .add_purchase_transaction(&PurchaseRequest {
            user_id: seed.user_id.clone(),
            product_id: seed.product_id.clone(),
            vending_machine_id: seed.machine_id.clone(),
            quantity: 99,
            price: 1.5,
        })
        .await
        .expect_err("purchase should fail");
    assert!(matches!(err, CoreError::Validation(message)
        if message.contains("exceeds available stock")));

    // Nothing was written and the stock is untouched.
    let product = registry
        .get_record(tables::PRODUCTS, &seed.product_id)
        .await
        .expect("fetch should succeed")
        .expect("product should exist");
    assert_eq!(product.get_i64("quantity"), Some(10));
    let history = registry
        .purchase_history_for_user(&seed.user_id)
        .await
        .expect("history should succeed");
    assert!(history.is_empty());
}

#[tokio::test]
async fn non_positive_purchase_quantity_is_rejected() {
    let db = TempDatabase::new();
    let registry = registry(&db).await;
    let seed = seed(&registry).await;

    for quantity in [0, -3] {
        let err = registry
            .add_purchase_transaction(&PurchaseRequest {
                user_id: seed.user_id.clone(),
                product_id: seed.product_id.clone(),
                vending_machine_id: seed.machine_id.clone(),
                quantity,
                price: 1.5,
            })
            .await
            .expect_err("purchase should fail");
        assert!(matches!(err, CoreError::Validation(_)));
    }
}

#[tokio::test]
async fn direct_event_with_excess_quantity_leaves_stock_unchanged() {
    let db = TempDatabase::new();
    let registry = registry(&db).await;
    let seed = seed(&registry).await;

    let mut payload = FieldValues::new();
    payload.insert("name".to_string(), Value::from("Cola"));
    payload.insert(
        "vending_machine_id".to_string(),
        Value::from(seed.machine_id.as_str()),
    );
    payload.insert("quantity".to_string(), Value::from(999));
    registry
        .event_bus()
        .notify(PURCHASE_PRODUCT_EVENT, &payload)
        .await
        .expect("notify should succeed");

    let product = registry
        .get_record(tables::PRODUCTS, &seed.product_id)
        .await
        .expect("fetch should succeed")
        .expect("product should exist");
    assert_eq!(product.get_i64("quantity"), Some(10));
}

#[tokio::test]
async fn event_for_an_unknown_product_is_tolerated() {
    let db = TempDatabase::new();
    let registry = registry(&db).await;
    let seed = seed(&registry).await;

    let mut payload = FieldValues::new();
    payload.insert("name".to_string(), Value::from("Ghost drink"));
    payload.insert(
        "vending_machine_id".to_string(),
        Value::from(seed.machine_id.as_str()),
    );
    payload.insert("quantity".to_string(), Value::from(1));
    registry
        .event_bus()
        .notify(PURCHASE_PRODUCT_EVENT, &payload)
        .await
        .expect("notify should succeed");
}

#[tokio::test]
async fn login_verifies_the_stored_digest() {
    let db = TempDatabase::new();
    let registry = registry(&db).await;
    let seed = seed(&registry).await;

    let record = registry
        .login_user(tables::USERS, "alice", "hunter2")
        .await
        .expect("login should succeed")
        .expect("credentials should match");
    assert_eq!(record.id, seed.user_id);

    let rejected = registry
        .login_user(tables::USERS, "alice", "wrong")
        .await
        .expect("login should succeed");
    assert!(rejected.is_none());

    let err = registry
        .login_user("no_such_table", "alice", "hunter2")
        .await
        .expect_err("login should fail");
    assert!(matches!(err, CoreError::Validation(_)));
}

#[tokio::test]
async fn passwords_are_stored_as_digests() {
    let db = TempDatabase::new();
    let registry = registry(&db).await;
    let seed = seed(&registry).await;

    let user = registry
        .get_record(tables::USERS, &seed.user_id)
        .await
        .expect("fetch should succeed")
        .expect("user should exist");
    let stored = user.get_str("password").expect("password should be set");
    assert_ne!(stored, "hunter2");
    assert_eq!(stored.len(), 64);
}

#[tokio::test]
async fn usernames_are_immutable_after_registration() {
    let db = TempDatabase::new();
    let registry = registry(&db).await;
    let seed = seed(&registry).await;

    let mut change = FieldValues::new();
    change.insert("username".to_string(), Value::from("mallory"));
    let err = registry
        .update_record(tables::USERS, &seed.user_id, &change)
        .await
        .expect_err("update should fail");
    assert!(matches!(err, CoreError::ImmutableField(column) if column == "username"));

    let mut change = FieldValues::new();
    change.insert("email".to_string(), Value::from("alice@example.com"));
    registry
        .update_record(tables::USERS, &seed.user_id, &change)
        .await
        .expect("email update should succeed");
}

#[tokio::test]
async fn record_identifiers_cannot_be_reassigned() {
    let db = TempDatabase::new();
    let registry = registry(&db).await;
    let seed = seed(&registry).await;

    let mut change = FieldValues::new();
    change.insert("id".to_string(), Value::from("some-other-id"));
    let err = registry
        .update_record(tables::PRODUCTS, &seed.product_id, &change)
        .await
        .expect_err("update should fail");
    assert!(matches!(err, CoreError::ImmutableField(column) if column == "id"));

    let product = registry
        .get_record(tables::PRODUCTS, &seed.product_id)
        .await
        .expect("fetch should succeed")
        .expect("product should still exist under its identifier");
    assert_eq!(product.id, seed.product_id);
    assert_eq!(product.get_i64("quantity"), Some(10));
}

#[tokio::test]
async fn favorites_can_be_added_and_removed() {
    let db = TempDatabase::new();
    let registry = registry(&db).await;
    let seed = seed(&registry).await;

    registry
        .add_favorite(&seed.user_id, &seed.product_id)
        .await
        .expect("favorite should be created");
    let favorites = registry
        .favorites_for_user(&seed.user_id)
        .await
        .expect("favorites should succeed");
    assert_eq!(favorites.len(), 1);
    assert_eq!(
        favorites[0].get_str("product_id"),
        Some(seed.product_id.as_str())
    );

    let removed = registry
        .remove_favorite(&seed.user_id, &seed.product_id)
        .await
        .expect("remove should succeed");
    assert_eq!(removed, 1);
    let removed = registry
        .remove_favorite(&seed.user_id, &seed.product_id)
        .await
        .expect("second remove should succeed");
    assert_eq!(removed, 0);
}

#[tokio::test]
async fn restock_raises_the_quantity() {
    let db = TempDatabase::new();
    let registry = registry(&db).await;
    let seed = seed(&registry).await;

    let new_quantity = registry
        .add_product_quantity(&ProductRef::Id(seed.product_id.clone()), 5)
        .await
        .expect("restock should succeed");
    assert_eq!(new_quantity, 15);

    let new_quantity = registry
        .add_product_quantity(
            &ProductRef::NameInMachine {
                name: "Cola".to_string(),
                vending_machine_id: seed.machine_id.clone(),
            },
            2,
        )
        .await
        .expect("restock should succeed");
    assert_eq!(new_quantity, 17);

    let err = registry
        .add_product_quantity(&ProductRef::Id(seed.product_id.clone()), 0)
        .await
        .expect_err("restock should fail");
    assert!(matches!(err, CoreError::Validation(_)));

    let err = registry
        .add_product_quantity(&ProductRef::Id("no-such-product".to_string()), 5)
        .await
        .expect_err("restock should fail");
    assert!(matches!(err, CoreError::Validation(_)));
}

#[tokio::test]
async fn feedback_and_listings_read_back() {
    let db = TempDatabase::new();
    let registry = registry(&db).await;
    let seed = seed(&registry).await;

    registry
        .add_comment(&seed.user_id, &seed.machine_id, "Great selection")
        .await
        .expect("comment should be created");
    registry
        .add_complaint(&seed.user_id, &seed.machine_id, "Ate my coins")
        .await
        .expect("complaint should be created");

    let comments = registry
        .comments_for_machine(&seed.machine_id)
        .await
        .expect("comments should succeed");
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].get_str("content"), Some("Great selection"));

    let complaints = registry
        .complaints_for_machine(&seed.machine_id)
        .await
        .expect("complaints should succeed");
    assert_eq!(complaints.len(), 1);

    let machines = registry
        .machines_for_owner(&seed.owner_id)
        .await
        .expect("machines should succeed");
    assert_eq!(machines.len(), 1);
    assert_eq!(machines[0].id, seed.machine_id);

    let products = registry
        .products_in_machine(&seed.machine_id)
        .await
        .expect("products should succeed");
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].get_str("name"), Some("Cola"));
}

#[tokio::test]
async fn unknown_tables_are_rejected_everywhere() {
    let db = TempDatabase::new();
    let registry = registry(&db).await;

    let err = registry
        .insert_record("no_such_table", &FieldValues::new())
        .await
        .expect_err("insert should fail");
    assert!(matches!(err, CoreError::Validation(message)
        if message.contains("unknown table")));

    let err = registry
        .get_record("no_such_table", "some-id")
        .await
        .expect_err("fetch should fail");
    assert!(matches!(err, CoreError::Validation(_)));
}

//! Integration tests for cart persistence across restarts.
//!
//! Each test drives a store, waits for its writes, drops it, and launches a
//! fresh store over the same storage to check what survived.

use std::sync::Arc;

use gomarket_cart::{DEFAULT_STORAGE_KEY, KeyValueStorage, MemoryStorage};
use gomarket_core::{CartProduct, CartState, Price, ProductId};
use gomarket_integration_tests::{launch, launch_over_file, product};

fn id(s: &str) -> ProductId {
    ProductId::parse(s).expect("valid id")
}

// =============================================================================
// File Storage
// =============================================================================

#[tokio::test]
async fn test_walkthrough_survives_each_restart() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("storage.json");
    let p1 = id("p1");

    let store = launch_over_file(&path).await;
    store.add_to_cart(product("p1", "Apple", 150).expect("product"));
    store.flush().await.expect("flush");
    let expected = store.products();
    drop(store);

    let store = launch_over_file(&path).await;
    assert_eq!(store.products(), expected);
    store.increment(&p1).expect("increment");
    store.flush().await.expect("flush");
    drop(store);

    let store = launch_over_file(&path).await;
    assert_eq!(store.products().get(&p1).map(|i| i.quantity.get()), Some(2));
    store.decrement(&p1).expect("decrement");
    store.flush().await.expect("flush");
    drop(store);

    let store = launch_over_file(&path).await;
    assert_eq!(store.products().get(&p1).map(|i| i.quantity.get()), Some(1));
    store.decrement(&p1).expect("decrement");
    store.flush().await.expect("flush");
    drop(store);

    let store = launch_over_file(&path).await;
    assert!(store.products().is_empty());
}

#[tokio::test]
async fn test_file_layout_uses_namespaced_key() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("storage.json");

    let store = launch_over_file(&path).await;
    store.add_to_cart(product("p1", "Apple", 150).expect("product"));
    store.flush().await.expect("flush");

    let content = std::fs::read_to_string(&path).expect("storage file");
    let entries: serde_json::Value = serde_json::from_str(&content).expect("json object");
    let blob = entries[DEFAULT_STORAGE_KEY].as_str().expect("cart blob");
    let records: serde_json::Value = serde_json::from_str(blob).expect("json array");

    assert_eq!(records[0]["id"], "p1");
    assert_eq!(records[0]["image_url"], "https://cdn.example.com/p1.png");
    assert_eq!(records[0]["quantity"], 1);
}

#[tokio::test]
async fn test_corrupt_file_launches_empty_and_is_replaced_on_write() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("storage.json");
    std::fs::write(&path, "{ truncated").expect("write");

    let store = launch_over_file(&path).await;
    assert!(store.products().is_empty());

    store.add_to_cart(product("p1", "Apple", 150).expect("product"));
    store.flush().await.expect("flush");
    let committed = store.products();
    drop(store);

    let reloaded = launch_over_file(&path).await;
    assert_eq!(reloaded.products(), committed);
    assert_eq!(reloaded.products().len(), 1);
}

#[tokio::test]
async fn test_float_price_survives_reload() {
    let storage = MemoryStorage::new();
    let store = launch(Arc::new(storage.clone())).await;

    let price = Price::from_f64(19.99).expect("price");
    store.add_to_cart(CartProduct::new(id("p1"), "Cheese", "c.png", price));
    store.flush().await.expect("flush");
    let committed = store.products();
    drop(store);

    let reloaded = launch(Arc::new(storage)).await;
    assert_eq!(reloaded.products(), committed);
    assert_eq!(reloaded.products().get(&id("p1")).map(|i| i.price), Some(price));
}

// =============================================================================
// Memory Storage
// =============================================================================

#[tokio::test]
async fn test_reload_equals_last_committed_state() {
    let storage = MemoryStorage::new();
    let store = launch(Arc::new(storage.clone())).await;

    store.add_to_cart(product("p1", "Apple", 150).expect("product"));
    store.add_to_cart(product("p2", "Pear", 225).expect("product"));
    store.add_to_cart(product("p1", "Apple", 150).expect("product"));
    store.decrement(&id("p2")).expect("decrement");
    store.flush().await.expect("flush");
    let committed = store.products();
    drop(store);

    let reloaded = launch(Arc::new(storage)).await;
    assert_eq!(reloaded.products(), committed);
}

#[tokio::test]
async fn test_stale_blob_from_other_client_is_accepted() {
    let blob = r#"[{"id":"p9","title":"Grapes","imageUrl":"g.png","price":3,"quantity":4}]"#;
    let storage = MemoryStorage::with_item(DEFAULT_STORAGE_KEY, blob);

    let store = launch(Arc::new(storage.clone())).await;
    assert_eq!(store.products().total_quantity(), 4);

    store.increment(&id("p9")).expect("increment");
    store.flush().await.expect("flush");

    let rewritten = storage
        .get_item(DEFAULT_STORAGE_KEY)
        .await
        .expect("read")
        .expect("blob");
    let state = CartState::from_json(&rewritten).expect("valid snapshot");
    assert_eq!(state.get(&id("p9")).map(|i| i.image_url.as_str()), Some("g.png"));
    assert!(rewritten.contains("\"image_url\""));
}

#[tokio::test]
async fn test_failed_mutation_leaves_storage_untouched() {
    let storage = MemoryStorage::new();
    let store = launch(Arc::new(storage.clone())).await;

    store.add_to_cart(product("p1", "Apple", 150).expect("product"));
    store.flush().await.expect("flush");
    let before = storage.get_item(DEFAULT_STORAGE_KEY).await.expect("read");

    assert!(store.increment(&id("missing")).is_err());
    assert!(store.decrement(&id("missing")).is_err());
    store.flush().await.expect("flush");

    let after = storage.get_item(DEFAULT_STORAGE_KEY).await.expect("read");
    assert_eq!(before, after);
}

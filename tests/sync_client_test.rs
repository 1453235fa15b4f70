mod common;

use std::time::Duration;

use axum::http::Method;
use backoffice_api::sync::{CacheStore, ItemCache, SyncClient, SyncError};
use common::TestApp;
use serde_json::json;

async fn serve(app: &TestApp) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = app.router();
    tokio::spawn(async move {
        axum::serve(listener, router.into_make_service())
            .await
            .unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn client_cache_follows_server_changes() {
    let app = TestApp::new().await;
    let base_url = serve(&app).await;
    let client = SyncClient::new(&base_url, app.employee_token.clone()).unwrap();

    let first = app.create_item("Tarp").await;
    let second = app.create_item("Strap").await;
    tokio::time::sleep(Duration::from_millis(5)).await;

    let mut cache = ItemCache::new();
    let outcome = client.sync_once(&mut cache).await.unwrap();
    assert!(outcome.full_refresh);
    assert_eq!(outcome.added, 2);
    assert_eq!(cache.len(), 2);
    assert!(cache.last_synced() > 0);
    tokio::time::sleep(Duration::from_millis(5)).await;

    app.as_employee(
        Method::PUT,
        &format!("/api/items/{first}"),
        Some(json!({ "itemName": "Heavy tarp" })),
    )
    .await;
    app.as_employee(Method::DELETE, &format!("/api/items/{second}"), None)
        .await;
    tokio::time::sleep(Duration::from_millis(5)).await;

    let outcome = client.sync_once(&mut cache).await.unwrap();
    assert!(!outcome.full_refresh);
    assert_eq!(outcome.updated, 1);
    assert_eq!(outcome.removed, 1);
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.get(&first).unwrap().item_name, "Heavy tarp");
    assert!(cache.get(&second).is_none());

    let dir = tempfile::tempdir().unwrap();
    let store = CacheStore::new(dir.path().join("items.json"));
    store.save(&cache).await.unwrap();
    assert_eq!(store.load().await, cache);
}

#[tokio::test]
async fn bad_token_is_reported_as_unauthorized() {
    let app = TestApp::new().await;
    let base_url = serve(&app).await;
    let client = SyncClient::new(&base_url, "garbage").unwrap();

    let mut cache = ItemCache::new();
    let err = client.sync_once(&mut cache).await.unwrap_err();
    assert!(matches!(err, SyncError::Unauthorized));
    assert_eq!(cache.last_synced(), 0);
}

mod common;

use std::time::Duration;

use axum::http::{Method, StatusCode};
use backoffice_api::{db, entities::item};
use chrono::DateTime;
use common::{uuid_field, TestApp};
use sea_orm::{sea_query::Expr, ColumnTrait, EntityTrait, QueryFilter};
use serde_json::{json, Value};

async fn pause() {
    tokio::time::sleep(Duration::from_millis(5)).await;
}

#[tokio::test]
async fn item_routes_require_a_token() {
    let app = TestApp::new().await;

    let (status, _) = app.request(Method::GET, "/api/items", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .request(Method::GET, "/api/items/updated", None, Some("not-a-jwt"))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn create_get_list_and_trash_an_item() {
    let app = TestApp::new().await;

    let first = app.create_item("Blue carton").await;
    let second = app.create_item("Red sack").await;

    let (status, body) = app
        .as_employee(Method::GET, &format!("/api/items/{first}"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["itemName"], "Blue carton");
    assert_eq!(body["itemNumber"], 1);

    let (status, body) = app
        .as_customer(Method::GET, "/api/items?page=1&limit=1&sortBy=itemName&sortOrder=desc", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    assert_eq!(body["totalPages"], 2);
    assert_eq!(body["hasNextPage"], true);
    assert_eq!(body["items"][0]["itemName"], "Red sack");

    let (status, body) = app
        .as_employee(Method::DELETE, &format!("/api/items/{second}"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true, "message": "Item moved to trash" }));

    let (status, _) = app
        .as_employee(Method::GET, &format!("/api/items/{second}"), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .as_employee(Method::DELETE, &format!("/api/items/{second}"), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = app.as_employee(Method::GET, "/api/items/all", None).await;
    let names: Vec<_> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["itemName"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["Blue carton"]);
}

#[tokio::test]
async fn invalid_item_is_rejected_with_prefixed_message() {
    let app = TestApp::new().await;

    let (status, body) = app
        .as_employee(Method::POST, "/api/items", Some(json!({ "itemName": "" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("Failed to create item"));
}

#[tokio::test]
async fn malformed_item_bodies_are_400_with_prefixed_message() {
    let app = TestApp::new().await;

    for body in [
        json!({}),
        json!({ "itemName": "x", "itemType": "CRATE" }),
        json!({ "itemName": 42 }),
    ] {
        let (status, response) = app
            .as_employee(Method::POST, "/api/items", Some(body))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(response["success"], false);
        assert!(response["message"]
            .as_str()
            .unwrap()
            .starts_with("Failed to create item"));
    }

    let id = app.create_item("Fine").await;
    let (status, response) = app
        .as_employee(
            Method::PUT,
            &format!("/api/items/{id}"),
            Some(json!({ "itemType": "CRATE" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["error"], "Bad Request");
}

#[tokio::test]
async fn search_is_case_insensitive_and_type_filter_applies() {
    let app = TestApp::new().await;

    app.create_item("Blue carton").await;
    app.create_item("Green carton").await;
    let (status, _) = app
        .as_employee(
            Method::POST,
            "/api/items",
            Some(json!({
                "itemName": "Grain bag",
                "itemType": "SACK",
                "itemBrand": "ACME",
                "itemModel": "Heavy-40",
                "itemBarcode": "BC-9001",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let total = |body: &Value| body["total"].as_u64().unwrap();

    let (_, body) = app.as_customer(Method::GET, "/api/items?search=CARTON", None).await;
    assert_eq!(total(&body), 2);

    for term in ["acme", "heavy", "bc-9001", "GRAIN"] {
        let (_, body) = app
            .as_customer(Method::GET, &format!("/api/items?search={term}"), None)
            .await;
        assert_eq!(total(&body), 1, "search for {term}");
        assert_eq!(body["items"][0]["itemName"], "Grain bag");
    }

    let (_, body) = app.as_customer(Method::GET, "/api/items?itemType=CARTON", None).await;
    assert_eq!(total(&body), 2);

    let (_, body) = app
        .as_customer(Method::GET, "/api/items?itemType=SACK&search=carton", None)
        .await;
    assert_eq!(total(&body), 0);
}

#[tokio::test]
async fn server_time_trails_writes_so_same_millisecond_changes_come_back() {
    let app = TestApp::new().await;
    let straggler = app.create_item("Straggler").await;

    let (_, full) = app.as_employee(Method::GET, "/api/items/updated", None).await;
    let server_time = full["serverTime"].as_i64().unwrap();

    let after = app.create_item("Right after").await;
    let (_, record) = app
        .as_employee(Method::GET, &format!("/api/items/{after}"), None)
        .await;
    let created_at = DateTime::parse_from_rfc3339(record["createdAt"].as_str().unwrap())
        .unwrap()
        .timestamp_millis();
    assert!(created_at > server_time);

    // A write stamped in the millisecond the server read its clock.
    let stamp = db::from_millis(server_time + 1);
    item::Entity::update_many()
        .col_expr(item::Column::CreatedAt, Expr::value(stamp))
        .col_expr(item::Column::UpdatedAt, Expr::value(stamp))
        .filter(item::Column::ItemId.eq(straggler))
        .exec(&*app.state.db)
        .await
        .unwrap();

    let (_, delta) = app
        .as_employee(
            Method::GET,
            &format!("/api/items/updated?since={server_time}"),
            None,
        )
        .await;
    assert_eq!(delta["isFullRefresh"], false);
    let new_ids: Vec<_> = delta["newItems"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| uuid_field(i, "itemId"))
        .collect();
    assert!(new_ids.contains(&straggler));
    assert!(new_ids.contains(&after));
}

#[tokio::test]
async fn delta_sync_reports_new_updated_and_deleted_items() {
    let app = TestApp::new().await;

    let kept = app.create_item("Pallet jack").await;
    let doomed = app.create_item("Old crate").await;
    pause().await;

    let (status, full) = app
        .as_employee(Method::GET, "/api/items/updated", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(full["isFullRefresh"], true);
    assert_eq!(full["newItems"].as_array().unwrap().len(), 2);
    let cursor = full["serverTime"].as_i64().unwrap();
    pause().await;

    let (status, _) = app
        .as_employee(
            Method::PUT,
            &format!("/api/items/{kept}"),
            Some(json!({ "notes": "serviced" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    app.as_employee(Method::DELETE, &format!("/api/items/{doomed}"), None)
        .await;
    let fresh = app.create_item("New bin").await;
    pause().await;

    let (status, delta) = app
        .as_employee(Method::GET, &format!("/api/items/updated?since={cursor}"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(delta["isFullRefresh"], false);
    assert_eq!(uuid_field(&delta["newItems"][0], "itemId"), fresh);
    assert_eq!(delta["newItems"].as_array().unwrap().len(), 1);
    assert_eq!(uuid_field(&delta["updatedItems"][0], "itemId"), kept);
    assert_eq!(delta["updatedItems"].as_array().unwrap().len(), 1);
    assert_eq!(delta["deletedIds"], json!([doomed.to_string()]));
    assert!(delta["serverTime"].as_i64().unwrap() > cursor);
}

#[tokio::test]
async fn unparsable_cursor_means_full_refresh() {
    let app = TestApp::new().await;
    app.create_item("Anything").await;

    let (status, body) = app
        .as_employee(Method::GET, "/api/items/updated?since=yesterday", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isFullRefresh"], true);
    assert_eq!(body["newItems"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn item_owner_must_exist() {
    let app = TestApp::new().await;

    let (status, _) = app
        .as_employee(
            Method::POST,
            "/api/items",
            Some(json!({
                "itemName": "Orphan",
                "ownerId": uuid::Uuid::new_v4(),
                "ownerType": "COMPANY",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, company) = app
        .as_employee(
            Method::POST,
            "/api/companies",
            Some(json!({ "companyName": "Acme Storage" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let company_id = uuid_field(&company, "companyId");

    let (status, item) = app
        .as_employee(
            Method::POST,
            "/api/items",
            Some(json!({
                "itemName": "Owned",
                "ownerId": company_id,
                "ownerType": "COMPANY",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(item["ownerType"], "COMPANY");

    let (status, owners) = app.as_employee(Method::GET, "/api/item-owners", None).await;
    assert_eq!(status, StatusCode::OK);
    let kinds: Vec<_> = owners
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["ownerType"].as_str().unwrap().to_string())
        .collect();
    assert!(kinds.contains(&"COMPANY".to_string()));
    assert!(kinds.contains(&"CUSTOMER".to_string()));
}

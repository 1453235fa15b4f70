mod common;

use axum::http::{Method, StatusCode};
use common::{uuid_field, TestApp};
use serde_json::{json, Value};
use uuid::Uuid;

fn order_body(customer_id: Uuid, lines: &[(Uuid, i32)]) -> Value {
    json!({
        "customerId": customer_id,
        "orderType": "CUSTOMER_ORDER",
        "movement": "OUT",
        "packingType": "PALLET",
        "deliveryMethod": "DELIVERY",
        "items": lines
            .iter()
            .map(|(item_id, quantity)| json!({ "itemId": item_id, "quantity": quantity }))
            .collect::<Vec<_>>(),
    })
}

async fn set_status(app: &TestApp, order_id: Uuid, status: &str) -> (StatusCode, Value) {
    app.as_employee(
        Method::PUT,
        &format!("/api/orders/{order_id}/status"),
        Some(json!({ "status": status })),
    )
    .await
}

#[tokio::test]
async fn stock_movements_track_previous_and_new_stock() {
    let app = TestApp::new().await;
    let item_id = app.create_item("Forklift battery").await;

    let tx = app.stock_in(item_id, 10).await;
    assert_eq!(tx["prevStock"], 0);
    assert_eq!(tx["newStock"], 10);

    let (status, tx) = app
        .as_employee(
            Method::POST,
            "/api/inventory/movements",
            Some(json!({ "itemId": item_id, "movement": "OUT", "amount": 4 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(tx["prevStock"], 10);
    assert_eq!(tx["newStock"], 6);

    let (status, body) = app
        .as_employee(
            Method::POST,
            "/api/inventory/movements",
            Some(json!({ "itemId": item_id, "movement": "OUT", "amount": 7 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Insufficient stock");

    let (status, rows) = app
        .as_customer(Method::GET, &format!("/api/inventory?itemId={item_id}"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rows.as_array().unwrap().len(), 1);
    assert_eq!(rows[0]["quantity"], 6);
    assert_eq!(rows[0]["locationCode"], "MAIN");

    let inventory_id = uuid_field(&rows[0], "inventoryId");
    let (status, history) = app
        .as_customer(
            Method::GET,
            &format!("/api/inventory/{inventory_id}/transactions"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn stock_that_would_overflow_is_rejected_as_too_large() {
    let app = TestApp::new().await;
    let item_id = app.create_item("Bulk washers").await;
    app.stock_in(item_id, i32::MAX).await;

    let (status, body) = app
        .as_employee(
            Method::POST,
            "/api/inventory/movements",
            Some(json!({ "itemId": item_id, "movement": "IN", "amount": 1 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Quantity too large");

    let (_, rows) = app
        .as_employee(Method::GET, &format!("/api/inventory?itemId={item_id}"), None)
        .await;
    assert_eq!(rows[0]["quantity"], i32::MAX);
}

#[tokio::test]
async fn movements_are_employee_only_and_need_a_live_item() {
    let app = TestApp::new().await;
    let item_id = app.create_item("Shrink wrap").await;

    let (status, _) = app
        .as_customer(
            Method::POST,
            "/api/inventory/movements",
            Some(json!({ "itemId": item_id, "movement": "IN", "amount": 1 })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .as_employee(
            Method::POST,
            "/api/inventory/movements",
            Some(json!({ "itemId": Uuid::new_v4(), "movement": "IN", "amount": 1 })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .as_employee(
            Method::POST,
            "/api/inventory/movements",
            Some(json!({ "itemId": item_id, "movement": "IN", "amount": 0 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn completing_an_order_moves_stock_for_each_line() {
    let app = TestApp::new().await;
    let customer_id = app.create_customer("Rania").await;
    let pallet = app.create_item("Pallet").await;
    let carton = app.create_item("Carton").await;
    app.stock_in(pallet, 5).await;
    app.stock_in(carton, 20).await;

    let (status, order) = app
        .as_employee(
            Method::POST,
            "/api/orders",
            Some(order_body(customer_id, &[(pallet, 2), (carton, 15)])),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["status"], "PENDING");
    assert_eq!(order["orderNumber"], 1);
    assert_eq!(order["items"].as_array().unwrap().len(), 2);
    let order_id = uuid_field(&order, "orderId");

    let (status, body) = set_status(&app, order_id, "COMPLETED").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "Cannot change order status from PENDING to COMPLETED"
    );

    assert_eq!(set_status(&app, order_id, "PROCESSING").await.0, StatusCode::OK);
    assert_eq!(set_status(&app, order_id, "READY").await.0, StatusCode::OK);
    let (status, done) = set_status(&app, order_id, "COMPLETED").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(done["status"], "COMPLETED");
    assert!(done["fulfilledAt"].is_string());

    let (_, rows) = app
        .as_employee(Method::GET, &format!("/api/inventory?itemId={carton}"), None)
        .await;
    assert_eq!(rows[0]["quantity"], 5);

    let inventory_id = uuid_field(&rows[0], "inventoryId");
    let (_, history) = app
        .as_employee(
            Method::GET,
            &format!("/api/inventory/{inventory_id}/transactions"),
            None,
        )
        .await;
    let linked: Vec<_> = history
        .as_array()
        .unwrap()
        .iter()
        .filter(|tx| tx["orderId"] == json!(order_id.to_string()))
        .collect();
    assert_eq!(linked.len(), 1);
    assert_eq!(linked[0]["notes"], "Order #1");
}

#[tokio::test]
async fn shortfall_on_completion_rolls_back_every_line() {
    let app = TestApp::new().await;
    let customer_id = app.create_customer("Karim").await;
    let plenty = app.create_item("Plenty").await;
    let scarce = app.create_item("Scarce").await;
    app.stock_in(plenty, 50).await;
    app.stock_in(scarce, 1).await;

    let (_, order) = app
        .as_employee(
            Method::POST,
            "/api/orders",
            Some(order_body(customer_id, &[(plenty, 10), (scarce, 3)])),
        )
        .await;
    let order_id = uuid_field(&order, "orderId");
    set_status(&app, order_id, "PROCESSING").await;
    set_status(&app, order_id, "READY").await;

    let (status, body) = set_status(&app, order_id, "COMPLETED").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Insufficient stock");

    let (_, rows) = app
        .as_employee(Method::GET, &format!("/api/inventory?itemId={plenty}"), None)
        .await;
    assert_eq!(rows[0]["quantity"], 50);

    let (_, fetched) = app
        .as_customer(Method::GET, &format!("/api/orders/{order_id}"), None)
        .await;
    assert_eq!(fetched["status"], "READY");
}

#[tokio::test]
async fn orders_reject_unknown_customers_and_deleted_items() {
    let app = TestApp::new().await;
    let customer_id = app.create_customer("Sara").await;
    let item_id = app.create_item("Gone soon").await;

    let (status, body) = app
        .as_employee(
            Method::POST,
            "/api/orders",
            Some(order_body(Uuid::new_v4(), &[(item_id, 1)])),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Customer not found");

    app.as_employee(Method::DELETE, &format!("/api/items/{item_id}"), None)
        .await;
    let (status, body) = app
        .as_employee(
            Method::POST,
            "/api/orders",
            Some(order_body(customer_id, &[(item_id, 1)])),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "One or more items do not exist or were deleted"
    );

    let (status, _) = app
        .as_employee(Method::POST, "/api/orders", Some(order_body(customer_id, &[])))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn orders_are_listed_newest_first_with_filters() {
    let app = TestApp::new().await;
    let customer_id = app.create_customer("Huda").await;
    let item_id = app.create_item("Sack").await;

    let mut ids = Vec::new();
    for _ in 0..3 {
        let (_, order) = app
            .as_employee(
                Method::POST,
                "/api/orders",
                Some(order_body(customer_id, &[(item_id, 1)])),
            )
            .await;
        ids.push(uuid_field(&order, "orderId"));
    }
    set_status(&app, ids[0], "CANCELLED").await;

    let (status, page) = app.as_customer(Method::GET, "/api/orders", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 3);
    let numbers: Vec<_> = page["orders"]
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["orderNumber"].as_i64().unwrap())
        .collect();
    assert_eq!(numbers, vec![3, 2, 1]);

    let (_, page) = app
        .as_customer(Method::GET, "/api/orders?status=CANCELLED", None)
        .await;
    assert_eq!(page["total"], 1);
    assert_eq!(uuid_field(&page["orders"][0], "orderId"), ids[0]);

    let (status, _) = app
        .as_customer(
            Method::POST,
            "/api/orders",
            Some(order_body(customer_id, &[(item_id, 1)])),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
